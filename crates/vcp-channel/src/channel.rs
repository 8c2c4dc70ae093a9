use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vcp_crypto::PublicKey;
use vcp_types::{Amount, ChannelId, ChannelStatus, MinerId, Party, PaymentId, PaymentStatus};

use crate::error::ChannelError;

/// A bilateral account between the pool operator and one miner.
///
/// `current_balance` starts at `initial_funding` and only ever decreases.
/// The payment history is append-only and its order is causal order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub operator_key: PublicKey,
    pub counterparty_key: PublicKey,
    pub initial_funding: Amount,
    pub current_balance: Amount,
    pub status: ChannelStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub payment_history: Vec<PaymentUpdate>,
    pub miner_id: Option<MinerId>,
    pub miner_address: Option<String>,
}

/// One balance-decreasing event inside a channel. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub id: PaymentId,
    pub channel_id: ChannelId,
    pub amount: Amount,
    pub from: Party,
    pub to: Party,
    pub timestamp: DateTime<Utc>,
    pub status: PaymentStatus,
    /// One-indexed position in the channel history.
    pub seq: u64,
}

/// Flat per-channel statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub miner_id: Option<MinerId>,
    pub initial_funding: Amount,
    pub current_balance: Amount,
    pub status: ChannelStatus,
    pub payment_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Channel {
    /// A fresh `Active` channel with an empty history.
    pub fn new(operator_key: PublicKey, counterparty_key: PublicKey, initial_funding: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: ChannelId::new(),
            operator_key,
            counterparty_key,
            initial_funding,
            current_balance: initial_funding,
            status: ChannelStatus::Active,
            created_at: now,
            last_updated: now,
            payment_history: Vec::new(),
            miner_id: None,
            miner_address: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Sum of all payments applied so far.
    pub fn total_paid(&self) -> Amount {
        self.payment_history.iter().map(|p| p.amount).sum()
    }

    pub fn payment_count(&self) -> usize {
        self.payment_history.len()
    }

    /// The most recently appended payment, if any.
    pub fn latest_payment(&self) -> Option<&PaymentUpdate> {
        self.payment_history.last()
    }

    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            channel_id: self.id,
            miner_id: self.miner_id,
            initial_funding: self.initial_funding,
            current_balance: self.current_balance,
            status: self.status,
            payment_count: self.payment_history.len(),
            created_at: self.created_at,
            last_updated: self.last_updated,
        }
    }

    /// Check whether `amount` could be paid right now without changing anything.
    pub fn check_payment(&self, amount: Amount) -> Result<(), ChannelError> {
        if !self.is_active() {
            return Err(ChannelError::InvalidState {
                channel: self.id,
                status: self.status,
            });
        }
        if amount > self.current_balance {
            return Err(ChannelError::InsufficientBalance {
                channel: self.id,
                requested: amount,
                available: self.current_balance,
            });
        }
        Ok(())
    }

    pub(crate) fn apply_payment(
        &mut self,
        amount: Amount,
        from: Party,
    ) -> Result<PaymentUpdate, ChannelError> {
        self.check_payment(amount)?;

        let now = Utc::now();
        let update = PaymentUpdate {
            id: PaymentId::new(),
            channel_id: self.id,
            amount,
            from,
            to: from.counterparty(),
            timestamp: now,
            status: PaymentStatus::Pending,
            seq: (self.payment_history.len() + 1) as u64,
        };

        self.current_balance -= amount;
        self.last_updated = now;
        self.payment_history.push(update.clone());
        Ok(update)
    }

    pub(crate) fn begin_close(&mut self) -> Result<(), ChannelError> {
        if !self.is_active() {
            return Err(ChannelError::InvalidState {
                channel: self.id,
                status: self.status,
            });
        }
        self.status = ChannelStatus::Closing;
        self.last_updated = Utc::now();
        Ok(())
    }
}

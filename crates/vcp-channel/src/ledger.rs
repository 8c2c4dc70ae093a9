use std::collections::HashMap;

use tracing::debug;

use vcp_crypto::PublicKey;
use vcp_types::{Amount, ChannelId, MinerId, Party};

use crate::channel::{Channel, PaymentUpdate};
use crate::error::ChannelError;

/// Store of every channel the operator has opened, closed ones included.
///
/// All balance mutation goes through this type. Methods take `&mut self`;
/// the owner provides the lock.
#[derive(Debug, Default)]
pub struct ChannelLedger {
    channels: HashMap<ChannelId, Channel>,
}

impl ChannelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an `Active` channel funded with `initial_funding`.
    pub fn open_channel(
        &mut self,
        operator_key: PublicKey,
        counterparty_key: PublicKey,
        initial_funding: Amount,
    ) -> Result<Channel, ChannelError> {
        let channel = Channel::new(operator_key, counterparty_key, initial_funding);
        if self.channels.contains_key(&channel.id) {
            return Err(ChannelError::DuplicateChannel(channel.id));
        }

        debug!(channel = %channel.id, initial_funding, "channel opened");
        self.channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    /// Record which miner owns the channel.
    pub fn bind_owner(
        &mut self,
        channel_id: &ChannelId,
        miner_id: MinerId,
        miner_address: impl Into<String>,
    ) -> Result<(), ChannelError> {
        let channel = self.get_mut(channel_id)?;
        channel.miner_id = Some(miner_id);
        channel.miner_address = Some(miner_address.into());
        Ok(())
    }

    /// Append a payment, decrementing the balance.
    ///
    /// Fails with `InvalidState` unless the channel is `Active` and with
    /// `InsufficientBalance` when `amount` exceeds the balance. A failed
    /// call leaves the channel untouched.
    pub fn append_payment(
        &mut self,
        channel_id: &ChannelId,
        amount: Amount,
        from: Party,
    ) -> Result<PaymentUpdate, ChannelError> {
        let channel = self.get_mut(channel_id)?;
        let update = channel.apply_payment(amount, from)?;
        debug!(
            channel = %channel_id,
            seq = update.seq,
            amount,
            balance = channel.current_balance,
            "payment appended"
        );
        Ok(update)
    }

    /// Dry-run of [`append_payment`](Self::append_payment).
    pub fn check_payment(&self, channel_id: &ChannelId, amount: Amount) -> Result<(), ChannelError> {
        self.get(channel_id)?.check_payment(amount)
    }

    /// Move an `Active` channel to `Closing`. The balance is left as is.
    pub fn close(&mut self, channel_id: &ChannelId) -> Result<(), ChannelError> {
        let channel = self.get_mut(channel_id)?;
        channel.begin_close()?;
        debug!(channel = %channel_id, balance = channel.current_balance, "channel closing");
        Ok(())
    }

    pub fn get(&self, channel_id: &ChannelId) -> Result<&Channel, ChannelError> {
        self.channels
            .get(channel_id)
            .ok_or(ChannelError::NotFound(*channel_id))
    }

    pub fn balance(&self, channel_id: &ChannelId) -> Result<Amount, ChannelError> {
        Ok(self.get(channel_id)?.current_balance)
    }

    pub fn contains(&self, channel_id: &ChannelId) -> bool {
        self.channels.contains_key(channel_id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    fn get_mut(&mut self, channel_id: &ChannelId) -> Result<&mut Channel, ChannelError> {
        self.channels
            .get_mut(channel_id)
            .ok_or(ChannelError::NotFound(*channel_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vcp_crypto::PartyKeypair;
    use vcp_types::ChannelStatus;

    fn open(ledger: &mut ChannelLedger, funding: Amount) -> ChannelId {
        ledger
            .open_channel(
                PartyKeypair::generate().public_key(),
                PartyKeypair::generate().public_key(),
                funding,
            )
            .unwrap()
            .id
    }

    #[test]
    fn open_channel_is_active_with_full_balance() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 1_000_000);
        let channel = ledger.get(&id).unwrap();
        assert_eq!(channel.status, ChannelStatus::Active);
        assert_eq!(channel.current_balance, 1_000_000);
        assert!(channel.payment_history.is_empty());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn payments_get_dense_sequence_numbers() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 100);

        for expected in 1..=3u64 {
            let p = ledger.append_payment(&id, 10, Party::PoolOperator).unwrap();
            assert_eq!(p.seq, expected);
            assert_eq!(p.channel_id, id);
        }

        let channel = ledger.get(&id).unwrap();
        assert_eq!(channel.current_balance, 70);
        let seqs: Vec<u64> = channel.payment_history.iter().map(|p| p.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(channel.last_updated >= channel.created_at);
    }

    #[test]
    fn payment_of_entire_balance_is_allowed() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 50);
        ledger.append_payment(&id, 50, Party::PoolOperator).unwrap();
        assert_eq!(ledger.balance(&id).unwrap(), 0);
    }

    #[test]
    fn overdraft_is_rejected_without_side_effects() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 50);
        ledger.append_payment(&id, 20, Party::PoolOperator).unwrap();
        let before = ledger.get(&id).unwrap().clone();

        let err = ledger.append_payment(&id, 31, Party::PoolOperator).unwrap_err();
        assert_eq!(
            err,
            ChannelError::InsufficientBalance {
                channel: id,
                requested: 31,
                available: 30
            }
        );
        assert_eq!(ledger.get(&id).unwrap(), &before);
    }

    #[test]
    fn closed_channel_rejects_payments_without_side_effects() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 50);
        ledger.append_payment(&id, 5, Party::PoolOperator).unwrap();
        ledger.close(&id).unwrap();
        let before = ledger.get(&id).unwrap().clone();

        let err = ledger.append_payment(&id, 1, Party::PoolOperator).unwrap_err();
        assert!(matches!(err, ChannelError::InvalidState { status: ChannelStatus::Closing, .. }));
        assert!(ledger.check_payment(&id, 1).is_err());
        assert_eq!(ledger.get(&id).unwrap(), &before);
    }

    #[test]
    fn close_keeps_balance_and_is_one_way() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 50);
        ledger.close(&id).unwrap();
        assert_eq!(ledger.balance(&id).unwrap(), 50);
        assert!(matches!(ledger.close(&id), Err(ChannelError::InvalidState { .. })));
    }

    #[test]
    fn unknown_channel_is_not_found() {
        let mut ledger = ChannelLedger::new();
        let missing = ChannelId::new();
        assert_eq!(ledger.get(&missing).unwrap_err(), ChannelError::NotFound(missing));
        assert_eq!(
            ledger.append_payment(&missing, 1, Party::PoolOperator).unwrap_err(),
            ChannelError::NotFound(missing)
        );
        assert_eq!(ledger.close(&missing).unwrap_err(), ChannelError::NotFound(missing));
        assert!(ledger.bind_owner(&missing, MinerId::new(), "addr").is_err());
    }

    #[test]
    fn bind_owner_sets_back_reference() {
        let mut ledger = ChannelLedger::new();
        let id = open(&mut ledger, 1);
        let miner = MinerId::new();
        ledger.bind_owner(&id, miner, "bc1qminer").unwrap();
        let channel = ledger.get(&id).unwrap();
        assert_eq!(channel.miner_id, Some(miner));
        assert_eq!(channel.miner_address.as_deref(), Some("bc1qminer"));
    }

    proptest! {
        #[test]
        fn balance_tracks_accepted_payments(
            funding in 0u64..1_000_000,
            amounts in proptest::collection::vec(0u64..200_000, 0..40),
        ) {
            let mut ledger = ChannelLedger::new();
            let id = open(&mut ledger, funding);
            let mut accepted = Vec::new();

            for amount in amounts {
                let before = ledger.balance(&id).unwrap();
                match ledger.append_payment(&id, amount, Party::PoolOperator) {
                    Ok(p) => {
                        prop_assert!(amount <= before);
                        prop_assert_eq!(p.seq, accepted.len() as u64 + 1);
                        accepted.push(amount);
                    }
                    Err(ChannelError::InsufficientBalance { .. }) => {
                        prop_assert!(amount > before);
                        prop_assert_eq!(ledger.balance(&id).unwrap(), before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
            }

            let channel = ledger.get(&id).unwrap();
            prop_assert_eq!(channel.current_balance, funding - accepted.iter().sum::<u64>());
            prop_assert_eq!(channel.payment_history.len(), accepted.len());
            prop_assert!(channel.verify_history().is_ok());
        }
    }
}

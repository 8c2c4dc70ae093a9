use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use vcp_channel::{Channel, ChannelLedger, ChannelSummary};
use vcp_crypto::{PartyKeypair, PublicKey};
use vcp_types::{Amount, ChannelId, MinerId, Party};

use crate::config::{PoolConfig, RemainderPolicy, SettlementMode};
use crate::error::{PoolError, PoolResult};
use crate::event::{EventBus, EventStream, PoolEvent};
use crate::miner::{Miner, MinerRecord};
use crate::registry::MinerRegistry;
use crate::reward::{share_of, BlockReward};
use crate::stats::PoolStats;

/// The whole pool aggregate. Always accessed through one lock.
#[derive(Default)]
struct PoolState {
    registry: MinerRegistry,
    channels: ChannelLedger,
    active_channels: HashSet<ChannelId>,
    height: u64,
    /// Remainder owed to the next pot under `CarryForward`.
    carried: Amount,
    last_reward: Amount,
}

impl PoolState {
    fn miner_snapshot(&self, record: &MinerRecord) -> PoolResult<Miner> {
        let balance = self.channels.balance(&record.channel_id)?;
        Ok(record.snapshot(balance))
    }
}

/// A planned payment within one settlement.
struct Payout {
    miner: MinerId,
    channel: ChannelId,
    amount: Amount,
}

/// Pool ledger: admits miners, settles rewards across their channels, and
/// removes them.
///
/// Admission, settlement and removal hold the write lock for their whole
/// duration, so a settlement always sees a stable active set and total rate.
/// Reads share the lock.
pub struct PoolLedger {
    config: PoolConfig,
    operator: PartyKeypair,
    events: EventBus,
    inner: RwLock<PoolState>,
}

impl PoolLedger {
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        let operator = match &config.operator_secret {
            Some(secret) => PartyKeypair::from_hex(secret)
                .map_err(|e| PoolError::Config(format!("operator_secret: {e}")))?,
            None => PartyKeypair::generate(),
        };
        let state = PoolState {
            height: config.starting_height,
            ..Default::default()
        };

        info!(
            pool = %config.name,
            operator = %operator.public_key().short_hex(),
            reward = config.reward_per_settlement,
            mode = ?config.settlement_mode,
            "pool ledger started"
        );

        Ok(Self {
            events: EventBus::new(config.event_capacity),
            operator,
            config,
            inner: RwLock::new(state),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn operator_key(&self) -> PublicKey {
        self.operator.public_key()
    }

    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    /// Admit a miner, opening its channel with the configured funding.
    pub fn admit_miner(
        &self,
        name: impl Into<String>,
        address: impl Into<String>,
        rate: f64,
    ) -> PoolResult<Miner> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PoolError::InvalidRate(rate));
        }

        let mut guard = self.write()?;
        let state = &mut *guard;

        // Miners do not present keys yet; each channel gets a fresh one.
        let miner_key = PartyKeypair::generate();
        let channel = state
            .channels
            .open_channel(
                self.operator.public_key(),
                miner_key.public_key(),
                self.config.initial_channel_funding,
            )
            .map_err(PoolError::ChannelCreationFailed)?;

        let record = MinerRecord::new(name.into(), address.into(), rate, channel.id);
        state
            .channels
            .bind_owner(&channel.id, record.id, record.address.clone())?;
        state.active_channels.insert(channel.id);

        let miner = record.snapshot(channel.current_balance);
        state.registry.register(record);

        info!(
            miner = %miner.id,
            channel = %miner.channel_id,
            rate,
            total_rate = state.registry.total_rate(),
            "miner admitted"
        );
        self.events.publish(PoolEvent::MinerAdmitted(miner.clone()));
        Ok(miner)
    }

    /// Split the pot across active miners by rate and pay each through its
    /// channel.
    ///
    /// Fails with `NoActiveParticipants` when the total rate is zero, without
    /// touching any state. A payment failure surfaces as the channel error;
    /// whether earlier payments survive depends on [`SettlementMode`].
    pub fn settle(&self) -> PoolResult<BlockReward> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let total_rate = state.registry.total_rate();
        if total_rate <= 0.0 {
            return Err(PoolError::NoActiveParticipants);
        }

        let pot = self
            .config
            .reward_per_settlement
            .saturating_add(state.carried);
        let payouts: Vec<Payout> = state
            .registry
            .active()
            .map(|m| Payout {
                miner: m.id,
                channel: m.channel_id,
                amount: share_of(pot, m.rate, total_rate),
            })
            .filter(|p| p.amount > 0)
            .collect();

        if self.config.settlement_mode == SettlementMode::Staged {
            for payout in &payouts {
                Self::check_payout(state, payout)?;
            }
        }

        let mut distributions = BTreeMap::new();
        for payout in &payouts {
            if let Err(e) = Self::apply_payout(state, payout) {
                warn!(
                    miner = %payout.miner,
                    amount = payout.amount,
                    applied = distributions.len(),
                    error = %e,
                    "settlement aborted"
                );
                return Err(e);
            }
            distributions.insert(payout.miner, payout.amount);
        }

        let distributed: Amount = distributions.values().sum();
        let remainder = pot.saturating_sub(distributed);
        state.carried = match self.config.remainder_policy {
            RemainderPolicy::Forfeit => 0,
            RemainderPolicy::CarryForward => remainder,
        };
        state.height += 1;
        state.last_reward = pot;

        let reward = BlockReward {
            height: state.height,
            total_reward: pot,
            distributions,
            remainder,
            created_at: Utc::now(),
        };

        info!(
            height = reward.height,
            pot,
            distributed,
            remainder,
            payouts = reward.payout_count(),
            "settlement complete"
        );
        self.events.publish(PoolEvent::Settled(reward.clone()));
        Ok(reward)
    }

    fn check_payout(state: &PoolState, payout: &Payout) -> PoolResult<()> {
        if !state.active_channels.contains(&payout.channel) {
            return Err(PoolError::ChannelNotFound(payout.channel));
        }
        state.channels.check_payment(&payout.channel, payout.amount)?;
        Ok(())
    }

    fn apply_payout(state: &mut PoolState, payout: &Payout) -> PoolResult<()> {
        Self::check_payout(state, payout)?;
        let update = state
            .channels
            .append_payment(&payout.channel, payout.amount, Party::PoolOperator)?;
        let record = state
            .registry
            .get_mut(&payout.miner)
            .ok_or(PoolError::MinerNotFound(payout.miner))?;
        record.credit(payout.amount);
        debug!(miner = %payout.miner, seq = update.seq, amount = payout.amount, "miner paid");
        Ok(())
    }

    /// Close a miner's channel and exclude it from future settlements.
    ///
    /// The miner record stays queryable with `is_active == false`.
    pub fn remove_miner(&self, miner_id: &MinerId) -> PoolResult<()> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let channel_id = state
            .registry
            .get(miner_id)
            .ok_or(PoolError::MinerNotFound(*miner_id))?
            .channel_id;
        if !state.active_channels.contains(&channel_id) {
            return Err(PoolError::ChannelNotFound(channel_id));
        }

        state.channels.close(&channel_id)?;
        state.active_channels.remove(&channel_id);
        state.registry.deactivate(miner_id);
        let final_balance = state.channels.balance(&channel_id)?;

        info!(
            miner = %miner_id,
            channel = %channel_id,
            final_balance,
            total_rate = state.registry.total_rate(),
            "miner removed"
        );
        self.events.publish(PoolEvent::ChannelClosed {
            miner_id: *miner_id,
            channel_id,
            final_balance,
        });
        Ok(())
    }

    pub fn stats(&self) -> PoolResult<PoolStats> {
        let state = self.read()?;
        Ok(PoolStats {
            total_miners: state.registry.len(),
            active_miners: state.registry.active().count(),
            total_rate: state.registry.active().map(|m| m.rate).sum(),
            total_earned: state.registry.total_earned(),
            active_channel_count: state.active_channels.len(),
            last_reward_amount: state.last_reward,
        })
    }

    pub fn get_miner(&self, miner_id: &MinerId) -> PoolResult<Miner> {
        let state = self.read()?;
        let record = state
            .registry
            .get(miner_id)
            .ok_or(PoolError::MinerNotFound(*miner_id))?;
        state.miner_snapshot(record)
    }

    /// Any channel the pool has opened, closed ones included.
    pub fn get_channel(&self, channel_id: &ChannelId) -> PoolResult<Channel> {
        let state = self.read()?;
        Ok(state.channels.get(channel_id)?.clone())
    }

    /// All miners, inactive ones included, in admission order.
    pub fn list_miners(&self) -> PoolResult<Vec<Miner>> {
        let state = self.read()?;
        state
            .registry
            .iter()
            .map(|record| state.miner_snapshot(record))
            .collect()
    }

    /// Active channels in admission order.
    pub fn list_channels(&self) -> PoolResult<Vec<Channel>> {
        let state = self.read()?;
        state
            .registry
            .iter()
            .filter(|m| state.active_channels.contains(&m.channel_id))
            .map(|m| -> PoolResult<Channel> { Ok(state.channels.get(&m.channel_id)?.clone()) })
            .collect()
    }

    /// Summaries of every channel, in admission order.
    pub fn channel_summaries(&self) -> PoolResult<Vec<ChannelSummary>> {
        let state = self.read()?;
        state
            .registry
            .iter()
            .map(|m| -> PoolResult<ChannelSummary> { Ok(state.channels.get(&m.channel_id)?.summary()) })
            .collect()
    }

    /// Height of the most recent settlement (`starting_height` before any).
    pub fn height(&self) -> PoolResult<u64> {
        Ok(self.read()?.height)
    }

    fn read(&self) -> PoolResult<RwLockReadGuard<'_, PoolState>> {
        self.inner.read().map_err(|_| PoolError::LockPoisoned)
    }

    fn write(&self) -> PoolResult<RwLockWriteGuard<'_, PoolState>> {
        self.inner.write().map_err(|_| PoolError::LockPoisoned)
    }
}

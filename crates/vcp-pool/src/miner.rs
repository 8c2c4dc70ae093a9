use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vcp_types::{Amount, ChannelId, MinerId};

/// A pool member as seen by callers.
///
/// `current_balance` is read from the miner's channel when the snapshot is
/// taken; the registry never stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Miner {
    pub id: MinerId,
    pub address: String,
    pub name: String,
    pub rate: f64,
    pub total_earned: Amount,
    pub current_balance: Amount,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub channel_id: ChannelId,
}

/// Registry entry for one miner.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MinerRecord {
    pub id: MinerId,
    pub address: String,
    pub name: String,
    pub rate: f64,
    pub total_earned: Amount,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub channel_id: ChannelId,
}

impl MinerRecord {
    pub fn new(name: String, address: String, rate: f64, channel_id: ChannelId) -> Self {
        let now = Utc::now();
        Self {
            id: MinerId::new(),
            address,
            name,
            rate,
            total_earned: 0,
            joined_at: now,
            last_activity: now,
            is_active: true,
            channel_id,
        }
    }

    /// Credit a settled payment.
    pub fn credit(&mut self, amount: Amount) {
        self.total_earned += amount;
        self.last_activity = Utc::now();
    }

    pub fn snapshot(&self, current_balance: Amount) -> Miner {
        Miner {
            id: self.id,
            address: self.address.clone(),
            name: self.name.clone(),
            rate: self.rate,
            total_earned: self.total_earned,
            current_balance,
            joined_at: self.joined_at,
            last_activity: self.last_activity,
            is_active: self.is_active,
            channel_id: self.channel_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_active_with_nothing_earned() {
        let r = MinerRecord::new("alice".into(), "bc1qalice".into(), 2.5, ChannelId::new());
        assert!(r.is_active);
        assert_eq!(r.total_earned, 0);
        assert_eq!(r.joined_at, r.last_activity);
    }

    #[test]
    fn credit_accumulates() {
        let mut r = MinerRecord::new("bob".into(), "bc1qbob".into(), 1.0, ChannelId::new());
        r.credit(10);
        r.credit(5);
        assert_eq!(r.total_earned, 15);
        assert!(r.last_activity >= r.joined_at);
    }

    #[test]
    fn snapshot_carries_supplied_balance() {
        let r = MinerRecord::new("carol".into(), "bc1qcarol".into(), 1.0, ChannelId::new());
        let m = r.snapshot(777);
        assert_eq!(m.current_balance, 777);
        assert_eq!(m.id, r.id);
        assert_eq!(m.channel_id, r.channel_id);
    }
}

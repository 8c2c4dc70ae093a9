use serde::{Deserialize, Serialize};

use vcp_types::Amount;

/// Aggregate pool statistics, computed by scanning the registry on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_miners: usize,
    pub active_miners: usize,
    pub total_rate: f64,
    pub total_earned: Amount,
    pub active_channel_count: usize,
    /// Pot of the most recent successful settlement; `0` before the first one.
    pub last_reward_amount: Amount,
}

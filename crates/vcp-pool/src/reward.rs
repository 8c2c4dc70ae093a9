use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vcp_types::{Amount, MinerId};

/// Receipt of one settlement. Returned to the caller and published as an
/// event; never stored by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReward {
    pub height: u64,
    /// The pot split by this settlement.
    pub total_reward: Amount,
    /// Positive payouts only; miners whose share floored to zero are absent.
    pub distributions: BTreeMap<MinerId, Amount>,
    /// `total_reward` minus everything distributed.
    pub remainder: Amount,
    pub created_at: DateTime<Utc>,
}

impl BlockReward {
    pub fn distributed(&self) -> Amount {
        self.distributions.values().sum()
    }

    pub fn payout_count(&self) -> usize {
        self.distributions.len()
    }
}

/// `floor(pot * rate / total_rate)`.
///
/// Depends only on the miner's own rate and the total, never on the other
/// miners or on iteration order. Whole-number rates are split exactly in
/// integer arithmetic; fractional rates multiply before dividing in `f64`.
/// The result never exceeds `pot`, even against a drifted running total.
pub fn share_of(pot: Amount, rate: f64, total_rate: f64) -> Amount {
    let positive = |x: f64| x.is_finite() && x > 0.0;
    if !positive(total_rate) || !positive(rate) {
        return 0;
    }
    if let (Some(r), Some(t)) = (whole(rate), whole(total_rate)) {
        return (pot as u128 * r / t).min(pot as u128) as Amount;
    }
    let share = (pot as f64 * rate / total_rate).floor();
    (share as Amount).min(pot)
}

/// `x` as an integer when it is a whole number `f64` represents exactly.
fn whole(x: f64) -> Option<u128> {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    (x.fract() == 0.0 && x <= EXACT).then_some(x as u128)
}

use std::collections::HashMap;

use vcp_types::{Amount, MinerId};

use crate::miner::MinerRecord;

/// Participant registry: every miner ever admitted, in admission order,
/// plus the running sum of active rates.
#[derive(Debug, Default)]
pub(crate) struct MinerRegistry {
    miners: HashMap<MinerId, MinerRecord>,
    roster: Vec<MinerId>,
    total_rate: f64,
}

impl MinerRegistry {
    pub fn register(&mut self, record: MinerRecord) {
        self.total_rate += record.rate;
        self.roster.push(record.id);
        self.miners.insert(record.id, record);
    }

    /// Mark a miner inactive and drop its rate from the running sum.
    /// Returns `false` if the miner is unknown or already inactive.
    pub fn deactivate(&mut self, id: &MinerId) -> bool {
        let Some(record) = self.miners.get_mut(id) else {
            return false;
        };
        if !record.is_active {
            return false;
        }
        record.is_active = false;
        self.total_rate -= record.rate;

        // Float subtraction drifts; an empty pool must read exactly zero.
        if self.active().next().is_none() {
            self.total_rate = 0.0;
        }
        true
    }

    pub fn get(&self, id: &MinerId) -> Option<&MinerRecord> {
        self.miners.get(id)
    }

    pub fn get_mut(&mut self, id: &MinerId) -> Option<&mut MinerRecord> {
        self.miners.get_mut(id)
    }

    /// All miners in admission order.
    pub fn iter(&self) -> impl Iterator<Item = &MinerRecord> {
        self.roster.iter().filter_map(|id| self.miners.get(id))
    }

    /// Active miners in admission order.
    pub fn active(&self) -> impl Iterator<Item = &MinerRecord> {
        self.iter().filter(|m| m.is_active)
    }

    pub fn total_rate(&self) -> f64 {
        self.total_rate
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn total_earned(&self) -> Amount {
        self.miners.values().map(|m| m.total_earned).sum()
    }
}

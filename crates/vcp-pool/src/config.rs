use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use vcp_types::Amount;

use crate::error::{PoolError, PoolResult};

/// How a settlement behaves when one of its payments cannot be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Validate every payment first; apply all or none.
    Staged,
    /// Apply payments in admission order and stop at the first failure.
    /// Payments already applied in the same call are kept.
    BestEffort,
}

/// What happens to the undistributed remainder of a pot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// The remainder is dropped.
    Forfeit,
    /// The remainder is added to the next settlement's pot.
    CarryForward,
}

/// Configuration for a [`PoolLedger`](crate::PoolLedger).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Display name of the pool.
    pub name: String,
    /// Payout address of the pool operator.
    pub operator_address: String,
    /// Hex-encoded 32-byte operator secret. A fresh key is generated when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_secret: Option<String>,
    /// Fixed reward split by each settlement.
    pub reward_per_settlement: Amount,
    /// Funding placed in every newly opened channel.
    pub initial_channel_funding: Amount,
    /// Height reported before the first settlement.
    pub starting_height: u64,
    /// Period of the settlement driver.
    pub settlement_interval_secs: u64,
    pub settlement_mode: SettlementMode,
    pub remainder_policy: RemainderPolicy,
    /// Capacity of the pool event broadcast channel.
    pub event_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "Virtual Channel Pool".into(),
            operator_address: "bc1qpooloperator".into(),
            operator_secret: None,
            reward_per_settlement: 625_000_000,
            initial_channel_funding: 1_000_000,
            starting_height: 100_000,
            settlement_interval_secs: 30,
            settlement_mode: SettlementMode::Staged,
            remainder_policy: RemainderPolicy::Forfeit,
            event_capacity: 256,
        }
    }
}

impl PoolConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> PoolResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| PoolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> PoolResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PoolError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> PoolResult<String> {
        toml::to_string_pretty(self).map_err(|e| PoolError::Config(e.to_string()))
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.reward_per_settlement == 0 {
            return Err(PoolError::Config("reward_per_settlement must be positive".into()));
        }
        if self.settlement_interval_secs == 0 {
            return Err(PoolError::Config("settlement_interval_secs must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(PoolError::Config("event_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn settlement_interval(&self) -> Duration {
        Duration::from_secs(self.settlement_interval_secs)
    }
}

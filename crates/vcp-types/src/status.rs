use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a virtual channel.
///
/// Transitions are one-way: `Active → Closing`. `Closed` is representable
/// but no ledger operation reaches it; `Closing` is terminal for accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Accepting payment updates.
    Active,
    /// Close requested; no further balance mutation.
    Closing,
    /// Closed on-chain.
    Closed,
}

impl ChannelStatus {
    /// Returns `true` if the channel accepts balance mutation.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// State of a payment update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Applied to the channel balance, not yet countersigned by the miner.
    Pending,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcp_channel::ChannelError;
use vcp_types::{Amount, ChannelId, ChannelStatus, MinerId};

/// Errors produced by pool ledger operations.
///
/// None of these is fatal: the ledger stays usable after any failed call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("channel {channel} is {status}, not active")]
    InvalidState {
        channel: ChannelId,
        status: ChannelStatus,
    },

    #[error("insufficient balance in channel {channel}: requested {requested}, available {available}")]
    InsufficientBalance {
        channel: ChannelId,
        requested: Amount,
        available: Amount,
    },

    #[error("no active participants to settle")]
    NoActiveParticipants,

    #[error("channel creation failed: {0}")]
    ChannelCreationFailed(ChannelError),

    #[error("miner not found: {0}")]
    MinerNotFound(MinerId),

    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("invalid rate {0}: must be finite and positive")]
    InvalidRate(f64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("pool state lock poisoned")]
    LockPoisoned,

    #[error("internal error: {0}")]
    Internal(String),
}

impl PoolError {
    /// Machine-readable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::NoActiveParticipants => ErrorKind::NoActiveParticipants,
            Self::ChannelCreationFailed(_) => ErrorKind::ChannelCreationFailed,
            Self::MinerNotFound(_) | Self::ChannelNotFound(_) => ErrorKind::NotFound,
            Self::InvalidRate(_) => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::Config,
            Self::LockPoisoned | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<ChannelError> for PoolError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound(channel) => Self::ChannelNotFound(channel),
            ChannelError::InvalidState { channel, status } => Self::InvalidState { channel, status },
            ChannelError::InsufficientBalance {
                channel,
                requested,
                available,
            } => Self::InsufficientBalance {
                channel,
                requested,
                available,
            },
            err @ ChannelError::DuplicateChannel(_) => Self::ChannelCreationFailed(err),
            err @ ChannelError::IntegrityViolation { .. } => Self::Internal(err.to_string()),
        }
    }
}

/// Error classification surfaced alongside the human-readable message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidState,
    InsufficientBalance,
    NoActiveParticipants,
    ChannelCreationFailed,
    NotFound,
    InvalidInput,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidState => "invalid_state",
            Self::InsufficientBalance => "insufficient_balance",
            Self::NoActiveParticipants => "no_active_participants",
            Self::ChannelCreationFailed => "channel_creation_failed",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

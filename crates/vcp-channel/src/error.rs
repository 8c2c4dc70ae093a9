use vcp_types::{Amount, ChannelId, ChannelStatus};

/// Errors produced by channel ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel not found: {0}")]
    NotFound(ChannelId),

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

    #[error("channel already exists: {0}")]
    DuplicateChannel(ChannelId),

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },
}

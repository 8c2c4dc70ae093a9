//! Foundation types for the virtual-channel pool.
//!
//! Every other `vcp-*` crate depends on `vcp-types`. Nothing here holds
//! ledger state; these are the identifiers and labels the ledgers agree on.
//!
//! # Key Types
//!
//! - [`MinerId`], [`ChannelId`], [`PaymentId`]: UUID v7 identifiers
//! - [`Amount`]: balances and payments in the smallest currency unit
//! - [`Party`]: which side of a channel originated or received a payment
//! - [`ChannelStatus`] / [`PaymentStatus`]: lifecycle labels

pub mod error;
pub mod id;
pub mod party;
pub mod status;

pub use error::TypeError;
pub use id::{ChannelId, MinerId, PaymentId};
pub use party::Party;
pub use status::{ChannelStatus, PaymentStatus};

/// An amount in the smallest currency unit (e.g. satoshis).
pub type Amount = u64;

//! Virtual channel ledger for the pool operator.
//!
//! This crate owns every channel record and its payment history. It provides:
//! - [`Channel`] / [`PaymentUpdate`] records with an append-only history
//! - [`ChannelLedger`], the store that opens, pays through, and closes channels
//! - [`HistoryValidator`], which re-derives balances and sequence numbers
//!
//! The ledger knows nothing about rewards. It has no lock of its own; the
//! owner serializes access by holding it behind whatever boundary guards the
//! rest of its state.

pub mod channel;
pub mod error;
pub mod ledger;
pub mod validation;

pub use channel::{Channel, ChannelSummary, PaymentUpdate};
pub use error::ChannelError;
pub use ledger::ChannelLedger;
pub use validation::{HistoryValidator, ValidationReport, Violation, ViolationKind};

//! Key material for virtual-channel counterparties.
//!
//! Channels are opened between two Ed25519 public keys: the pool operator's
//! and the miner's. Payment updates are not signed here; the keys identify
//! the parties a signing layer would later bind to.
//!
//! All crypto operations wrap established libraries.

pub mod keys;

pub use keys::{KeyError, PartyKeypair, PublicKey};

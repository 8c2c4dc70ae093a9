//! Pool ledger for the virtual-channel pool.
//!
//! Owns the participant registry and the set of active channels, and splits
//! a fixed reward pot across those channels in proportion to each miner's
//! declared rate. All balance mutation is delegated to
//! [`vcp_channel::ChannelLedger`].
//!
//! - [`PoolLedger`]: admission, settlement, removal, and read snapshots
//! - [`PoolConfig`]: TOML-loadable settings, including [`SettlementMode`]
//!   and [`RemainderPolicy`]
//! - [`PoolEvent`]: typed notifications for admission, settlement, closure
//! - [`SettlementDriver`]: tokio task that settles on a fixed interval

pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod miner;
pub mod pool;
mod registry;
pub mod reward;
pub mod stats;

pub use config::{PoolConfig, RemainderPolicy, SettlementMode};
pub use driver::{DriverHandle, SettlementDriver};
pub use error::{ErrorKind, PoolError, PoolResult};
pub use event::{EventBus, EventStream, PoolEvent, PoolEventKind};
pub use miner::Miner;
pub use pool::PoolLedger;
pub use reward::{share_of, BlockReward};
pub use stats::PoolStats;

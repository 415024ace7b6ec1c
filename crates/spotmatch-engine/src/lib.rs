//! # spotmatch-engine
//!
//! **Market dispatcher for SpotMatch.**
//!
//! Wraps one [`OrderBook`](spotmatch_book::OrderBook) per market with the
//! exchange rules and serializes every command behind a single lock:
//!
//! - [`MarketHandler`]: validation, taker bookkeeping, gas-fee waiver, and
//!   the ordered notification list for one market
//! - [`Engine`]: lazy market registry, the global lock, and sink fan-out
//! - [`PersistenceSink`], [`SnapshotSink`], [`ActivitySink`]: outbound seams,
//!   with [`ChannelSink`] as a tokio-channel implementation
//! - [`telemetry::init_tracing`]: subscriber setup

pub mod channel_sink;
pub mod engine;
pub mod market_handler;
pub mod sink;
pub mod telemetry;

pub use channel_sink::{ChannelSink, SnapshotUpdate};
pub use engine::Engine;
pub use market_handler::{CrossingCheck, MarketHandler};
pub use sink::{ActivitySink, PersistenceSink, SnapshotSink};
pub use telemetry::init_tracing;

//! # spotmatch-types
//!
//! Shared types, errors, and configuration for the **SpotMatch** matching engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`MarketId`]
//! - **Order model**: [`Order`], [`OrderSide`], [`OrderType`], [`TimeInForce`], [`OrderStatus`]
//! - **Book events**: [`OrderbookEvent`], [`Snapshot`], [`LevelAmount`]
//! - **Match model**: [`MatchItem`], [`MatchResult`]
//! - **Notifications**: [`Message`], [`MessagePayload`], [`OrderUpdate`], [`OrderbookChange`]
//! - **Configuration**: [`EngineConfig`], [`MarketConfig`]
//! - **Errors**: [`SpotmatchError`] with `SM_ERR_` prefix codes, and the
//!   separate [`FatalError`] kind for invariant violations
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod match_result;
pub mod message;
pub mod order;

// Re-export all primary types at crate root for ergonomic imports:
//   use spotmatch_types::{Order, OrderSide, MatchResult, Message, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use match_result::*;
pub use message::*;
pub use order::*;

// Constants are accessed via `spotmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).

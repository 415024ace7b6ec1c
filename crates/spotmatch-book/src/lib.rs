//! # spotmatch-book
//!
//! **Per-market limit order book for SpotMatch.**
//!
//! The book is a sequenced ledger of resting liquidity:
//!
//! - **Price-time priority**: best price first, oldest order first within a price
//! - **Exact decimals**: every amount is a `rust_decimal::Decimal`
//! - **Sequenced mutations**: insert, remove, and each maker fill advance the
//!   book's sequence by one and yield an [`OrderbookEvent`](spotmatch_types::OrderbookEvent)
//! - **No side effects**: no locking, no I/O; the engine crate owns both

pub mod digest;
pub mod matcher;
pub mod orderbook;
pub mod price_level;

pub use digest::{compute_snapshot_digest, snapshot_digest_hex, verify_snapshot_digest};
pub use matcher::{round_amount, round_quote};
pub use orderbook::{OrderBook, SequenceHook, advance_sequence};
pub use price_level::PriceLevel;

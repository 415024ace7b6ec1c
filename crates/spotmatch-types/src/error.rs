//! Error types for the SpotMatch matching engine.
//!
//! All errors use the `SM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 5xx: Matching / invariant errors
//! - 6xx: Sink delivery errors ([`SinkError`], logged and never returned)
//! - 9xx: General / internal errors
//!
//! Invariant violations are a separate type, [`FatalError`], so a caller can
//! tell "the engine state can no longer be trusted" apart from a rejected
//! request. They reach callers wrapped as [`SpotmatchError::Fatal`].

use thiserror::Error;

use crate::{MarketId, OrderId};

/// Unrecoverable conditions. The request path that raised one must stop; the
/// integrating layer decides whether to abort the process or isolate the
/// market.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    /// `can_match` predicted a cross but matching produced no items.
    #[error("SM_ERR_500: No match items for crossing order {order_id} in market {market}")]
    EmptyMatch { market: MarketId, order_id: OrderId },

    /// A market handler could not be built for the market.
    #[error("SM_ERR_501: Cannot create handler for market {market}: {reason}")]
    HandlerCreation { market: MarketId, reason: String },

    /// A command referenced a market that was never created.
    #[error("SM_ERR_502: Market not found: {0}")]
    MarketNotFound(MarketId),

    /// The market was quarantined after an earlier fatal error.
    #[error("SM_ERR_503: Market halted after fatal error: {0}")]
    MarketHalted(MarketId),

    /// A fill's quote amount or fee does not fit in a decimal. Validation
    /// keeps `price * amount` representable for every resting order, so this
    /// only fires on a corrupt book.
    #[error("SM_ERR_504: Quote overflow filling maker {maker_id} in market {market}")]
    QuoteOverflow { market: MarketId, maker_id: OrderId },
}

/// Central error enum for all SpotMatch operations.
#[derive(Debug, Error)]
pub enum SpotmatchError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The order failed validation (bad amount, wrong market, etc.).
    #[error("SM_ERR_101: Invalid order {order_id}: {reason}")]
    InvalidOrder { order_id: OrderId, reason: String },

    // =================================================================
    // Fatal (5xx)
    // =================================================================
    #[error(transparent)]
    Fatal(#[from] FatalError),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("SM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad precision, etc.).
    #[error("SM_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (reading a config file).
    #[error("SM_ERR_903: I/O error: {0}")]
    Io(String),
}

impl SpotmatchError {
    /// Whether this error is an invariant violation rather than a rejection.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// The wrapped fatal error, if any.
    #[must_use]
    pub fn as_fatal(&self) -> Option<&FatalError> {
        match self {
            Self::Fatal(fatal) => Some(fatal),
            _ => None,
        }
    }
}

/// Failure reported by a persistence, snapshot, or activity sink.
///
/// Sink failures never unwind matching; the engine logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SM_ERR_600: Sink {sink} failed: {reason}")]
pub struct SinkError {
    pub sink: &'static str,
    pub reason: String,
}

impl SinkError {
    #[must_use]
    pub fn new(sink: &'static str, reason: impl Into<String>) -> Self {
        Self {
            sink,
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SpotmatchError>;

impl From<std::io::Error> for SpotmatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SpotmatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

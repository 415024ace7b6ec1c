//! Identifiers used throughout SpotMatch.
//!
//! Order IDs use UUIDv7 for time-ordered lexicographic sorting. Markets are
//! keyed by their plain symbol (e.g. `ETH-BTC`).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Globally unique order identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MarketId
// ---------------------------------------------------------------------------

/// A market symbol such as `ETH-BTC`. The engine shards books by this key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub String);

impl MarketId {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_uniqueness() {
        let a = OrderId::new();
        let b = OrderId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn order_id_ordering() {
        let a = OrderId::new();
        let b = OrderId::new();
        assert!(a < b);
    }

    #[test]
    fn market_id_display_is_symbol() {
        let market = MarketId::new("ETH-BTC");
        assert_eq!(market.to_string(), "ETH-BTC");
        assert_eq!(market.as_str(), "ETH-BTC");
        assert!(!market.is_empty());
        assert!(MarketId::new("  ").is_empty());
    }

    #[test]
    fn market_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&MarketId::new("ETH-BTC")).unwrap();
        assert_eq!(json, "\"ETH-BTC\"");
        let back: MarketId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MarketId::from("ETH-BTC"));
    }
}

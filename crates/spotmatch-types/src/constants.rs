//! System-wide constants for the SpotMatch matching engine.

/// Highest scale `rust_decimal` can represent.
pub const MAX_DECIMALS: u32 = 28;

/// Default precision for base amounts (fills are rounded to this scale).
pub const DEFAULT_AMOUNT_DECIMALS: u32 = 8;

/// Default precision for quote amounts and fees.
pub const DEFAULT_QUOTE_DECIMALS: u32 = 8;

/// Namespace of the per-market snapshot cache key.
pub const ORDERBOOK_SNAPSHOT_KEY_PREFIX: &str = "SPOTMATCH_MARKET_ORDERBOOK_SNAPSHOT_V2";

/// Prefix of the per-market notification channel.
pub const MARKET_CHANNEL_PREFIX: &str = "Market#";

/// Prefix of the per-trader notification channel.
pub const TRADER_CHANNEL_PREFIX: &str = "TraderAddress#";

/// Cache key under which a market's latest snapshot is stored.
#[must_use]
pub fn snapshot_key(market: &crate::MarketId) -> String {
    format!("{ORDERBOOK_SNAPSHOT_KEY_PREFIX}:{market}")
}

//! Configuration types for the engine and its markets.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, MarketId, Result, SpotmatchError};

/// Engine-wide configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rules applied to markets without an explicit entry in `markets`.
    #[serde(default)]
    pub default_market: MarketConfig,
    /// Per-market overrides.
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
    /// Quarantine a market after a fatal error instead of leaving it live.
    #[serde(default)]
    pub halt_market_on_fatal: bool,
}

impl EngineConfig {
    /// Parse a JSON document and validate every market entry.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate the default entry and every override.
    pub fn validate(&self) -> Result<()> {
        self.default_market.validate_rules()?;
        for market in &self.markets {
            market.validate()?;
        }
        Ok(())
    }

    /// Rules for `market`: its explicit entry, or the default re-keyed to it.
    #[must_use]
    pub fn market_config(&self, market: &MarketId) -> MarketConfig {
        self.markets
            .iter()
            .find(|m| &m.market_id == market)
            .cloned()
            .unwrap_or_else(|| MarketConfig {
                market_id: market.clone(),
                ..self.default_market.clone()
            })
    }
}

/// Per-market matching rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub market_id: MarketId,
    /// Scale applied to matched base amounts.
    pub amount_decimals: u32,
    /// Scale applied to quote amounts and fees.
    pub quote_decimals: u32,
    /// Fee charged to the resting side, as a fraction of quote amount.
    pub maker_fee_rate: Decimal,
    /// Fee charged to the incoming side, as a fraction of quote amount.
    pub taker_fee_rate: Decimal,
    /// Smallest amount an order may be submitted with.
    pub min_order_amount: Decimal,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            market_id: MarketId::default(),
            amount_decimals: constants::DEFAULT_AMOUNT_DECIMALS,
            quote_decimals: constants::DEFAULT_QUOTE_DECIMALS,
            maker_fee_rate: Decimal::ZERO,
            taker_fee_rate: Decimal::ZERO,
            min_order_amount: Decimal::ZERO,
        }
    }
}

impl MarketConfig {
    /// Default rules bound to `market`.
    #[must_use]
    pub fn for_market(market: MarketId) -> Self {
        Self {
            market_id: market,
            ..Self::default()
        }
    }

    /// Full validation, including the market identifier.
    pub fn validate(&self) -> Result<()> {
        if self.market_id.is_empty() {
            return Err(SpotmatchError::Configuration(
                "market_id must not be empty".to_string(),
            ));
        }
        self.validate_rules()
    }

    fn validate_rules(&self) -> Result<()> {
        if self.amount_decimals > constants::MAX_DECIMALS {
            return Err(SpotmatchError::Configuration(format!(
                "amount_decimals {} exceeds {}",
                self.amount_decimals,
                constants::MAX_DECIMALS
            )));
        }
        if self.quote_decimals > constants::MAX_DECIMALS {
            return Err(SpotmatchError::Configuration(format!(
                "quote_decimals {} exceeds {}",
                self.quote_decimals,
                constants::MAX_DECIMALS
            )));
        }
        for (name, rate) in [
            ("maker_fee_rate", self.maker_fee_rate),
            ("taker_fee_rate", self.taker_fee_rate),
        ] {
            if rate.is_sign_negative() || rate >= Decimal::ONE {
                return Err(SpotmatchError::Configuration(format!(
                    "{name} {rate} must be in [0, 1)"
                )));
            }
        }
        if self.min_order_amount.is_sign_negative() {
            return Err(SpotmatchError::Configuration(
                "min_order_amount must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

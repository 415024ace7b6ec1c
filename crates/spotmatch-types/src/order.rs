//! Order types for the SpotMatch matching engine.
//!
//! An [`Order`] is created by the caller, mutated in place while it takes
//! liquidity, and ends either fully filled or canceled.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MarketId, OrderId};

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side this order would trade against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    /// Crosses against any resting liquidity; never rests.
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
        }
    }
}

/// How long an unfilled remainder may stay on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good till canceled: the remainder rests.
    #[default]
    Gtc,
    /// Immediate or cancel: the remainder is dropped after matching.
    Ioc,
}

/// Lifecycle status of an order.
///
/// `pending -> partial_filled* -> {full_filled | canceled}`; the two
/// right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PartialFilled,
    FullFilled,
    Canceled,
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FullFilled | Self::Canceled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::PartialFilled => write!(f, "partial_filled"),
            Self::FullFilled => write!(f, "full_filled"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Core order struct.
///
/// `amount` is the remaining (unfilled) base amount and is decremented as the
/// order fills; `original_amount` never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub market_id: MarketId,
    /// Trader address; notifications for this order go to its channel.
    pub trader: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    pub price: Decimal,
    pub original_amount: Decimal,
    pub amount: Decimal,
    pub gas_fee_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending limit order with the full amount remaining.
    #[must_use]
    pub fn new_limit(
        market_id: MarketId,
        trader: impl Into<String>,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
        gas_fee_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            market_id,
            trader: trader.into(),
            side,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Gtc,
            price,
            original_amount: amount,
            amount,
            gas_fee_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new pending market order. The price is kept only as a
    /// reference; market orders cross at any resting price.
    #[must_use]
    pub fn new_market(
        market_id: MarketId,
        trader: impl Into<String>,
        side: OrderSide,
        amount: Decimal,
        gas_fee_amount: Decimal,
    ) -> Self {
        let mut order = Self::new_limit(market_id, trader, side, Decimal::ZERO, amount, gas_fee_amount);
        order.order_type = OrderType::Market;
        order.time_in_force = TimeInForce::Ioc;
        order
    }

    /// Whether this order is willing to trade at `price`.
    #[must_use]
    pub fn crosses(&self, price: Decimal) -> bool {
        if self.order_type == OrderType::Market {
            return true;
        }
        match self.side {
            OrderSide::Buy => price <= self.price,
            OrderSide::Sell => price >= self.price,
        }
    }

    /// Whether an unfilled remainder of this order may rest on the book.
    #[must_use]
    pub fn is_resting_eligible(&self) -> bool {
        self.order_type == OrderType::Limit && self.time_in_force == TimeInForce::Gtc
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.amount.is_zero()
    }

    #[must_use]
    pub fn filled_amount(&self) -> Decimal {
        self.original_amount - self.amount
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy_limit(side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self::new_limit(
            MarketId::new("ETH-BTC"),
            "0xtrader",
            side,
            price,
            amount,
            Decimal::new(1, 2),
        )
    }

    pub fn dummy_limit_in(market: &str, side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        let mut order = Self::dummy_limit(side, price, amount);
        order.market_id = MarketId::new(market);
        order
    }

    pub fn dummy_market(side: OrderSide, amount: Decimal) -> Self {
        Self::new_market(
            MarketId::new("ETH-BTC"),
            "0xtrader",
            side,
            amount,
            Decimal::new(1, 2),
        )
    }
}

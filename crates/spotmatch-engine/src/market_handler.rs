//! Per-market orchestration around the raw book primitives.
//!
//! The book only knows how to match, insert, and remove. The handler adds
//! the exchange rules: order validation, applying fills to the taker, the
//! gas-fee waiver, whether a remainder may rest, and the notification list
//! observers consume.

use chrono::Utc;
use rust_decimal::Decimal;
use spotmatch_book::{OrderBook, round_amount};
use spotmatch_types::{
    FatalError, MarketConfig, MarketId, MatchResult, Message, Order, OrderStatus, OrderType,
    OrderbookEvent, Result, Snapshot, SpotmatchError,
};

/// Decides whether an order crosses the book before matching runs.
pub type CrossingCheck = fn(&OrderBook, &Order) -> bool;

/// Owns one market's book and applies its rules.
#[derive(Debug)]
pub struct MarketHandler {
    market: MarketId,
    config: MarketConfig,
    orderbook: OrderBook,
    crosses: CrossingCheck,
}

impl MarketHandler {
    /// Build a handler for `config.market_id`.
    ///
    /// Invalid market rules make the handler impossible to build, which is
    /// reported as [`FatalError::HandlerCreation`].
    pub fn new(config: MarketConfig) -> Result<Self> {
        let market = config.market_id.clone();
        config
            .validate()
            .map_err(|err| FatalError::HandlerCreation {
                market: market.clone(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            orderbook: OrderBook::new(market.clone()),
            market,
            config,
            crosses: OrderBook::can_match,
        })
    }

    /// Replace the crossing check, so tests can drive the matcher with a
    /// book that disagrees with it.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn with_crossing_check(mut self, crosses: CrossingCheck) -> Self {
        self.crosses = crosses;
        self
    }

    #[must_use]
    pub fn market(&self) -> &MarketId {
        &self.market
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    #[must_use]
    pub fn orderbook(&self) -> &OrderBook {
        &self.orderbook
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.orderbook.sequence()
    }

    /// The current snapshot, stamped with the current sequence.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.orderbook.snapshot().with_sequence(self.orderbook.sequence())
    }

    /// Reject orders this market cannot accept.
    pub fn validate_order(&self, order: &Order) -> Result<()> {
        let reject = |reason: String| SpotmatchError::InvalidOrder {
            order_id: order.id,
            reason,
        };

        if order.market_id != self.market {
            return Err(reject(format!(
                "order is for market {}, handler serves {}",
                order.market_id, self.market
            )));
        }
        if order.status.is_terminal() {
            return Err(reject(format!("order is already {}", order.status)));
        }
        if order.order_type == OrderType::Limit && order.price <= Decimal::ZERO {
            return Err(reject(format!("limit price {} must be positive", order.price)));
        }
        if order.gas_fee_amount.is_sign_negative() {
            return Err(reject("gas fee must not be negative".to_string()));
        }
        if round_amount(order.amount, self.config.amount_decimals) <= Decimal::ZERO {
            return Err(reject(format!(
                "amount {} is zero at {} decimals",
                order.amount, self.config.amount_decimals
            )));
        }
        if order.amount < self.config.min_order_amount {
            return Err(reject(format!(
                "amount {} below minimum {}",
                order.amount, self.config.min_order_amount
            )));
        }
        if self.orderbook.contains_order(&order.id) {
            return Err(reject("order is already resting".to_string()));
        }
        self.check_capacity(order)
    }

    /// Reject amounts whose notional or resting level total would not fit
    /// in a decimal. Every fill's quote amount is bounded by its maker's
    /// `price * amount`, so admitting only representable notionals keeps
    /// matching overflow-free.
    fn check_capacity(&self, order: &Order) -> Result<()> {
        let reject = |reason: &str| SpotmatchError::InvalidOrder {
            order_id: order.id,
            reason: format!("{reason} (price {}, amount {})", order.price, order.amount),
        };

        if order.price.checked_mul(order.amount).is_none() {
            return Err(reject("price * amount overflows"));
        }
        if order.is_resting_eligible() && !self.orderbook.can_rest(order) {
            return Err(reject("level total would overflow"));
        }
        Ok(())
    }

    /// Match `order` against the book and rest whatever the rules allow.
    ///
    /// `order` is updated in place: remaining amount, status, and (when it
    /// traded and rests) the waived gas fee. The returned flag reports
    /// whether any real trade happened.
    pub fn handle_new_order(&mut self, order: &mut Order) -> Result<(MatchResult, bool)> {
        self.validate_order(order)?;

        let mut result = MatchResult::default();

        if (self.crosses)(&self.orderbook, order) {
            result = self.orderbook.execute_match(order, &self.config)?;

            if result.match_items.is_empty() {
                tracing::error!(
                    market = %self.market,
                    order = %order.id,
                    price = %order.price,
                    amount = %order.amount,
                    "No match items for a crossing order"
                );
                return Err(FatalError::EmptyMatch {
                    market: self.market.clone(),
                    order_id: order.id,
                }
                .into());
            }

            for (item, event) in result.match_items.iter().zip(&result.book_events) {
                order.amount -= item.matched_amount;
                result
                    .orderbook_activities
                    .push(Message::order_update(&item.maker_order));
                result.orderbook_activities.push(Message::from_event(event));

                tracing::debug!(
                    market = %self.market,
                    maker = %item.maker_order.id,
                    price = %item.price,
                    amount = %item.matched_amount,
                    canceled = item.match_should_be_canceled,
                    "Take liquidity"
                );
            }
        }

        let matched = result.base_token_total_matched_amt_without_canceled_match();
        let remainder_is_dust = round_amount(order.amount, self.config.amount_decimals).is_zero();
        let should_be_removed = remainder_is_dust || !order.is_resting_eligible();

        order.status = match (should_be_removed, matched > Decimal::ZERO) {
            _ if order.amount.is_zero() => OrderStatus::FullFilled,
            (true, true) if remainder_is_dust => OrderStatus::FullFilled,
            (true, _) => OrderStatus::Canceled,
            (false, true) => OrderStatus::PartialFilled,
            (false, false) => OrderStatus::Pending,
        };
        if !should_be_removed && matched > Decimal::ZERO {
            // Gas was charged on the trade; the resting remainder rides free.
            order.gas_fee_amount = Decimal::ZERO;
        }
        order.updated_at = Utc::now();

        result.orderbook_activities.push(Message::order_update(order));

        if should_be_removed {
            result.taker_order_is_done = true;
        } else if let Some(event) = self.orderbook.insert_order(order) {
            result.orderbook_activities.push(Message::from_event(&event));
            tracing::debug!(
                market = %self.market,
                order = %order.id,
                price = %order.price,
                amount = %order.amount,
                "Make liquidity"
            );
        } else {
            tracing::warn!(
                market = %self.market,
                order = %order.id,
                "Remainder was not inserted"
            );
        }

        result.taker_order_left_amount = order.amount;
        result.taker_order = Some(order.clone());
        let has_match = result.exist_match_to_be_executed();
        Ok((result, has_match))
    }

    /// Remove a resting order. `None` when it is no longer on the book.
    pub fn handle_cancel_order(&mut self, order: &Order) -> Option<OrderbookEvent> {
        self.orderbook.remove_order(order)
    }

    /// Rest `order` directly, without matching. Used to rebuild books.
    ///
    /// `Ok(None)` when nothing was inserted (non-positive amount or already
    /// resting). Orders that could not be matched or summed safely are
    /// rejected.
    pub fn reinsert_order(&mut self, order: &Order) -> Result<Option<OrderbookEvent>> {
        if order.market_id != self.market {
            return Err(SpotmatchError::InvalidOrder {
                order_id: order.id,
                reason: format!(
                    "order is for market {}, handler serves {}",
                    order.market_id, self.market
                ),
            });
        }
        self.check_capacity(order)?;
        Ok(self.orderbook.insert_order(order))
    }
}

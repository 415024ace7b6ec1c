//! Continuous price/time-priority matching against a resting book.
//!
//! An incoming (taker) order walks the opposite side best price first and,
//! within a level, oldest order first. Every maker touched is one book
//! mutation: it is either reduced in place or removed, and the sequence
//! advances once for it.
//!
//! Amounts are exact decimals. Fill amounts are truncated toward zero at the
//! market's `amount_decimals`; quote amounts and fees are rounded half away
//! from zero at `quote_decimals`.
//!
//! The taker itself is never mutated here; applying fills to it is the
//! caller's job.

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use spotmatch_types::{FatalError, MarketConfig, MatchItem, MatchResult, Order, OrderStatus};

use crate::OrderBook;

/// Truncate a base amount to the market's precision.
#[must_use]
pub fn round_amount(amount: Decimal, decimals: u32) -> Decimal {
    amount.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
}

/// Round a quote amount or fee to the market's quote precision.
#[must_use]
pub fn round_quote(amount: Decimal, decimals: u32) -> Decimal {
    amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

impl OrderBook {
    /// Whether `order` crosses at least one resting order on the other side.
    #[must_use]
    pub fn can_match(&self, order: &Order) -> bool {
        self.best_price(order.side.opposite())
            .is_some_and(|price| order.crosses(price))
    }

    /// Match `taker` against the opposite side.
    ///
    /// Stops when the taker's remainder rounds to zero, the opposite side
    /// runs out, or the best opposite price no longer crosses. Makers whose
    /// own remainder rounds to zero (dust) are dropped and reported with
    /// `match_should_be_canceled`.
    ///
    /// Callers check [`OrderBook::can_match`] first; an empty result under
    /// that precondition means the book is corrupt. A quote amount or fee
    /// that does not fit is reported before the maker it belongs to is
    /// touched.
    pub fn execute_match(
        &mut self,
        taker: &Order,
        config: &MarketConfig,
    ) -> Result<MatchResult, FatalError> {
        let maker_side = taker.side.opposite();
        let mut remaining = round_amount(taker.amount, config.amount_decimals);
        let mut result = MatchResult::default();

        while remaining > Decimal::ZERO {
            let Some(price) = self.best_price(maker_side) else {
                break;
            };
            if !taker.crosses(price) {
                break;
            }
            let Some(level) = self.level_mut(maker_side, price) else {
                break;
            };
            let Some(head) = level.head() else {
                break;
            };

            let maker_id = head.id;
            let maker_amount = round_amount(head.amount, config.amount_decimals);
            let now = Utc::now();

            let item = if maker_amount.is_zero() {
                let Some(mut maker) = level.pop_head() else {
                    break;
                };
                maker.status = OrderStatus::Canceled;
                maker.updated_at = now;
                MatchItem {
                    maker_order: maker,
                    maker_order_is_done: true,
                    price,
                    matched_amount: Decimal::ZERO,
                    quote_amount: Decimal::ZERO,
                    maker_fee: Decimal::ZERO,
                    taker_fee: Decimal::ZERO,
                    match_should_be_canceled: true,
                }
            } else {
                let matched = remaining.min(maker_amount);
                let Some((quote_amount, maker_fee, taker_fee)) = price_fill(price, matched, config)
                else {
                    return Err(FatalError::QuoteOverflow {
                        market: self.market.clone(),
                        maker_id,
                    });
                };

                let Some(maker) = level.fill_head(matched) else {
                    break;
                };
                maker.updated_at = now;
                let done = maker.amount.is_zero();
                maker.status = if done {
                    OrderStatus::FullFilled
                } else {
                    OrderStatus::PartialFilled
                };
                let maker_order = maker.clone();
                if done {
                    level.pop_head();
                }
                remaining -= matched;

                MatchItem {
                    maker_order,
                    maker_order_is_done: done,
                    price,
                    matched_amount: matched,
                    quote_amount,
                    maker_fee,
                    taker_fee,
                    match_should_be_canceled: false,
                }
            };

            if item.maker_order_is_done {
                let emptied = level.is_empty();
                self.forget(&item.maker_order.id);
                if emptied {
                    self.remove_level(maker_side, price);
                }
            }

            if item.match_should_be_canceled {
                tracing::debug!(
                    market = %self.market,
                    maker = %maker_id,
                    amount = %item.maker_order.amount,
                    "Dust maker dropped"
                );
            }

            let event = self.commit(maker_side, price);
            result.book_events.push(event);
            result.match_items.push(item);
        }

        Ok(result)
    }
}

/// Quote amount and both fees for one fill, or `None` if any overflows.
fn price_fill(
    price: Decimal,
    matched: Decimal,
    config: &MarketConfig,
) -> Option<(Decimal, Decimal, Decimal)> {
    let quote = round_quote(price.checked_mul(matched)?, config.quote_decimals);
    let maker_fee = round_quote(quote.checked_mul(config.maker_fee_rate)?, config.quote_decimals);
    let taker_fee = round_quote(quote.checked_mul(config.taker_fee_rate)?, config.quote_decimals);
    Some((quote, maker_fee, taker_fee))
}

//! Results of matching one incoming order against a book.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Message, Order, OrderbookEvent};

/// One taker-fragment / maker-order pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchItem {
    /// Maker state after this fill was applied.
    pub maker_order: Order,
    /// The maker left the book with this fill.
    pub maker_order_is_done: bool,
    /// Execution price (the maker's price).
    pub price: Decimal,
    pub matched_amount: Decimal,
    /// `price * matched_amount` at quote precision.
    pub quote_amount: Decimal,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    /// The maker was dust and got dropped instead of trading.
    pub match_should_be_canceled: bool,
}

/// Everything one new order produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Taker state once handling finished.
    pub taker_order: Option<Order>,
    pub taker_order_is_done: bool,
    pub match_items: Vec<MatchItem>,
    pub taker_order_left_amount: Decimal,
    /// Outbound notifications, in the order they must be published.
    pub orderbook_activities: Vec<Message>,
    /// Book events raised by the fills, one per maker touched.
    pub book_events: Vec<OrderbookEvent>,
}

impl MatchResult {
    /// Matched base amount, ignoring dust matches that were canceled.
    #[must_use]
    pub fn base_token_total_matched_amt_without_canceled_match(&self) -> Decimal {
        self.executable_items().map(|i| i.matched_amount).sum()
    }

    #[must_use]
    pub fn quote_token_total_matched_amt(&self) -> Decimal {
        self.executable_items().map(|i| i.quote_amount).sum()
    }

    #[must_use]
    pub fn total_maker_fees(&self) -> Decimal {
        self.executable_items().map(|i| i.maker_fee).sum()
    }

    #[must_use]
    pub fn total_taker_fees(&self) -> Decimal {
        self.executable_items().map(|i| i.taker_fee).sum()
    }

    /// At least one item is a real trade that needs settling.
    #[must_use]
    pub fn exist_match_to_be_executed(&self) -> bool {
        self.executable_items().next().is_some()
    }

    fn executable_items(&self) -> impl Iterator<Item = &MatchItem> {
        self.match_items
            .iter()
            .filter(|i| !i.match_should_be_canceled)
    }
}

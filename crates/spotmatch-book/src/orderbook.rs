//! The order book for a single market.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **Bids** (buys): `BTreeMap<Reverse<Decimal>, PriceLevel>` -- highest price first
//! - **Asks** (sells): `BTreeMap<Decimal, PriceLevel>` -- lowest price first
//!
//! An auxiliary `HashMap<OrderId, (Side, Price)>` enables O(log N) removal.
//!
//! Every successful mutation produces an [`OrderbookEvent`] and runs the
//! post-mutation hook fixed at construction, which advances the book's
//! sequence number.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use spotmatch_types::{LevelAmount, MarketId, Order, OrderId, OrderSide, OrderbookEvent, Snapshot};

use crate::price_level::PriceLevel;

/// Runs after every successful mutation with the book's sequence counter.
pub type SequenceHook = fn(&mut u64, &OrderbookEvent);

/// The default hook: one mutation, one sequence step.
pub fn advance_sequence(sequence: &mut u64, _event: &OrderbookEvent) {
    *sequence += 1;
}

/// The order book for a single market.
#[derive(Debug)]
pub struct OrderBook {
    pub market: MarketId,
    /// Buy side: highest price first (`Reverse` key).
    bids: BTreeMap<Reverse<Decimal>, PriceLevel>,
    /// Sell side: lowest price first.
    asks: BTreeMap<Decimal, PriceLevel>,
    /// Fast lookup: `OrderId -> (side, price)` for removal.
    index: HashMap<OrderId, (OrderSide, Decimal)>,
    sequence: u64,
    on_mutation: SequenceHook,
}

impl OrderBook {
    /// Create an empty book whose sequence advances by one per mutation.
    #[must_use]
    pub fn new(market: MarketId) -> Self {
        Self::with_hook(market, advance_sequence)
    }

    /// Create an empty book with a custom post-mutation hook.
    #[must_use]
    pub fn with_hook(market: MarketId, on_mutation: SequenceHook) -> Self {
        Self {
            market,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            sequence: 0,
            on_mutation,
        }
    }

    /// Number of mutations applied so far.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Rest `order`'s remaining amount at its price.
    ///
    /// Returns `None` without touching the book when the remaining amount is
    /// not positive or the order is already resting.
    pub fn insert_order(&mut self, order: &Order) -> Option<OrderbookEvent> {
        if order.amount <= Decimal::ZERO {
            return None;
        }
        if self.index.contains_key(&order.id) {
            tracing::warn!(
                market = %self.market,
                order = %order.id,
                "Duplicate insert ignored: order already resting"
            );
            return None;
        }
        if !self.can_rest(order) {
            tracing::warn!(
                market = %self.market,
                order = %order.id,
                price = %order.price,
                amount = %order.amount,
                "Insert ignored: level total would overflow"
            );
            return None;
        }

        let price = order.price;
        let level = match order.side {
            OrderSide::Buy => self
                .bids
                .entry(Reverse(price))
                .or_insert_with(|| PriceLevel::new(price)),
            OrderSide::Sell => self
                .asks
                .entry(price)
                .or_insert_with(|| PriceLevel::new(price)),
        };
        let queued = level.enqueue(order.clone());
        debug_assert!(queued, "can_rest admitted an order the level refused");
        self.index.insert(order.id, (order.side, price));

        Some(self.commit(order.side, price))
    }

    /// Whether `order`'s remaining amount can join its price level without
    /// overflowing the level total.
    #[must_use]
    pub fn can_rest(&self, order: &Order) -> bool {
        self.level(order.side, order.price)
            .is_none_or(|level| level.can_absorb(order.amount))
    }

    // =================================================================
    // Removal
    // =================================================================

    /// Remove the resting order with `order`'s ID.
    ///
    /// Not finding it (already filled or removed) is a normal outcome and
    /// yields `None` with the sequence untouched.
    pub fn remove_order(&mut self, order: &Order) -> Option<OrderbookEvent> {
        let (side, price) = self.index.remove(&order.id)?;
        let level = self.level_mut(side, price)?;
        level.remove(&order.id)?;
        if level.is_empty() {
            self.remove_level(side, price);
        }
        Some(self.commit(side, price))
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Best price on `side`.
    #[must_use]
    pub fn best_price(&self, side: OrderSide) -> Option<Decimal> {
        match side {
            OrderSide::Buy => self.best_bid(),
            OrderSide::Sell => self.best_ask(),
        }
    }

    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Aggregate amount resting at `price` on `side` (zero if no level).
    #[must_use]
    pub fn level_amount(&self, side: OrderSide, price: Decimal) -> Decimal {
        self.level(side, price)
            .map_or(Decimal::ZERO, PriceLevel::total_amount)
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn contains_order(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// The resting copy of an order.
    #[must_use]
    pub fn get_order(&self, order_id: &OrderId) -> Option<&Order> {
        let &(side, price) = self.index.get(order_id)?;
        self.level(side, price)?.find(order_id)
    }

    /// Iterate bid levels from best (highest) to worst.
    pub fn bid_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.bids.values()
    }

    /// Iterate ask levels from best (lowest) to worst.
    pub fn ask_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.asks.values()
    }

    /// Aggregated per-level amounts for both sides, best-first.
    ///
    /// The sequence is left at zero; the publisher stamps it.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let aggregate = |level: &PriceLevel| LevelAmount {
            price: level.price,
            amount: level.total_amount(),
        };
        Snapshot {
            sequence: 0,
            bids: self.bid_levels().map(aggregate).collect(),
            asks: self.ask_levels().map(aggregate).collect(),
        }
    }

    // =================================================================
    // Internals shared with the matcher
    // =================================================================

    fn level(&self, side: OrderSide, price: Decimal) -> Option<&PriceLevel> {
        match side {
            OrderSide::Buy => self.bids.get(&Reverse(price)),
            OrderSide::Sell => self.asks.get(&price),
        }
    }

    pub(crate) fn level_mut(&mut self, side: OrderSide, price: Decimal) -> Option<&mut PriceLevel> {
        match side {
            OrderSide::Buy => self.bids.get_mut(&Reverse(price)),
            OrderSide::Sell => self.asks.get_mut(&price),
        }
    }

    pub(crate) fn remove_level(&mut self, side: OrderSide, price: Decimal) {
        match side {
            OrderSide::Buy => self.bids.remove(&Reverse(price)),
            OrderSide::Sell => self.asks.remove(&price),
        };
    }

    pub(crate) fn forget(&mut self, order_id: &OrderId) {
        self.index.remove(order_id);
    }

    /// Count a mutation at `(side, price)` and describe the level after it.
    pub(crate) fn commit(&mut self, side: OrderSide, price: Decimal) -> OrderbookEvent {
        let mut event = OrderbookEvent {
            market_id: self.market.clone(),
            side,
            price,
            amount: self.level_amount(side, price),
            sequence: self.sequence,
        };
        (self.on_mutation)(&mut self.sequence, &event);
        event.sequence = self.sequence;
        event
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use spotmatch_types::*;

    use super::*;

    fn book() -> OrderBook {
        OrderBook::new(MarketId::new("ETH-BTC"))
    }

    fn make_order(side: OrderSide, price: i64, amount: i64) -> Order {
        Order::dummy_limit(side, Decimal::new(price, 0), Decimal::new(amount, 0))
    }

    #[test]
    fn insert_and_query_best_bid_ask() {
        let mut book = book();
        book.insert_order(&make_order(OrderSide::Buy, 100, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Buy, 99, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Sell, 101, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Sell, 102, 1)).unwrap();

        assert_eq!(book.best_bid(), Some(Decimal::new(100, 0)));
        assert_eq!(book.best_ask(), Some(Decimal::new(101, 0)));
        assert_eq!(book.spread(), Some(Decimal::ONE));
        assert_eq!(book.order_count(), 4);
        assert_eq!(book.sequence(), 4);
    }

    #[test]
    fn insert_event_reports_level_aggregate() {
        let mut book = book();
        let first = book.insert_order(&make_order(OrderSide::Sell, 100, 5)).unwrap();
        assert_eq!(first.amount, Decimal::new(5, 0));
        assert_eq!(first.sequence, 1);

        let second = book.insert_order(&make_order(OrderSide::Sell, 100, 2)).unwrap();
        assert_eq!(second.side, OrderSide::Sell);
        assert_eq!(second.price, Decimal::new(100, 0));
        assert_eq!(second.amount, Decimal::new(7, 0));
        assert_eq!(second.sequence, 2);
    }

    #[test]
    fn insert_non_positive_amount_is_noop() {
        let mut book = book();
        let mut order = make_order(OrderSide::Buy, 100, 1);
        order.amount = Decimal::ZERO;
        assert!(book.insert_order(&order).is_none());
        order.amount = Decimal::new(-1, 0);
        assert!(book.insert_order(&order).is_none());
        assert_eq!(book.sequence(), 0);
        assert!(book.is_empty());
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut book = book();
        let order = make_order(OrderSide::Buy, 100, 1);
        assert!(book.insert_order(&order).is_some());
        assert!(book.insert_order(&order).is_none());
        assert_eq!(book.order_count(), 1);
        assert_eq!(book.sequence(), 1);
    }

    #[test]
    fn remove_order_removes_from_book() {
        let mut book = book();
        let order = make_order(OrderSide::Buy, 100, 1);
        book.insert_order(&order).unwrap();

        let event = book.remove_order(&order).unwrap();
        assert_eq!(event.amount, Decimal::ZERO);
        assert_eq!(event.sequence, 2);
        assert!(book.is_empty());
        assert_eq!(book.bid_depth(), 0);
    }

    #[test]
    fn remove_twice_is_idempotent() {
        let mut book = book();
        let order = make_order(OrderSide::Sell, 100, 3);
        book.insert_order(&order).unwrap();

        assert!(book.remove_order(&order).is_some());
        let seq = book.sequence();
        assert!(book.remove_order(&order).is_none());
        assert_eq!(book.sequence(), seq, "no-op removal must not advance sequence");
    }

    #[test]
    fn remove_keeps_level_with_other_orders() {
        let mut book = book();
        let a = make_order(OrderSide::Sell, 100, 3);
        let b = make_order(OrderSide::Sell, 100, 4);
        book.insert_order(&a).unwrap();
        book.insert_order(&b).unwrap();

        let event = book.remove_order(&a).unwrap();
        assert_eq!(event.amount, Decimal::new(4, 0));
        assert_eq!(book.ask_depth(), 1);
        assert!(book.contains_order(&b.id));
        assert!(!book.contains_order(&a.id));
    }

    #[test]
    fn bid_levels_iterate_highest_first() {
        let mut book = book();
        book.insert_order(&make_order(OrderSide::Buy, 90, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Buy, 100, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Buy, 95, 1)).unwrap();

        let prices: Vec<Decimal> = book.bid_levels().map(|l| l.price).collect();
        assert_eq!(
            prices,
            vec![Decimal::new(100, 0), Decimal::new(95, 0), Decimal::new(90, 0)]
        );
    }

    #[test]
    fn ask_levels_iterate_lowest_first() {
        let mut book = book();
        book.insert_order(&make_order(OrderSide::Sell, 110, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Sell, 101, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Sell, 105, 1)).unwrap();

        let prices: Vec<Decimal> = book.ask_levels().map(|l| l.price).collect();
        assert_eq!(
            prices,
            vec![Decimal::new(101, 0), Decimal::new(105, 0), Decimal::new(110, 0)]
        );
    }

    #[test]
    fn snapshot_aggregates_levels() {
        let mut book = book();
        book.insert_order(&make_order(OrderSide::Buy, 99, 2)).unwrap();
        book.insert_order(&make_order(OrderSide::Buy, 99, 3)).unwrap();
        book.insert_order(&make_order(OrderSide::Buy, 98, 1)).unwrap();
        book.insert_order(&make_order(OrderSide::Sell, 101, 4)).unwrap();

        let snap = book.snapshot();
        assert_eq!(snap.sequence, 0, "book leaves stamping to the caller");
        assert_eq!(
            snap.bids,
            vec![
                LevelAmount { price: Decimal::new(99, 0), amount: Decimal::new(5, 0) },
                LevelAmount { price: Decimal::new(98, 0), amount: Decimal::ONE },
            ]
        );
        assert_eq!(
            snap.asks,
            vec![LevelAmount { price: Decimal::new(101, 0), amount: Decimal::new(4, 0) }]
        );
    }

    #[test]
    fn custom_hook_is_used() {
        fn by_ten(sequence: &mut u64, _event: &OrderbookEvent) {
            *sequence += 10;
        }
        let mut book = OrderBook::with_hook(MarketId::new("ETH-BTC"), by_ten);
        let event = book.insert_order(&make_order(OrderSide::Buy, 100, 1)).unwrap();
        assert_eq!(event.sequence, 10);
        assert_eq!(book.sequence(), 10);
    }

    #[test]
    fn get_order_returns_resting_copy() {
        let mut book = book();
        let order = make_order(OrderSide::Buy, 100, 2);
        book.insert_order(&order).unwrap();
        assert_eq!(book.get_order(&order.id).unwrap().amount, Decimal::new(2, 0));
        assert!(book.get_order(&OrderId::new()).is_none());
    }

    #[test]
    fn empty_book() {
        let book = book();
        assert!(book.is_empty());
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
        assert!(book.snapshot().is_empty());
    }

    #[test]
    fn overflowing_insert_leaves_book_untouched() {
        let mut book = book();
        let big = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let mut first = make_order(OrderSide::Sell, 1, 1);
        first.amount = big;
        let mut second = make_order(OrderSide::Sell, 1, 1);
        second.amount = big;

        book.insert_order(&first).unwrap();
        assert!(!book.can_rest(&second));
        assert!(book.insert_order(&second).is_none());

        assert_eq!(book.sequence(), 1);
        assert!(!book.contains_order(&second.id));
        assert_eq!(book.level_amount(OrderSide::Sell, Decimal::ONE), big);
        assert_eq!(book.snapshot().asks.len(), 1);

        // A different level is unaffected.
        assert!(book.insert_order(&make_order(OrderSide::Sell, 2, 1)).is_some());
        assert_eq!(book.sequence(), 2);
    }
}

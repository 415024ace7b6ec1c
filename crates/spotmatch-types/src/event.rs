//! Book mutation events and aggregated snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MarketId, OrderSide};

/// Emitted by every successful book mutation.
///
/// `amount` is the aggregate resting amount left at `price` after the
/// mutation (zero when the level disappeared). `sequence` is the book's
/// sequence number once the mutation has been counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookEvent {
    pub market_id: MarketId,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
    pub sequence: u64,
}

/// Aggregate amount resting at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAmount {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Point-in-time view of every price level of a market.
///
/// Both sides are ordered best-first: bids descending, asks ascending.
/// The book leaves `sequence` at zero; whoever publishes the snapshot stamps
/// the current book sequence onto it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: u64,
    pub bids: Vec<LevelAmount>,
    pub asks: Vec<LevelAmount>,
}

impl Snapshot {
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<&LevelAmount> {
        self.bids.first()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&LevelAmount> {
        self.asks.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Apply an orderbook change to this snapshot, as an observer replaying
    /// notifications would. A zero amount deletes the level.
    pub fn apply(&mut self, side: OrderSide, price: Decimal, amount: Decimal, sequence: u64) {
        let levels = match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };
        let position = levels.iter().position(|l| l.price == price);
        match (position, amount.is_zero()) {
            (Some(i), true) => {
                levels.remove(i);
            }
            (Some(i), false) => levels[i].amount = amount,
            (None, true) => {}
            (None, false) => {
                let at = match side {
                    OrderSide::Buy => levels.partition_point(|l| l.price > price),
                    OrderSide::Sell => levels.partition_point(|l| l.price < price),
                };
                levels.insert(at, LevelAmount { price, amount });
            }
        }
        self.sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: i64, amount: i64) -> LevelAmount {
        LevelAmount {
            price: Decimal::new(price, 0),
            amount: Decimal::new(amount, 0),
        }
    }

    #[test]
    fn apply_keeps_levels_best_first() {
        let mut snap = Snapshot::default();
        snap.apply(OrderSide::Buy, Decimal::new(99, 0), Decimal::ONE, 1);
        snap.apply(OrderSide::Buy, Decimal::new(101, 0), Decimal::ONE, 2);
        snap.apply(OrderSide::Buy, Decimal::new(100, 0), Decimal::ONE, 3);
        snap.apply(OrderSide::Sell, Decimal::new(105, 0), Decimal::ONE, 4);
        snap.apply(OrderSide::Sell, Decimal::new(103, 0), Decimal::ONE, 5);

        assert_eq!(snap.bids, vec![level(101, 1), level(100, 1), level(99, 1)]);
        assert_eq!(snap.asks, vec![level(103, 1), level(105, 1)]);
        assert_eq!(snap.sequence, 5);
    }

    #[test]
    fn apply_zero_amount_removes_level() {
        let mut snap = Snapshot::default();
        snap.apply(OrderSide::Sell, Decimal::new(100, 0), Decimal::new(5, 0), 1);
        snap.apply(OrderSide::Sell, Decimal::new(100, 0), Decimal::new(2, 0), 2);
        assert_eq!(snap.best_ask(), Some(&level(100, 2)));

        snap.apply(OrderSide::Sell, Decimal::new(100, 0), Decimal::ZERO, 3);
        assert!(snap.is_empty());
    }

    #[test]
    fn with_sequence_stamps() {
        let snap = Snapshot::default().with_sequence(7);
        assert_eq!(snap.sequence, 7);
        assert!(snap.best_bid().is_none());
    }
}

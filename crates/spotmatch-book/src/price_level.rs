//! Resting orders at one price, oldest first.
//!
//! The level keeps a running total of its remaining amounts. Every change to
//! a resting amount goes through the level so the total never has to be
//! re-summed, and an order is only admitted when the new total is
//! representable.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use spotmatch_types::{Order, OrderId};

#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: Decimal,
    queue: VecDeque<Order>,
    total: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            queue: VecDeque::new(),
            total: Decimal::ZERO,
        }
    }

    /// Sum of the remaining amounts at this price.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.total
    }

    /// Whether `amount` more can rest here without overflowing the total.
    #[must_use]
    pub fn can_absorb(&self, amount: Decimal) -> bool {
        self.total.checked_add(amount).is_some()
    }

    /// Queue `order` behind everything already resting.
    ///
    /// Returns `false` and leaves the level unchanged when the total would
    /// overflow.
    #[must_use]
    pub fn enqueue(&mut self, order: Order) -> bool {
        let Some(total) = self.total.checked_add(order.amount) else {
            return false;
        };
        self.total = total;
        self.queue.push_back(order);
        true
    }

    /// The order next in line.
    #[must_use]
    pub fn head(&self) -> Option<&Order> {
        self.queue.front()
    }

    /// Take `amount` off the head order and hand it back for status updates.
    ///
    /// `amount` must not exceed the head's remaining amount.
    pub(crate) fn fill_head(&mut self, amount: Decimal) -> Option<&mut Order> {
        let head = self.queue.front_mut()?;
        debug_assert!(amount <= head.amount);
        head.amount -= amount;
        self.total -= amount;
        Some(head)
    }

    /// Drop the head order, whatever it has left.
    pub(crate) fn pop_head(&mut self) -> Option<Order> {
        let order = self.queue.pop_front()?;
        self.total -= order.amount;
        Some(order)
    }

    pub(crate) fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let pos = self.queue.iter().position(|o| o.id == *order_id)?;
        let order = self.queue.remove(pos)?;
        self.total -= order.amount;
        Some(order)
    }

    #[must_use]
    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.queue.iter().find(|o| o.id == *order_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

//! Outbound notification messages.
//!
//! A [`Message`] is a plain value: a channel name plus a payload. Order
//! updates go to the trader's channel, orderbook changes to the market's.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, MarketId, Order, OrderId, OrderSide, OrderStatus, OrderType, OrderbookEvent};

/// State of an order after a mutation touched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub market_id: MarketId,
    pub trader: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    pub status: OrderStatus,
    /// Original amount of the order.
    pub amount: Decimal,
    /// Amount still open.
    pub available_amount: Decimal,
    pub filled_amount: Decimal,
    pub gas_fee_amount: Decimal,
}

/// Resulting aggregate amount at one level of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookChange {
    pub market_id: MarketId,
    pub sequence: u64,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    OrderUpdate(OrderUpdate),
    OrderbookChange(OrderbookChange),
}

/// A notification addressed to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub channel: String,
    pub payload: MessagePayload,
}

impl Message {
    /// Order-update notification for `order`'s current state.
    #[must_use]
    pub fn order_update(order: &Order) -> Self {
        Self {
            channel: trader_channel(&order.trader),
            payload: MessagePayload::OrderUpdate(OrderUpdate {
                order_id: order.id,
                market_id: order.market_id.clone(),
                trader: order.trader.clone(),
                side: order.side,
                order_type: order.order_type,
                price: order.price,
                status: order.status,
                amount: order.original_amount,
                available_amount: order.amount,
                filled_amount: order.filled_amount(),
                gas_fee_amount: order.gas_fee_amount,
            }),
        }
    }

    /// Orderbook-change notification with explicit fields.
    #[must_use]
    pub fn orderbook_change(
        market_id: &MarketId,
        sequence: u64,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            channel: market_channel(market_id),
            payload: MessagePayload::OrderbookChange(OrderbookChange {
                market_id: market_id.clone(),
                sequence,
                side,
                price,
                amount,
            }),
        }
    }

    /// Orderbook-change notification built from a book event.
    #[must_use]
    pub fn from_event(event: &OrderbookEvent) -> Self {
        Self::orderbook_change(
            &event.market_id,
            event.sequence,
            event.side,
            event.price,
            event.amount,
        )
    }

    #[must_use]
    pub fn as_order_update(&self) -> Option<&OrderUpdate> {
        match &self.payload {
            MessagePayload::OrderUpdate(update) => Some(update),
            MessagePayload::OrderbookChange(_) => None,
        }
    }

    #[must_use]
    pub fn as_orderbook_change(&self) -> Option<&OrderbookChange> {
        match &self.payload {
            MessagePayload::OrderbookChange(change) => Some(change),
            MessagePayload::OrderUpdate(_) => None,
        }
    }
}

#[must_use]
pub fn market_channel(market_id: &MarketId) -> String {
    format!("{}{market_id}", constants::MARKET_CHANNEL_PREFIX)
}

#[must_use]
pub fn trader_channel(trader: &str) -> String {
    format!("{}{trader}", constants::TRADER_CHANNEL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_update_carries_fill_metadata() {
        let mut order =
            Order::dummy_limit(OrderSide::Buy, Decimal::new(100, 0), Decimal::new(5, 0));
        order.amount = Decimal::new(2, 0);
        order.status = OrderStatus::PartialFilled;

        let msg = Message::order_update(&order);
        assert_eq!(msg.channel, "TraderAddress#0xtrader");
        let update = msg.as_order_update().unwrap();
        assert_eq!(update.order_id, order.id);
        assert_eq!(update.status, OrderStatus::PartialFilled);
        assert_eq!(update.amount, Decimal::new(5, 0));
        assert_eq!(update.available_amount, Decimal::new(2, 0));
        assert_eq!(update.filled_amount, Decimal::new(3, 0));
        assert!(msg.as_orderbook_change().is_none());
    }

    #[test]
    fn orderbook_change_goes_to_market_channel() {
        let event = OrderbookEvent {
            market_id: MarketId::new("ETH-BTC"),
            side: OrderSide::Sell,
            price: Decimal::new(100, 0),
            amount: Decimal::new(2, 0),
            sequence: 9,
        };
        let msg = Message::from_event(&event);
        assert_eq!(msg.channel, "Market#ETH-BTC");
        let change = msg.as_orderbook_change().unwrap();
        assert_eq!(change.sequence, 9);
        assert_eq!(change.amount, Decimal::new(2, 0));
    }

    #[test]
    fn payload_is_tagged_on_the_wire() {
        let msg = Message::orderbook_change(
            &MarketId::new("ETH-BTC"),
            1,
            OrderSide::Buy,
            Decimal::new(100, 0),
            Decimal::ONE,
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["type"], "orderbook_change");
        assert_eq!(json["payload"]["side"], "buy");
        assert_eq!(json["payload"]["market_id"], "ETH-BTC");
    }
}

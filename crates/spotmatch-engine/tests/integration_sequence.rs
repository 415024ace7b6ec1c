//! Integration test: sequence accounting and observer replay.
//!
//! Every book mutation advances its market's sequence by exactly one and is
//! announced by exactly one orderbook-change message. An observer that
//! applies those messages in order ends up with the engine's snapshot.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use spotmatch_book::snapshot_digest_hex;
use spotmatch_engine::{ChannelSink, Engine};
use spotmatch_types::*;

const MARKETS: [&str; 3] = ["ETH-BTC", "DAI-ETH", "SOL-USDC"];

#[derive(Default)]
struct Observer {
    books: HashMap<MarketId, Snapshot>,
    changes: HashMap<MarketId, Vec<u64>>,
}

impl Observer {
    fn apply(&mut self, message: &Message) {
        let Some(change) = message.as_orderbook_change() else {
            return;
        };
        assert_eq!(message.channel, market_channel(&change.market_id));
        self.books.entry(change.market_id.clone()).or_default().apply(
            change.side,
            change.price,
            change.amount,
            change.sequence,
        );
        self.changes
            .entry(change.market_id.clone())
            .or_default()
            .push(change.sequence);
    }
}

fn random_order(rng: &mut StdRng) -> Order {
    let market = MARKETS[rng.gen_range(0..MARKETS.len())];
    let side = if rng.gen_bool(0.5) {
        OrderSide::Buy
    } else {
        OrderSide::Sell
    };
    let price = Decimal::new(rng.gen_range(95..=105), 0);
    // Up to three decimals so some fills leave fractional remainders.
    let amount = Decimal::new(rng.gen_range(1..=5_000), 3);

    let mut order = if rng.gen_ratio(1, 10) {
        let mut order = Order::dummy_market(side, amount);
        order.market_id = MarketId::new(market);
        order
    } else {
        Order::dummy_limit_in(market, side, price, amount)
    };
    if rng.gen_ratio(1, 10) {
        order.time_in_force = TimeInForce::Ioc;
    }
    order
}

#[test]
fn interleaved_markets_count_every_mutation() {
    let engine = Engine::default();
    let (activity, mut rx) = ChannelSink::<Vec<Message>>::new("activity");
    engine.register_activity_sink(activity);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut observer = Observer::default();
    let mut placed: Vec<Order> = Vec::new();

    for _ in 0..2_000 {
        if !placed.is_empty() && rng.gen_ratio(1, 5) {
            let victim = placed.swap_remove(rng.gen_range(0..placed.len()));
            let (msg, removed) = engine.handle_cancel_order(&victim).unwrap();
            assert_eq!(msg.is_some(), removed);
            if let Some(msg) = msg {
                observer.apply(&msg);
            }
            continue;
        }

        let mut order = random_order(&mut rng);
        let (result, has_match) = engine.handle_new_order(&mut order).unwrap();
        assert_eq!(has_match, result.exist_match_to_be_executed());
        assert_eq!(result.match_items.len(), result.book_events.len());

        let published = rx.try_recv().unwrap();
        assert_eq!(published, result.orderbook_activities);
        for msg in &published {
            observer.apply(msg);
        }

        if !result.taker_order_is_done {
            placed.push(order);
        }
    }

    for market in MARKETS.map(MarketId::new) {
        let sequence = engine.sequence(&market).unwrap();
        let seen = &observer.changes[&market];
        let expected: Vec<u64> = (1..=sequence).collect();
        assert_eq!(seen, &expected, "gap or repeat in {market}");

        let snapshot = engine.snapshot(&market).unwrap();
        let replayed = &observer.books[&market];
        assert_eq!(
            snapshot_digest_hex(&market, replayed),
            snapshot_digest_hex(&market, &snapshot),
            "replay diverged in {market}"
        );
    }
}

#[test]
fn reinserted_levels_rebuild_the_book() {
    let engine = Engine::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let mut order = random_order(&mut rng);
        engine.handle_new_order(&mut order).unwrap();
    }

    // Recovery rests one order per level with the level's aggregate amount.
    let recovered = Engine::default();
    for market in engine.markets() {
        let original = engine.snapshot(&market).unwrap();
        let levels = original
            .bids
            .iter()
            .map(|l| (OrderSide::Buy, l))
            .chain(original.asks.iter().map(|l| (OrderSide::Sell, l)));

        let mut inserted = 0_u64;
        for (side, level) in levels {
            let order = Order::dummy_limit_in(market.as_str(), side, level.price, level.amount);
            let msg = recovered.re_insert_order(&order).unwrap().unwrap();
            inserted += 1;
            assert_eq!(msg.as_orderbook_change().unwrap().sequence, inserted);
        }

        let rebuilt = recovered.snapshot(&market).unwrap_or_default();
        assert_eq!(rebuilt.bids, original.bids);
        assert_eq!(rebuilt.asks, original.asks);
    }
}

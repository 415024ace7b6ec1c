//! Integration test: many threads sharing one engine.
//!
//! The global lock serializes commands, so each market's sequence advances
//! without gaps and sinks observe changes in sequence order regardless of
//! which thread issued them.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use rust_decimal::Decimal;
use spotmatch_engine::{ChannelSink, Engine, SnapshotUpdate};
use spotmatch_types::*;

const THREADS: usize = 8;
const ORDERS_PER_THREAD: usize = 250;

#[test]
fn concurrent_submitters_keep_sequences_consistent() {
    let engine = Arc::new(Engine::default());
    let (activity, mut activity_rx) = ChannelSink::<Vec<Message>>::new("activity");
    let (snapshots, mut snapshot_rx) = ChannelSink::<SnapshotUpdate>::new("snapshot");
    engine.register_activity_sink(activity);
    engine.register_snapshot_sink(snapshots);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let market = if t % 2 == 0 { "ETH-BTC" } else { "DAI-ETH" };
                let mut mutations = 0_usize;
                for i in 0..ORDERS_PER_THREAD {
                    let side = if (i + t) % 2 == 0 {
                        OrderSide::Buy
                    } else {
                        OrderSide::Sell
                    };
                    let price = Decimal::new(100 + (i % 5) as i64, 0);
                    let mut order =
                        Order::dummy_limit_in(market, side, price, Decimal::new(1 + (i % 3) as i64, 0));
                    let (result, _) = engine.handle_new_order(&mut order).unwrap();
                    mutations += result
                        .orderbook_activities
                        .iter()
                        .filter(|m| m.as_orderbook_change().is_some())
                        .count();

                    if i % 7 == 0 {
                        let (msg, removed) = engine.handle_cancel_order(&order).unwrap();
                        assert_eq!(msg.is_some(), removed);
                        mutations += usize::from(removed);
                    }
                }
                (MarketId::new(market), mutations)
            })
        })
        .collect();

    let mut expected: HashMap<MarketId, usize> = HashMap::new();
    for handle in handles {
        let (market, mutations) = handle.join().unwrap();
        *expected.entry(market).or_default() += mutations;
    }

    for (market, mutations) in &expected {
        assert_eq!(engine.sequence(market), Some(*mutations as u64));
    }

    // Activity batches arrive in lock order: per market, strictly increasing.
    let mut last: HashMap<MarketId, u64> = HashMap::new();
    while let Ok(batch) = activity_rx.try_recv() {
        for change in batch.iter().filter_map(Message::as_orderbook_change) {
            let prev = last.entry(change.market_id.clone()).or_default();
            assert!(change.sequence > *prev, "out of order in {}", change.market_id);
            *prev = change.sequence;
        }
    }

    // Snapshot deliveries never go backwards either; the last one is current.
    let mut latest: HashMap<String, u64> = HashMap::new();
    while let Ok(update) = snapshot_rx.try_recv() {
        let prev = latest.entry(update.key.clone()).or_default();
        assert!(update.snapshot.sequence >= *prev);
        *prev = update.snapshot.sequence;
    }
    for market in expected.keys() {
        let key = constants::snapshot_key(market);
        assert_eq!(Some(latest[&key]), engine.sequence(market));
    }
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
}

//! Outbound sinks.
//!
//! The engine calls each registered sink synchronously while it still holds
//! the global lock, so a sink must accept the delivery and return at once;
//! any real work (database writes, cache updates, fan-out to subscribers)
//! happens on the sink's own time. A failed delivery is logged and never
//! undoes the mutation that produced it.

use spotmatch_types::{MatchResult, Message, SinkError, Snapshot, constants};

use crate::MarketHandler;

/// Receives the result of every new order, for order and trade persistence.
pub trait PersistenceSink: Send + Sync {
    fn update(&self, result: &MatchResult) -> Result<(), SinkError>;
}

/// Receives the latest snapshot of a market after each book mutation.
///
/// `key` is the market's cache key; last write wins.
pub trait SnapshotSink: Send + Sync {
    fn update(&self, key: &str, snapshot: &Snapshot) -> Result<(), SinkError>;
}

/// Receives the ordered notifications produced by a new order. Order must be
/// preserved when publishing to subscribers.
pub trait ActivitySink: Send + Sync {
    fn update(&self, messages: &[Message]) -> Result<(), SinkError>;
}

/// The registered sinks. Missing entries are silent no-ops.
#[derive(Default)]
pub(crate) struct SinkSet {
    pub(crate) persistence: Option<Box<dyn PersistenceSink>>,
    pub(crate) snapshot: Option<Box<dyn SnapshotSink>>,
    pub(crate) activity: Option<Box<dyn ActivitySink>>,
}

impl SinkSet {
    pub(crate) fn persist(&self, result: &MatchResult) {
        let Some(sink) = &self.persistence else {
            return;
        };
        if let Err(err) = sink.update(result) {
            tracing::warn!(error = %err, "Persistence sink delivery failed");
        }
    }

    pub(crate) fn publish_snapshot(&self, handler: &MarketHandler) {
        let Some(sink) = &self.snapshot else {
            return;
        };
        let snapshot = handler.snapshot();
        let key = constants::snapshot_key(handler.market());
        if let Err(err) = sink.update(&key, &snapshot) {
            tracing::warn!(
                market = %handler.market(),
                sequence = snapshot.sequence,
                error = %err,
                "Snapshot sink delivery failed"
            );
        }
    }

    pub(crate) fn publish_activities(&self, messages: &[Message]) {
        let Some(sink) = &self.activity else {
            return;
        };
        if let Err(err) = sink.update(messages) {
            tracing::warn!(
                messages = messages.len(),
                error = %err,
                "Activity sink delivery failed"
            );
        }
    }
}

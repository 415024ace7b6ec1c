//! Sinks backed by unbounded tokio channels.
//!
//! `send` on an unbounded channel never waits, so the engine hands off the
//! delivery and returns while an async task drains the receiver. The only
//! failure is a dropped receiver.

use spotmatch_types::{MatchResult, Message, SinkError, Snapshot};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::sink::{ActivitySink, PersistenceSink, SnapshotSink};

/// A snapshot delivery: the market's cache key and its latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotUpdate {
    pub key: String,
    pub snapshot: Snapshot,
}

/// Forwards every delivery into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink<T> {
    name: &'static str,
    tx: UnboundedSender<T>,
}

impl<T> ChannelSink<T> {
    /// Create a sink and the receiver its deliveries arrive on.
    #[must_use]
    pub fn new(name: &'static str) -> (Self, UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { name, tx }, rx)
    }

    fn forward(&self, item: T) -> Result<(), SinkError> {
        self.tx
            .send(item)
            .map_err(|_| SinkError::new(self.name, "receiver dropped"))
    }
}

impl PersistenceSink for ChannelSink<MatchResult> {
    fn update(&self, result: &MatchResult) -> Result<(), SinkError> {
        self.forward(result.clone())
    }
}

impl SnapshotSink for ChannelSink<SnapshotUpdate> {
    fn update(&self, key: &str, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.forward(SnapshotUpdate {
            key: key.to_string(),
            snapshot: snapshot.clone(),
        })
    }
}

impl ActivitySink for ChannelSink<Vec<Message>> {
    fn update(&self, messages: &[Message]) -> Result<(), SinkError> {
        self.forward(messages.to_vec())
    }
}

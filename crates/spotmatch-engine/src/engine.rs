//! The market dispatcher.
//!
//! One [`parking_lot::Mutex`] guards every market handler and the sink
//! registrations, so all commands across all markets run one at a time and
//! sinks observe notifications in command order. Handlers are created on
//! first use and live for the life of the engine.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use spotmatch_types::{
    EngineConfig, FatalError, MarketId, MatchResult, Message, Order, Result, Snapshot,
    SpotmatchError,
};

use crate::MarketHandler;
use crate::sink::{ActivitySink, PersistenceSink, SinkSet, SnapshotSink};

#[derive(Default)]
struct EngineState {
    handlers: HashMap<MarketId, MarketHandler>,
    halted: HashSet<MarketId>,
    sinks: SinkSet,
}

impl EngineState {
    fn handler_or_create(
        &mut self,
        config: &EngineConfig,
        market: &MarketId,
    ) -> Result<&mut MarketHandler> {
        if self.halted.contains(market) {
            return Err(FatalError::MarketHalted(market.clone()).into());
        }
        match self.handlers.entry(market.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let handler = MarketHandler::new(config.market_config(market))?;
                tracing::info!(market = %market, "Market handler created");
                Ok(entry.insert(handler))
            }
        }
    }

    fn handler(&mut self, market: &MarketId) -> Result<&mut MarketHandler> {
        if self.halted.contains(market) {
            return Err(FatalError::MarketHalted(market.clone()).into());
        }
        self.handlers
            .get_mut(market)
            .ok_or_else(|| FatalError::MarketNotFound(market.clone()).into())
    }

    /// Log a fatal error and quarantine its market when configured to.
    fn on_error(&mut self, config: &EngineConfig, market: &MarketId, err: &SpotmatchError) {
        let Some(fatal) = err.as_fatal() else {
            return;
        };
        tracing::error!(market = %market, error = %fatal, "Fatal engine error");
        if config.halt_market_on_fatal
            && !matches!(fatal, FatalError::MarketHalted(_) | FatalError::MarketNotFound(_))
            && self.halted.insert(market.clone())
        {
            tracing::error!(market = %market, "Market halted");
        }
    }
}

/// Serializes commands for every market and fans results out to sinks.
///
/// `Engine` is `Send + Sync`; share it as `Arc<Engine>`.
pub struct Engine {
    config: EngineConfig,
    state: Mutex<EngineState>,
}

impl Engine {
    /// Create an engine with no markets and no sinks.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(EngineState::default()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn register_persistence_sink(&self, sink: impl PersistenceSink + 'static) {
        self.state.lock().sinks.persistence = Some(Box::new(sink));
    }

    pub fn register_snapshot_sink(&self, sink: impl SnapshotSink + 'static) {
        self.state.lock().sinks.snapshot = Some(Box::new(sink));
    }

    pub fn register_activity_sink(&self, sink: impl ActivitySink + 'static) {
        self.state.lock().sinks.activity = Some(Box::new(sink));
    }

    /// Match a new order in its market, creating the market on first use.
    ///
    /// On success the persistence sink receives the result, the snapshot
    /// sink the market's new snapshot, and the activity sink the ordered
    /// notifications, all before the lock is released.
    pub fn handle_new_order(&self, order: &mut Order) -> Result<(MatchResult, bool)> {
        let mut state = self.state.lock();
        let market = order.market_id.clone();

        let outcome = state
            .handler_or_create(&self.config, &market)
            .and_then(|handler| handler.handle_new_order(order));
        let (result, has_match) = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                state.on_error(&self.config, &market, &err);
                return Err(err);
            }
        };

        let state = &*state;
        state.sinks.persist(&result);
        if let Some(handler) = state.handlers.get(&market) {
            state.sinks.publish_snapshot(handler);
        }
        state.sinks.publish_activities(&result.orderbook_activities);

        Ok((result, has_match))
    }

    /// Rest `order` without matching. Used to rebuild books after a restart.
    ///
    /// Returns the level-change message, or `None` when the order was not
    /// inserted (zero amount or already resting). Orders whose notional or
    /// level total would overflow are rejected with `InvalidOrder`.
    pub fn re_insert_order(&self, order: &Order) -> Result<Option<Message>> {
        let mut state = self.state.lock();
        let market = order.market_id.clone();

        let outcome = state
            .handler_or_create(&self.config, &market)
            .and_then(|handler| handler.reinsert_order(order));
        let event = match outcome {
            Ok(event) => event,
            Err(err) => {
                state.on_error(&self.config, &market, &err);
                return Err(err);
            }
        };

        if let Some(handler) = state.handlers.get(&market) {
            state.sinks.publish_snapshot(handler);
        }
        Ok(event.as_ref().map(Message::from_event))
    }

    /// Cancel a resting order.
    ///
    /// Returns the level-change message and `true` when the order was
    /// removed, `(None, false)` when it was no longer resting. A market that
    /// was never created is fatal.
    pub fn handle_cancel_order(&self, order: &Order) -> Result<(Option<Message>, bool)> {
        let mut state = self.state.lock();
        let market = order.market_id.clone();

        let event = match state.handler(&market) {
            Ok(handler) => handler.handle_cancel_order(order),
            Err(err) => {
                state.on_error(&self.config, &market, &err);
                return Err(err);
            }
        };

        let Some(event) = event else {
            tracing::debug!(market = %market, order = %order.id, "Cancel of non-resting order");
            return Ok((None, false));
        };

        if let Some(handler) = state.handlers.get(&market) {
            state.sinks.publish_snapshot(handler);
        }
        Ok((Some(Message::from_event(&event)), true))
    }

    /// Current snapshot of `market`, stamped with its sequence.
    #[must_use]
    pub fn snapshot(&self, market: &MarketId) -> Option<Snapshot> {
        self.state.lock().handlers.get(market).map(MarketHandler::snapshot)
    }

    #[must_use]
    pub fn sequence(&self, market: &MarketId) -> Option<u64> {
        self.state.lock().handlers.get(market).map(MarketHandler::sequence)
    }

    /// Markets created so far, sorted.
    #[must_use]
    pub fn markets(&self) -> Vec<MarketId> {
        let mut markets: Vec<_> = self.state.lock().handlers.keys().cloned().collect();
        markets.sort();
        markets
    }

    #[must_use]
    pub fn is_halted(&self, market: &MarketId) -> bool {
        self.state.lock().halted.contains(market)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            state: Mutex::new(EngineState::default()),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

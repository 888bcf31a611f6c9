//! Game flow orchestration for one room.
//!
//! The driver (`run`) walks the phase table: it runs the current step
//! (collecting decisions from humans and AI seats), advances the machine,
//! and checkpoints the state at every phase boundary. Human submissions come
//! in through `player_actions` and meet the driver at the wait points the
//! concurrency controller owns.

mod ai_coordinator;
mod day;
mod mutation;
mod night;
mod orchestration;
mod player_actions;
mod speech;

use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::Notify;

use crate::ai::DecisionGateway;
use crate::config::GameConfig;
use crate::domain::state::GameState;
use crate::events::{EventEnvelope, EventHub, GameEvent, Visibility};
use crate::repos::GameStateRepo;
use crate::services::concurrency::ConcurrencyController;

/// Orchestrator of one room's game.
pub struct GameFlowService {
    room_id: i64,
    ctl: Arc<ConcurrencyController>,
    hub: Arc<EventHub>,
    gateway: Arc<dyn DecisionGateway>,
    store: Arc<dyn GameStateRepo>,
    config: Arc<GameConfig>,
    /// Detail of the failed checkpoint the room is stalled on.
    stall: SyncMutex<Option<String>>,
    recovered: Notify,
}

impl GameFlowService {
    pub fn new(
        state: GameState,
        hub: Arc<EventHub>,
        gateway: Arc<dyn DecisionGateway>,
        store: Arc<dyn GameStateRepo>,
        config: Arc<GameConfig>,
    ) -> Self {
        let room_id = state.room_id;
        let ctl = Arc::new(ConcurrencyController::new(
            state,
            hub.clone(),
            config.reminder_interval(),
        ));
        Self {
            room_id,
            ctl,
            hub,
            gateway,
            store,
            config,
            stall: SyncMutex::new(None),
            recovered: Notify::new(),
        }
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    pub fn controller(&self) -> &Arc<ConcurrencyController> {
        &self.ctl
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_stalled(&self) -> bool {
        self.stall.lock().is_some()
    }

    /// Emit an event. Callers hold the turn lock.
    fn emit(&self, visibility: Visibility, event: GameEvent) -> Option<EventEnvelope> {
        self.hub.emit(self.room_id, visibility, event)
    }

    fn emit_public(&self, event: GameEvent) -> Option<EventEnvelope> {
        self.emit(Visibility::Public, event)
    }
}

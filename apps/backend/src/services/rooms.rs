//! Explicit room registry: one orchestrator, turn lock and driver task per room.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::ai::DecisionGateway;
use crate::config::GameConfig;
use crate::domain::actions::{Action, VoteChoice};
use crate::domain::log::LogEntry;
use crate::domain::roles::Team;
use crate::domain::seed_derivation::derive_room_seed;
use crate::domain::state::{GameState, SeatNo, SeatSpec};
use crate::domain::view::{filter_log, game_view, Audience, GameView, LogView};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::events::{EventEnvelope, EventHub};
use crate::repos::GameStateRepo;
use crate::services::game_flow::GameFlowService;

type Driver = JoinHandle<Result<Team, AppError>>;

pub struct Room {
    specs: Vec<SeatSpec>,
    flow: Arc<GameFlowService>,
    driver: SyncMutex<Option<Driver>>,
}

impl Room {
    pub fn flow(&self) -> &Arc<GameFlowService> {
        &self.flow
    }

    pub fn specs(&self) -> &[SeatSpec] {
        &self.specs
    }
}

/// Live feed for one listener: what happened so far plus what happens next.
pub struct Subscription {
    pub listener_id: Uuid,
    /// Log entries this audience may see, oldest first.
    pub replay: Vec<LogEntry>,
    pub view: GameView,
    pub events: mpsc::UnboundedReceiver<EventEnvelope>,
}

impl Subscription {
    pub fn into_stream(self) -> UnboundedReceiverStream<EventEnvelope> {
        UnboundedReceiverStream::new(self.events)
    }
}

pub struct RoomRegistry {
    rooms: DashMap<i64, Arc<Room>>,
    hub: Arc<EventHub>,
    gateway: Arc<dyn DecisionGateway>,
    store: Arc<dyn GameStateRepo>,
    config: Arc<GameConfig>,
}

impl RoomRegistry {
    pub fn new(
        hub: Arc<EventHub>,
        gateway: Arc<dyn DecisionGateway>,
        store: Arc<dyn GameStateRepo>,
        config: GameConfig,
    ) -> Self {
        Self {
            rooms: DashMap::new(),
            hub,
            gateway,
            store,
            config: Arc::new(config),
        }
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn room_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.rooms.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn room(&self, room_id: i64) -> Result<Arc<Room>, AppError> {
        self.rooms
            .get(&room_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| AppError::not_found(ErrorCode::RoomNotFound, format!("room {room_id} is not open")))
    }

    fn insert_room(&self, state: GameState, specs: Vec<SeatSpec>) -> Result<Arc<Room>, AppError> {
        let room_id = state.room_id;
        let flow = Arc::new(GameFlowService::new(
            state,
            self.hub.clone(),
            self.gateway.clone(),
            self.store.clone(),
            self.config.clone(),
        ));
        let room = Arc::new(Room {
            specs,
            flow,
            driver: SyncMutex::new(None),
        });
        match self.rooms.entry(room_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::invalid_state(
                ErrorCode::InvalidState,
                format!("room {room_id} is already open"),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(room.clone());
                self.hub.open_room(room_id);
                Ok(room)
            }
        }
    }

    /// Register a room with its seat layout. Membership is fixed from here on.
    pub fn open_room(&self, room_id: i64, specs: Vec<SeatSpec>) -> Result<(), AppError> {
        let seed = self
            .config
            .seed
            .unwrap_or_else(|| derive_room_seed(room_id, rand::random::<u64>()));
        let humans = specs.iter().filter(|s| s.is_human).count();
        self.insert_room(GameState::new(room_id, seed), specs)?;
        info!(room_id, humans, "room opened");
        Ok(())
    }

    fn spawn_driver(room: &Room) {
        let flow = room.flow.clone();
        let room_id = flow.room_id();
        let handle = tokio::spawn(async move {
            let result = flow.run().await;
            match &result {
                Ok(winner) => info!(room_id, %winner, "room finished"),
                Err(AppError::RoomClosed { .. }) => debug!(room_id, "room driver stopped"),
                Err(err) => error!(room_id, error = %err, "room driver failed"),
            }
            result
        });
        *room.driver.lock() = Some(handle);
    }

    pub async fn start_game(&self, room_id: i64) -> Result<(), AppError> {
        let room = self.room(room_id)?;
        room.flow.start_game(&room.specs).await?;
        Self::spawn_driver(&room);
        Ok(())
    }

    pub async fn pause_game(&self, room_id: i64) -> Result<(), AppError> {
        self.room(room_id)?.flow.pause_game().await
    }

    pub async fn resume_game(&self, room_id: i64) -> Result<(), AppError> {
        self.room(room_id)?.flow.resume_game().await
    }

    pub async fn submit_human_speech(
        &self,
        room_id: i64,
        seat: SeatNo,
        content: &str,
    ) -> Result<LogEntry, AppError> {
        self.room(room_id)?.flow.submit_human_speech(seat, content).await
    }

    pub async fn submit_human_vote(
        &self,
        room_id: i64,
        seat: SeatNo,
        choice: VoteChoice,
    ) -> Result<(), AppError> {
        self.room(room_id)?.flow.submit_human_vote(seat, choice).await
    }

    pub async fn submit_human_night_action(
        &self,
        room_id: i64,
        seat: SeatNo,
        action: Action,
    ) -> Result<(), AppError> {
        self.room(room_id)?
            .flow
            .submit_human_night_action(seat, action)
            .await
    }

    pub async fn submit_night_chat(
        &self,
        room_id: i64,
        seat: SeatNo,
        content: &str,
    ) -> Result<LogEntry, AppError> {
        self.room(room_id)?.flow.submit_night_chat(seat, content).await
    }

    /// Register a listener and hand back the replay taken at the same instant.
    pub async fn subscribe(&self, room_id: i64, audience: Audience) -> Result<Subscription, AppError> {
        let room = self.room(room_id)?;
        let state = room.flow.controller().lock().await;
        let (listener_id, events) = self.hub.register(room_id, audience);
        Ok(Subscription {
            listener_id,
            replay: filter_log(&state, LogView::from(audience)),
            view: game_view(&state, audience),
            events,
        })
    }

    pub fn unsubscribe(&self, room_id: i64, listener_id: Uuid) {
        self.hub.unregister(room_id, listener_id);
    }

    /// Ordered log as `view` may see it, for resyncing a reconnecting client.
    pub async fn replay_log(&self, room_id: i64, view: LogView) -> Result<Vec<LogEntry>, AppError> {
        let room = self.room(room_id)?;
        let state = room.flow.controller().lock().await;
        Ok(filter_log(&state, view))
    }

    pub async fn snapshot(&self, room_id: i64, audience: Audience) -> Result<GameView, AppError> {
        let room = self.room(room_id)?;
        let state = room.flow.controller().lock().await;
        Ok(game_view(&state, audience))
    }

    /// Reopen a room from its last checkpoint and resume driving it.
    pub async fn restore_room(&self, room_id: i64) -> Result<(), AppError> {
        if self.rooms.contains_key(&room_id) {
            return Err(AppError::invalid_state(
                ErrorCode::InvalidState,
                format!("room {room_id} is already open"),
            ));
        }
        let mut state = self.store.load_game_state(room_id).await?.ok_or_else(|| {
            AppError::not_found(
                ErrorCode::SavedGameNotFound,
                format!("no saved game for room {room_id}"),
            )
        })?;

        // human waits do not survive a restart; the step runs again from its start
        state.current_speaker_seat = None;
        state.waiting_for_human_input = false;
        state.reminder_count = 0;

        let specs = state
            .seats
            .iter()
            .map(|s| SeatSpec {
                seat_number: s.seat_number,
                participant_id: s.participant_id.clone(),
                is_human: s.is_human,
                role: Some(s.role),
            })
            .collect();
        let resumable = state.is_started && !state.is_over();
        info!(
            room_id,
            day = state.day_number,
            phase = %state.phase,
            resumable,
            "room restored"
        );
        let room = self.insert_room(state, specs)?;
        if resumable {
            Self::spawn_driver(&room);
        }
        Ok(())
    }

    pub async fn retry_checkpoint(&self, room_id: i64) -> Result<(), AppError> {
        self.room(room_id)?.flow.retry_checkpoint().await
    }

    pub fn is_stalled(&self, room_id: i64) -> Result<bool, AppError> {
        Ok(self.room(room_id)?.flow.is_stalled())
    }

    /// Tear a room down. The driver is stopped before anything else happens,
    /// listeners are dropped and a finished game's checkpoint is discarded.
    pub async fn close_room(&self, room_id: i64) -> Result<(), AppError> {
        let (_, room) = self
            .rooms
            .remove(&room_id)
            .ok_or_else(|| AppError::not_found(ErrorCode::RoomNotFound, format!("room {room_id} is not open")))?;
        room.flow.controller().close();
        let driver = room.driver.lock().take();
        if let Some(handle) = driver {
            handle.abort();
            match handle.await {
                Err(join_err) if join_err.is_panic() => {
                    warn!(room_id, error = %join_err, "room driver panicked");
                }
                _ => debug!(room_id, "room driver joined"),
            }
        }
        self.hub.close_room(room_id);

        let finished = room.flow.controller().lock().await.is_over();
        if finished {
            self.store.delete_game_state(room_id).await?;
        }
        info!(room_id, finished, "room closed");
        Ok(())
    }

    /// Await the room's driver and return the winner.
    pub async fn wait_for_game_over(&self, room_id: i64) -> Result<Team, AppError> {
        let room = self.room(room_id)?;
        let handle = room.driver.lock().take().ok_or_else(|| {
            AppError::invalid_state(
                ErrorCode::GameNotRunning,
                format!("room {room_id} has no running driver"),
            )
        })?;
        match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                warn!(room_id, error = %join_err, "room driver task aborted");
                Err(AppError::internal(format!("room {room_id} driver aborted: {join_err}")))
            }
        }
    }
}

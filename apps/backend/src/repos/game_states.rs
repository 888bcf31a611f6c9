//! Checkpoint storage for room game states.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::debug;

use crate::adapters::game_states_sea::{self as game_states_adapter, GameStateWrite};
use crate::domain::state::GameState;
use crate::entities::game_states;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// A checkpoint as loaded from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGameState {
    pub room_id: i64,
    pub state: GameState,
    pub lock_version: i32,
    pub updated_at: i64,
}

impl TryFrom<game_states::Model> for StoredGameState {
    type Error = AppError;

    fn try_from(model: game_states::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: model.room_id,
            state: serde_json::from_str(&model.state_json)?,
            lock_version: model.lock_version,
            updated_at: model.updated_at,
        })
    }
}

fn map_db_err(err: DbErr) -> AppError {
    match err {
        DbErr::Custom(msg) if msg.starts_with(game_states_adapter::OPTIMISTIC_LOCK_PREFIX) => {
            AppError::optimistic_lock(format!("game state was written concurrently: {msg}"))
        }
        DbErr::RecordNotFound(msg) => AppError::not_found(ErrorCode::SavedGameNotFound, msg),
        other => AppError::from(other),
    }
}

fn write_dto(room_id: i64, state: &GameState) -> Result<GameStateWrite, AppError> {
    let json = serde_json::to_string(state)?;
    Ok(GameStateWrite::new(room_id, json).with_phase(state.phase.as_str(), state.day_number as i32))
}

// Free functions (generic) over any connection

pub async fn find_by_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
) -> Result<Option<StoredGameState>, AppError> {
    let row = game_states_adapter::find_by_room(conn, room_id)
        .await
        .map_err(map_db_err)?;
    row.map(StoredGameState::try_from).transpose()
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
    state: &GameState,
) -> Result<StoredGameState, AppError> {
    let row = game_states_adapter::insert(conn, write_dto(room_id, state)?)
        .await
        .map_err(map_db_err)?;
    StoredGameState::try_from(row)
}

pub async fn update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
    expected_lock_version: i32,
    state: &GameState,
) -> Result<StoredGameState, AppError> {
    let row =
        game_states_adapter::optimistic_update(conn, expected_lock_version, write_dto(room_id, state)?)
            .await
            .map_err(map_db_err)?;
    StoredGameState::try_from(row)
}

/// Persistence collaborator of the engine.
///
/// Called only at phase boundaries; the engine never retries a failed save on
/// its own.
#[async_trait]
pub trait GameStateRepo: Send + Sync {
    async fn load_game_state(&self, room_id: i64) -> Result<Option<GameState>, AppError>;

    async fn save_game_state(&self, room_id: i64, state: &GameState) -> Result<(), AppError>;

    async fn delete_game_state(&self, room_id: i64) -> Result<(), AppError>;
}

/// Process-local store, used by tests and the demo binary.
#[derive(Debug, Default)]
pub struct InMemoryGameStates {
    rows: DashMap<i64, StoredGameState>,
}

impl InMemoryGameStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Lock version of the stored row, if any.
    pub fn lock_version(&self, room_id: i64) -> Option<i32> {
        self.rows.get(&room_id).map(|r| r.lock_version)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl GameStateRepo for InMemoryGameStates {
    async fn load_game_state(&self, room_id: i64) -> Result<Option<GameState>, AppError> {
        Ok(self.rows.get(&room_id).map(|r| r.state.clone()))
    }

    async fn save_game_state(&self, room_id: i64, state: &GameState) -> Result<(), AppError> {
        let updated_at = (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        self.rows
            .entry(room_id)
            .and_modify(|row| {
                row.state = state.clone();
                row.lock_version += 1;
                row.updated_at = updated_at;
            })
            .or_insert_with(|| StoredGameState {
                room_id,
                state: state.clone(),
                lock_version: 1,
                updated_at,
            });
        Ok(())
    }

    async fn delete_game_state(&self, room_id: i64) -> Result<(), AppError> {
        self.rows.remove(&room_id);
        Ok(())
    }
}

/// SeaORM-backed store.
///
/// Remembers the lock version it last read or wrote per room; a save against a
/// row that moved on since then fails with `OPTIMISTIC_LOCK`.
pub struct SeaGameStates {
    conn: DatabaseConnection,
    versions: DashMap<i64, i32>,
}

impl SeaGameStates {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            versions: DashMap::new(),
        }
    }

    /// Connect-time helper: create the table if needed and wrap the connection.
    pub async fn with_schema(conn: DatabaseConnection) -> Result<Self, AppError> {
        game_states_adapter::ensure_schema(&conn)
            .await
            .map_err(map_db_err)?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Lock version this store expects for the room's next save.
    pub fn known_version(&self, room_id: i64) -> Option<i32> {
        self.versions.get(&room_id).map(|v| *v)
    }
}

#[async_trait]
impl GameStateRepo for SeaGameStates {
    async fn load_game_state(&self, room_id: i64) -> Result<Option<GameState>, AppError> {
        let Some(stored) = find_by_room(&self.conn, room_id).await? else {
            self.versions.remove(&room_id);
            return Ok(None);
        };
        self.versions.insert(room_id, stored.lock_version);
        Ok(Some(stored.state))
    }

    async fn save_game_state(&self, room_id: i64, state: &GameState) -> Result<(), AppError> {
        let known = self.known_version(room_id);
        let stored = match known {
            Some(version) => update(&self.conn, room_id, version, state).await?,
            None => create(&self.conn, room_id, state).await?,
        };
        debug!(
            room_id,
            lock_version = stored.lock_version,
            "game state checkpointed"
        );
        self.versions.insert(room_id, stored.lock_version);
        Ok(())
    }

    async fn delete_game_state(&self, room_id: i64) -> Result<(), AppError> {
        game_states_adapter::delete(&self.conn, room_id)
            .await
            .map_err(map_db_err)?;
        self.versions.remove(&room_id);
        Ok(())
    }
}

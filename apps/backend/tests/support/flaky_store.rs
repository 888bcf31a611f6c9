//! Checkpoint store that starts failing from a chosen save onwards.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use werewolf_backend::domain::GameState;
use werewolf_backend::repos::{GameStateRepo, InMemoryGameStates};
use werewolf_backend::AppError;

pub struct FlakyStore {
    inner: Arc<InMemoryGameStates>,
    saves: AtomicUsize,
    fail_at: usize,
    failing: AtomicBool,
}

impl FlakyStore {
    /// Save number `fail_at` (1-based) and every later one fail until `heal`.
    pub fn failing_from(fail_at: usize) -> Self {
        Self {
            inner: InMemoryGameStates::shared(),
            saves: AtomicUsize::new(0),
            fail_at,
            failing: AtomicBool::new(false),
        }
    }

    pub fn heal(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &Arc<InMemoryGameStates> {
        &self.inner
    }
}

#[async_trait]
impl GameStateRepo for FlakyStore {
    async fn load_game_state(&self, room_id: i64) -> Result<Option<GameState>, AppError> {
        self.inner.load_game_state(room_id).await
    }

    async fn save_game_state(&self, room_id: i64, state: &GameState) -> Result<(), AppError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_at {
            self.failing.store(true, Ordering::SeqCst);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::persistence(format!("disk full on save {n}")));
        }
        self.inner.save_game_state(room_id, state).await
    }

    async fn delete_game_state(&self, room_id: i64) -> Result<(), AppError> {
        self.inner.delete_game_state(room_id).await
    }
}

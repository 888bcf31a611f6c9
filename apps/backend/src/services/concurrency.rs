//! Per-room turn lock, pause gate and human-wait protocol.
//!
//! Every mutation of a room's `GameState` happens while holding `lock()`.
//! Suspension points (pause gate, human waits, vote collection) never hold
//! it; the reminder ticker takes it briefly on every tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{oneshot, watch, Mutex, MutexGuard, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::actions::Action;
use crate::domain::state::{GameState, SeatNo};
use crate::error::AppError;
use crate::errors::domain::ValidationKind;
use crate::events::{EventHub, GameEvent, Visibility};

/// What a human handed in to release a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HumanInput {
    Speech(String),
    Action(Action),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitKey {
    Speech(SeatNo),
    NightAction(SeatNo),
}

impl WaitKey {
    pub fn seat(self) -> SeatNo {
        match self {
            WaitKey::Speech(seat) | WaitKey::NightAction(seat) => seat,
        }
    }
}

/// Who a reminder tick addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reminder {
    Speech(SeatNo),
    Action(SeatNo),
    /// Outstanding human voters, recomputed on every tick.
    Vote,
}

impl From<WaitKey> for Reminder {
    fn from(key: WaitKey) -> Self {
        match key {
            WaitKey::Speech(seat) => Reminder::Speech(seat),
            WaitKey::NightAction(seat) => Reminder::Action(seat),
        }
    }
}

pub struct ConcurrencyController {
    room_id: i64,
    state: Mutex<GameState>,
    paused: watch::Sender<bool>,
    waits: SyncMutex<HashMap<WaitKey, oneshot::Sender<HumanInput>>>,
    vote_activity: Notify,
    reminder_interval: Duration,
    shutdown: CancellationToken,
    hub: Arc<EventHub>,
}

impl ConcurrencyController {
    pub fn new(state: GameState, hub: Arc<EventHub>, reminder_interval: Duration) -> Self {
        let (paused, _) = watch::channel(state.is_paused);
        Self {
            room_id: state.room_id,
            state: Mutex::new(state),
            paused,
            waits: SyncMutex::new(HashMap::new()),
            vote_activity: Notify::new(),
            reminder_interval,
            shutdown: CancellationToken::new(),
            hub,
        }
    }

    pub fn room_id(&self) -> i64 {
        self.room_id
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// The room's turn lock.
    pub async fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().await
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Flip the gate. Callers also update `GameState::is_paused` under the lock.
    pub fn set_paused(&self, paused: bool) {
        self.paused.send_replace(paused);
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once the room is closed.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }

    /// Suspend until the room is not paused.
    pub async fn pause_gate(&self) -> Result<(), AppError> {
        let mut rx = self.paused.subscribe();
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(AppError::room_closed(self.room_id)),
            res = rx.wait_for(|paused| !*paused) => res
                .map(|_| ())
                .map_err(|_| AppError::room_closed(self.room_id)),
        }
    }

    /// Register a single-shot waiter. Call while holding the turn lock so a
    /// submitter that sees the request also sees the waiter.
    pub fn begin_wait(&self, key: WaitKey) -> oneshot::Receiver<HumanInput> {
        let (tx, rx) = oneshot::channel();
        self.waits.lock().insert(key, tx);
        rx
    }

    pub fn has_waiter(&self, key: WaitKey) -> bool {
        self.waits.lock().contains_key(&key)
    }

    /// Wait for the human registered under `key`, with no timeout.
    ///
    /// A reminder fires every `reminder_interval` until the input arrives.
    pub async fn wait_for_human(
        self: &Arc<Self>,
        key: WaitKey,
        rx: oneshot::Receiver<HumanInput>,
    ) -> Result<HumanInput, AppError> {
        let stop = self.shutdown.child_token();
        let ticker = self.spawn_reminders(Reminder::from(key), stop.clone());
        debug!(room_id = self.room_id, seat = key.seat(), ?key, "waiting for human input");

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => Err(AppError::room_closed(self.room_id)),
            input = rx => input.map_err(|_| AppError::room_closed(self.room_id)),
        };

        stop.cancel();
        let _ = ticker.await;
        self.waits.lock().remove(&key);
        result
    }

    /// Hand a human's input to the waiting driver.
    pub fn deliver(&self, key: WaitKey, input: HumanInput) -> Result<(), AppError> {
        let Some(tx) = self.waits.lock().remove(&key) else {
            return Err(AppError::invalid(
                ValidationKind::OutOfTurn,
                format!("seat {} is not being waited on", key.seat()),
            ));
        };
        tx.send(input)
            .map_err(|_| AppError::room_closed(self.room_id))
    }

    /// Wake the vote collector after a vote was recorded.
    pub fn notify_vote(&self) {
        self.vote_activity.notify_one();
    }

    /// Wait until every alive seat has voted. Humans are never force-closed.
    pub async fn wait_for_votes(self: &Arc<Self>) -> Result<(), AppError> {
        let stop = self.shutdown.child_token();
        let mut ticker: Option<JoinHandle<()>> = None;

        let result = loop {
            {
                let mut state = self.lock().await;
                if state.outstanding_voters().is_empty() {
                    state.waiting_for_human_input = false;
                    break Ok(());
                }
                if !state.waiting_for_human_input {
                    state.waiting_for_human_input = true;
                    state.reminder_count = 0;
                }
            }
            if ticker.is_none() {
                ticker = Some(self.spawn_reminders(Reminder::Vote, stop.clone()));
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => break Err(AppError::room_closed(self.room_id)),
                _ = self.vote_activity.notified() => {}
            }
        };

        stop.cancel();
        if let Some(ticker) = ticker {
            let _ = ticker.await;
        }
        result
    }

    fn spawn_reminders(self: &Arc<Self>, reminder: Reminder, stop: CancellationToken) -> JoinHandle<()> {
        let ctl = Arc::clone(self);
        tokio::spawn(async move {
            let period = ctl.reminder_interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => ctl.remind(reminder).await,
                }
            }
        })
    }

    async fn remind(&self, reminder: Reminder) {
        let mut state = self.lock().await;
        if state.is_paused || !state.waiting_for_human_input {
            return;
        }
        let (visibility, event) = match reminder {
            Reminder::Speech(seat) => {
                state.reminder_count += 1;
                (
                    Visibility::Public,
                    GameEvent::SpeechReminder {
                        seat,
                        reminder_count: state.reminder_count,
                    },
                )
            }
            Reminder::Action(seat) => {
                state.reminder_count += 1;
                (
                    Visibility::seat(seat),
                    GameEvent::ActionReminder {
                        seats: vec![seat],
                        reminder_count: state.reminder_count,
                    },
                )
            }
            Reminder::Vote => {
                let seats: Vec<SeatNo> = state
                    .outstanding_voters()
                    .into_iter()
                    .filter(|&n| state.seat(n).is_some_and(|s| s.is_human))
                    .collect();
                if seats.is_empty() {
                    return;
                }
                state.reminder_count += 1;
                (
                    Visibility::Public,
                    GameEvent::ActionReminder {
                        seats,
                        reminder_count: state.reminder_count,
                    },
                )
            }
        };
        debug!(room_id = self.room_id, count = state.reminder_count, "reminder");
        self.hub.emit(self.room_id, visibility, event);
    }

    /// Stop every wait and gate of this room.
    pub fn close(&self) {
        self.shutdown.cancel();
        self.waits.lock().clear();
    }
}

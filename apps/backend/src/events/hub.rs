use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::view::Audience;
use crate::events::protocol::{EventEnvelope, GameEvent, Visibility};

/// Outbound transport for every event of every room.
pub trait EventSink: Send + Sync {
    fn publish(&self, envelope: &EventEnvelope);
}

/// Writes each event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, envelope: &EventEnvelope) {
        let payload = serde_json::to_string(&envelope.event).unwrap_or_default();
        info!(
            target: "werewolf_backend::events",
            room_id = envelope.room_id,
            seq = envelope.seq,
            event = envelope.event.name(),
            payload = %payload,
            "event"
        );
    }
}

struct Listener {
    audience: Audience,
    tx: mpsc::UnboundedSender<EventEnvelope>,
}

#[derive(Default)]
struct RoomChannel {
    seq: AtomicU64,
    listeners: DashMap<Uuid, Listener>,
}

/// Per-room fan-out of events.
///
/// Callers emit while holding the room's turn lock, which is what keeps a
/// room's sequence numbers and delivery order consistent.
#[derive(Default)]
pub struct EventHub {
    rooms: DashMap<i64, Arc<RoomChannel>>,
    closed: DashSet<i64>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn channel(&self, room_id: i64) -> Arc<RoomChannel> {
        self.rooms
            .entry(room_id)
            .or_insert_with(|| Arc::new(RoomChannel::default()))
            .clone()
    }

    pub fn register(
        &self,
        room_id: i64,
        audience: Audience,
    ) -> (Uuid, mpsc::UnboundedReceiver<EventEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = Uuid::new_v4();
        self.channel(room_id)
            .listeners
            .insert(token, Listener { audience, tx });
        debug!(room_id, %token, ?audience, "listener registered");
        (token, rx)
    }

    pub fn unregister(&self, room_id: i64, token: Uuid) {
        if let Some(room) = self.rooms.get(&room_id) {
            room.listeners.remove(&token);
        }
    }

    /// Start a fresh feed for the room; sequence numbers restart at 1.
    pub fn open_room(&self, room_id: i64) {
        self.closed.remove(&room_id);
        self.rooms.remove(&room_id);
    }

    /// Fan an event out. Returns `None` when the room was closed, in which
    /// case nothing is published.
    pub fn emit(
        &self,
        room_id: i64,
        visibility: Visibility,
        event: GameEvent,
    ) -> Option<EventEnvelope> {
        if self.closed.contains(&room_id) {
            debug!(room_id, event = event.name(), "event dropped for closed room");
            return None;
        }
        let room = self.channel(room_id);
        let seq = room.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let envelope = EventEnvelope {
            room_id,
            seq,
            visibility,
            event,
        };

        for sink in &self.sinks {
            sink.publish(&envelope);
        }

        let mut closed = Vec::new();
        for listener in room.listeners.iter() {
            if !envelope.visibility.allows(listener.audience) {
                continue;
            }
            if listener.tx.send(envelope.clone()).is_err() {
                closed.push(*listener.key());
            }
        }
        for token in closed {
            room.listeners.remove(&token);
        }

        Some(envelope)
    }

    pub fn emit_public(&self, room_id: i64, event: GameEvent) -> Option<EventEnvelope> {
        self.emit(room_id, Visibility::Public, event)
    }

    /// Drop every listener of the room; their receivers see the channel close.
    /// Later emits for the room are discarded until it is opened again.
    pub fn close_room(&self, room_id: i64) {
        self.closed.insert(room_id);
        self.rooms.remove(&room_id);
    }

    pub fn listener_count(&self, room_id: i64) -> usize {
        self.rooms
            .get(&room_id)
            .map(|r| r.listeners.len())
            .unwrap_or(0)
    }

    /// Sequence number of the last emitted event.
    pub fn last_seq(&self, room_id: i64) -> u64 {
        self.rooms
            .get(&room_id)
            .map(|r| r.seq.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

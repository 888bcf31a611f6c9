//! Helpers for reading a room's event feed in tests.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use werewolf_backend::events::{EventEnvelope, GameEvent};

const EVENT_WAIT: Duration = Duration::from_secs(10);

/// Receive until `pred` matches. Returns everything seen, the match last.
pub async fn until(
    rx: &mut UnboundedReceiver<EventEnvelope>,
    pred: impl Fn(&GameEvent) -> bool,
) -> Vec<EventEnvelope> {
    let mut seen = Vec::new();
    loop {
        let env = timeout(EVENT_WAIT, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("no matching event within {EVENT_WAIT:?}; saw {seen:#?}"))
            .expect("event feed closed");
        let done = pred(&env.event);
        seen.push(env);
        if done {
            return seen;
        }
    }
}

/// Everything already queued for this listener.
pub fn drain(rx: &mut UnboundedReceiver<EventEnvelope>) -> Vec<EventEnvelope> {
    let mut out = Vec::new();
    while let Ok(env) = rx.try_recv() {
        out.push(env);
    }
    out
}

pub fn position(events: &[EventEnvelope], pred: impl Fn(&GameEvent) -> bool) -> Option<usize> {
    events.iter().position(|e| pred(&e.event))
}

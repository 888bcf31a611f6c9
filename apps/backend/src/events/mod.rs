//! Room-scoped event stream: wire protocol and fan-out hub.

pub mod hub;
pub mod protocol;

pub use hub::{EventHub, EventSink, TracingSink};
pub use protocol::{EventEnvelope, GameEvent, NightResult, Visibility, PROTOCOL_VERSION};

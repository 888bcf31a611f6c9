pub mod concurrency;
pub mod game_flow;
pub mod rooms;

pub use concurrency::{ConcurrencyController, HumanInput, WaitKey};
pub use game_flow::GameFlowService;
pub use rooms::{Room, RoomRegistry, Subscription};

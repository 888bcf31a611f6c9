//! Engine configuration read from the environment.

pub mod db;
pub mod game;

pub use db::{connect, database_url};
pub use game::GameConfig;

use std::sync::Arc;

use werewolf_backend::ai::AiConfig;
use werewolf_backend::config::{database_url, GameConfig};
use werewolf_backend::domain::SeatSpec;
use werewolf_backend::events::TracingSink;
use werewolf_backend::{build_state, AppError};

mod telemetry;

const DEMO_ROOM: i64 = 1;
const DEMO_SEATS: u8 = 10;

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - WEREWOLF_* for game settings, WEREWOLF_AI_* for the decision gateway
    // - DATABASE_URL to checkpoint into a database instead of memory
    if let Err(e) = run().await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = GameConfig::from_env()?;
    let ai_config = AiConfig::from_env()?;

    let mut builder = build_state()
        .with_config(config)
        .with_ai_config(ai_config)
        .with_sink(Arc::new(TracingSink));
    if let Some(url) = database_url() {
        builder = builder.with_database_url(url);
    }
    let app_state = builder.build().await?;
    if app_state.db().is_some() {
        println!("✅ Database connected");
    }

    let registry = app_state.registry();
    let seats = (1..=DEMO_SEATS).map(SeatSpec::ai).collect();
    registry.open_room(DEMO_ROOM, seats)?;
    registry.start_game(DEMO_ROOM).await?;
    println!("🐺 Room {DEMO_ROOM} started with {DEMO_SEATS} AI seats");

    let winner = registry.wait_for_game_over(DEMO_ROOM).await?;
    println!("🏁 {winner} win");
    registry.close_room(DEMO_ROOM).await?;
    Ok(())
}

use std::sync::Arc;

use crate::ai::{build_gateway, AiConfig, DecisionGateway};
use crate::config::db::connect;
use crate::config::GameConfig;
use crate::error::AppError;
use crate::events::{EventHub, EventSink};
use crate::repos::{GameStateRepo, InMemoryGameStates, SeaGameStates};
use crate::services::rooms::RoomRegistry;
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: GameConfig,
    ai_config: AiConfig,
    gateway: Option<Arc<dyn DecisionGateway>>,
    store: Option<Arc<dyn GameStateRepo>>,
    database_url: Option<String>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            ai_config: AiConfig::empty(),
            gateway: None,
            store: None,
            database_url: None,
            sinks: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_ai_config(mut self, ai_config: AiConfig) -> Self {
        self.ai_config = ai_config;
        self
    }

    /// Use this gateway instead of building one from the AI config.
    pub fn with_gateway(mut self, gateway: Arc<dyn DecisionGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn GameStateRepo>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist checkpoints through SeaORM at `url`.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let gateway = match self.gateway {
            Some(gateway) => gateway,
            None => {
                let seed = self.ai_config.seed().or(self.config.seed);
                build_gateway(&self.ai_config.with_seed(seed))?
            }
        };

        let (store, db): (Arc<dyn GameStateRepo>, _) = match (self.store, self.database_url) {
            (Some(store), _) => (store, None),
            (None, Some(url)) => {
                let conn = connect(&url).await?;
                let repo = SeaGameStates::with_schema(conn.clone()).await?;
                (Arc::new(repo), Some(conn))
            }
            (None, None) => (InMemoryGameStates::shared(), None),
        };

        let hub = self
            .sinks
            .into_iter()
            .fold(EventHub::new(), |hub, sink| hub.with_sink(sink));
        let registry = RoomRegistry::new(Arc::new(hub), gateway, store, self.config);
        Ok(AppState::new(registry, db))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

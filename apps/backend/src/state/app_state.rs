use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventHub;
use crate::services::rooms::RoomRegistry;

/// Process-wide shared resources.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<RoomRegistry>,
    /// Database connection (absent when rooms are kept in memory)
    db: Option<DatabaseConnection>,
}

impl AppState {
    pub fn new(registry: RoomRegistry, db: Option<DatabaseConnection>) -> Self {
        Self {
            registry: Arc::new(registry),
            db,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        self.registry.hub()
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}

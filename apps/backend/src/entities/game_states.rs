use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One checkpointed game per room.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub room_id: i64,
    /// Phase at checkpoint time, for operators browsing the table.
    pub phase: String,
    #[sea_orm(column_name = "day_number")]
    pub day_number: i32,
    /// Serialized `domain::GameState`.
    #[sea_orm(column_name = "state_json", column_type = "Text")]
    pub state_json: String,
    #[sea_orm(column_name = "lock_version")]
    pub lock_version: i32,
    /// Unix millis.
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

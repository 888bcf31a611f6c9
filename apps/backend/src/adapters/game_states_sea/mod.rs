//! SeaORM adapter for checkpointed game states - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Schema, Set,
};

use crate::entities::game_states;

pub mod dto;

pub use dto::GameStateWrite;

// Adapter functions return DbErr; the repo layer maps them to AppError.

/// Prefix of the `DbErr::Custom` payload for a lock version mismatch.
pub const OPTIMISTIC_LOCK_PREFIX: &str = "OPTIMISTIC_LOCK:";

fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Create the `game_states` table if it does not exist.
pub async fn ensure_schema<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(game_states::Entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;
    Ok(())
}

pub async fn find_by_room<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    room_id: i64,
) -> Result<Option<game_states::Model>, DbErr> {
    game_states::Entity::find_by_id(room_id).one(conn).await
}

pub async fn insert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: GameStateWrite,
) -> Result<game_states::Model, DbErr> {
    let active = game_states::ActiveModel {
        room_id: Set(dto.room_id),
        phase: Set(dto.phase),
        day_number: Set(dto.day_number),
        state_json: Set(dto.state_json),
        lock_version: Set(1),
        updated_at: Set(now_millis()),
    };
    active.insert(conn).await
}

/// Overwrite a row if its lock version is still `current_lock_version`, bumping it by one.
///
/// Zero affected rows means either the row is gone (`RecordNotFound`) or
/// somebody else wrote in between (`Custom` with [`OPTIMISTIC_LOCK_PREFIX`]).
pub async fn optimistic_update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    current_lock_version: i32,
    dto: GameStateWrite,
) -> Result<game_states::Model, DbErr> {
    let room_id = dto.room_id;
    let result = game_states::Entity::update_many()
        .col_expr(game_states::Column::Phase, Expr::value(dto.phase))
        .col_expr(game_states::Column::DayNumber, Expr::value(dto.day_number))
        .col_expr(game_states::Column::StateJson, Expr::value(dto.state_json))
        .col_expr(game_states::Column::UpdatedAt, Expr::value(now_millis()))
        .col_expr(
            game_states::Column::LockVersion,
            Expr::col(game_states::Column::LockVersion).add(1),
        )
        .filter(game_states::Column::RoomId.eq(room_id))
        .filter(game_states::Column::LockVersion.eq(current_lock_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match find_by_room(conn, room_id).await? {
            Some(row) => Err(DbErr::Custom(format!(
                "{OPTIMISTIC_LOCK_PREFIX}{{\"expected\":{},\"actual\":{}}}",
                current_lock_version, row.lock_version
            ))),
            None => Err(DbErr::RecordNotFound(format!(
                "game state for room {room_id} not found"
            ))),
        };
    }

    find_by_room(conn, room_id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("game state for room {room_id} not found")))
}

pub async fn delete<C: ConnectionTrait + Send + Sync>(conn: &C, room_id: i64) -> Result<u64, DbErr> {
    let result = game_states::Entity::delete_by_id(room_id).exec(conn).await?;
    Ok(result.rows_affected)
}

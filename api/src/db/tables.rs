use jansou_common::table::TableStatus;

use super::models::TableRow;
use super::{Db, sql};
use crate::types::{RoomId, TableId};

#[tracing::instrument(skip(pool), err)]
pub async fn create_table(
    pool: &Db,
    id: &TableId,
    room_id: &RoomId,
    name: &str,
) -> Result<(), sqlx::Error> {
    let q = sql("INSERT INTO tables (id, room_id, name, status) VALUES (?, ?, ?, ?)");
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(room_id.as_str())
        .bind(name)
        .bind(TableStatus::Waiting.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

#[tracing::instrument(skip(pool), err)]
pub async fn get_table(pool: &Db, id: &TableId) -> Result<Option<TableRow>, sqlx::Error> {
    let q = sql("SELECT * FROM tables WHERE id = ?");
    sqlx::query_as::<_, TableRow>(&q)
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
}

/// ルーム内の卓一覧（新しい順）
#[tracing::instrument(skip(pool), err)]
pub async fn get_tables_by_room(pool: &Db, room_id: &RoomId) -> Result<Vec<TableRow>, sqlx::Error> {
    let q = sql("SELECT * FROM tables WHERE room_id = ? ORDER BY created_at DESC");
    sqlx::query_as::<_, TableRow>(&q)
        .bind(room_id.as_str())
        .fetch_all(pool)
        .await
}

#[tracing::instrument(skip(pool), err)]
pub async fn update_status(
    pool: &Db,
    id: &TableId,
    status: TableStatus,
) -> Result<bool, sqlx::Error> {
    let q = sql("UPDATE tables SET status = ? WHERE id = ?");
    let result = sqlx::query(&q)
        .bind(status.as_str())
        .bind(id.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

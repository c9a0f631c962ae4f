use jansou_common::seat::{STARTING_SCORE, Wind};

use super::models::SeatRow;
use super::{Db, sql, ts};
use crate::types::{SeatId, TableId, UserId};

/// 卓の着席者一覧（席順）。ユーザ行がなければ `name` は `None`。
#[tracing::instrument(skip(pool), err)]
pub async fn get_seats(pool: &Db, table_id: &TableId) -> Result<Vec<SeatRow>, sqlx::Error> {
    let q = sql("SELECT p.*, u.name AS name \
         FROM table_players p \
         LEFT JOIN users u ON p.user_id = u.id \
         WHERE p.table_id = ? \
         ORDER BY p.seat_order ASC");
    sqlx::query_as::<_, SeatRow>(&q)
        .bind(table_id.as_str())
        .fetch_all(pool)
        .await
}

/// 席を確保する。位置・ユーザの一意性はDB制約に任せる。
#[tracing::instrument(skip(pool), err)]
pub async fn insert_seat(
    pool: &Db,
    id: &SeatId,
    table_id: &TableId,
    user_id: &UserId,
    position: Wind,
) -> Result<(), sqlx::Error> {
    let q = sql("INSERT INTO table_players (id, table_id, user_id, position, seat_order, current_score, joined_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)");
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(table_id.as_str())
        .bind(user_id.as_str())
        .bind(position.as_str())
        .bind(position.seat_order())
        .bind(STARTING_SCORE)
        .bind(ts(chrono::Utc::now()))
        .execute(pool)
        .await?;
    Ok(())
}

/// 指定ユーザの席だけを削除する。
#[tracing::instrument(skip(pool), err)]
pub async fn delete_seat(
    pool: &Db,
    table_id: &TableId,
    user_id: &UserId,
) -> Result<bool, sqlx::Error> {
    let q = sql("DELETE FROM table_players WHERE table_id = ? AND user_id = ?");
    let result = sqlx::query(&q)
        .bind(table_id.as_str())
        .bind(user_id.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

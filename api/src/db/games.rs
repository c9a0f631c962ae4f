use jansou_common::record::RoundRecord;

use super::models::GameRow;
use super::{Db, sql, ts};
use crate::types::{GameId, TableId};

/// 卓詳細に載せる局の件数
pub const RECENT_GAMES_LIMIT: i64 = 10;

/// 1局の結果を追記する。
#[tracing::instrument(skip(pool, round), err)]
pub async fn insert_game(
    pool: &Db,
    id: &GameId,
    table_id: &TableId,
    round: &RoundRecord,
) -> Result<(), sqlx::Error> {
    let cols = round.columns();
    let q = sql("INSERT INTO games \
         (id, table_id, round_name, round_number, winner_id, loser_id, han, fu, score, is_draw, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(table_id.as_str())
        .bind(round.round_name.trim())
        .bind(round.round_number)
        .bind(cols.winner_id)
        .bind(cols.loser_id)
        .bind(cols.han)
        .bind(cols.fu)
        .bind(cols.score)
        .bind(cols.is_draw)
        .bind(ts(chrono::Utc::now()))
        .execute(pool)
        .await?;
    Ok(())
}

#[tracing::instrument(skip(pool), err)]
pub async fn get_game(pool: &Db, id: &GameId) -> Result<Option<GameRow>, sqlx::Error> {
    let q = sql("SELECT * FROM games WHERE id = ?");
    sqlx::query_as::<_, GameRow>(&q)
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
}

/// 直近の局（新しい順）
#[tracing::instrument(skip(pool), err)]
pub async fn get_recent_games(
    pool: &Db,
    table_id: &TableId,
    limit: i64,
) -> Result<Vec<GameRow>, sqlx::Error> {
    let q = sql("SELECT * FROM games WHERE table_id = ? \
         ORDER BY created_at DESC, round_number DESC \
         LIMIT ?");
    sqlx::query_as::<_, GameRow>(&q)
        .bind(table_id.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await
}

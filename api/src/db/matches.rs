use jansou_common::record::MatchEntry;
use serde::Serialize;

use super::models::{MatchRow, MatchScoreRow};
use super::{Db, sql, ts};
use crate::types::{MatchId, TableId, UserId};

/// 半荘のヘッダと順位順のスコア
#[derive(Debug, Clone, Serialize)]
pub struct MatchWithScores {
    #[serde(flatten)]
    pub header: MatchRow,
    pub scores: Vec<MatchScoreRow>,
}

/// 半荘結果を記録する。ヘッダとスコア行は同一トランザクション。
#[tracing::instrument(skip(pool, entries), fields(entries = entries.len()), err)]
pub async fn insert_match(
    pool: &Db,
    id: &MatchId,
    table_id: &TableId,
    recorded_by: &UserId,
    entries: &[MatchEntry],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let q = sql("INSERT INTO matches (id, table_id, recorded_by, created_at) VALUES (?, ?, ?, ?)");
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(table_id.as_str())
        .bind(recorded_by.as_str())
        .bind(ts(chrono::Utc::now()))
        .execute(&mut *tx)
        .await?;

    let q = sql("INSERT INTO match_scores (match_id, user_id, score, rank) VALUES (?, ?, ?, ?)");
    for entry in entries {
        sqlx::query(&q)
            .bind(id.as_str())
            .bind(entry.user_id.as_str())
            .bind(entry.score)
            .bind(entry.rank)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// 卓の半荘結果一覧（新しい順）
#[tracing::instrument(skip(pool), err)]
pub async fn get_matches(pool: &Db, table_id: &TableId) -> Result<Vec<MatchWithScores>, sqlx::Error> {
    let q = sql("SELECT * FROM matches WHERE table_id = ? ORDER BY created_at DESC");
    let headers = sqlx::query_as::<_, MatchRow>(&q)
        .bind(table_id.as_str())
        .fetch_all(pool)
        .await?;

    let q = sql("SELECT s.* FROM match_scores s \
         INNER JOIN matches m ON s.match_id = m.id \
         WHERE m.table_id = ? \
         ORDER BY s.rank ASC");
    let scores = sqlx::query_as::<_, MatchScoreRow>(&q)
        .bind(table_id.as_str())
        .fetch_all(pool)
        .await?;

    Ok(headers
        .into_iter()
        .map(|header| {
            let scores = scores
                .iter()
                .filter(|s| s.match_id == header.id)
                .cloned()
                .collect();
            MatchWithScores { header, scores }
        })
        .collect())
}

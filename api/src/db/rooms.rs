use super::models::{RecentRoomRow, RoomListRow, RoomMemberRow, RoomRow};
use super::{Db, sql, ts};
use crate::types::{RoomId, UserId};

/// ルームを作成し、作成者をメンバーに追加する。
/// 同じコードの期限切れルームが残っていれば先に削除する。
#[tracing::instrument(skip(pool, password_hash), err)]
pub async fn create_room(
    pool: &Db,
    id: &RoomId,
    code: &str,
    name: &str,
    created_by: &UserId,
    password_hash: Option<&str>,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), sqlx::Error> {
    let now = ts(chrono::Utc::now());
    let mut tx = pool.begin().await?;

    let q = sql("DELETE FROM rooms WHERE code = ? AND expires_at <= ?");
    sqlx::query(&q)
        .bind(code)
        .bind(now.clone())
        .execute(&mut *tx)
        .await?;

    let q = sql(
        "INSERT INTO rooms (id, code, name, created_by, password_hash, expires_at) VALUES (?, ?, ?, ?, ?, ?)",
    );
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(code)
        .bind(name)
        .bind(created_by.as_str())
        .bind(password_hash)
        .bind(ts(expires_at))
        .execute(&mut *tx)
        .await?;

    let q = sql(
        "INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?) ON CONFLICT (room_id, user_id) DO NOTHING",
    );
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(created_by.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

#[tracing::instrument(skip(pool), err)]
pub async fn get_room(pool: &Db, id: &RoomId) -> Result<Option<RoomRow>, sqlx::Error> {
    let q = sql("SELECT * FROM rooms WHERE id = ?");
    sqlx::query_as::<_, RoomRow>(&q)
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
}

/// 有効期限内のルームをコードで検索する。
#[tracing::instrument(skip(pool), err)]
pub async fn get_live_room_by_code(pool: &Db, code: &str) -> Result<Option<RoomRow>, sqlx::Error> {
    let q = sql("SELECT * FROM rooms WHERE code = ? AND expires_at > ?");
    sqlx::query_as::<_, RoomRow>(&q)
        .bind(code)
        .bind(ts(chrono::Utc::now()))
        .fetch_optional(pool)
        .await
}

/// メンバーを追加する。既にメンバーなら何もしない。追加した場合は true。
#[tracing::instrument(skip(pool), err)]
pub async fn add_member(pool: &Db, room_id: &RoomId, user_id: &UserId) -> Result<bool, sqlx::Error> {
    let q = sql(
        "INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?) ON CONFLICT (room_id, user_id) DO NOTHING",
    );
    let result = sqlx::query(&q)
        .bind(room_id.as_str())
        .bind(user_id.as_str())
        .bind(ts(chrono::Utc::now()))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[tracing::instrument(skip(pool), err)]
pub async fn is_member(pool: &Db, room_id: &RoomId, user_id: &UserId) -> Result<bool, sqlx::Error> {
    let q = sql("SELECT 1 FROM room_members WHERE room_id = ? AND user_id = ?");
    let row: Option<(i32,)> = sqlx::query_as(&q)
        .bind(room_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// 入室順（古い順）のメンバー一覧
#[tracing::instrument(skip(pool), err)]
pub async fn get_members(pool: &Db, room_id: &RoomId) -> Result<Vec<RoomMemberRow>, sqlx::Error> {
    let q = sql("SELECT m.room_id, m.user_id, m.joined_at, u.name \
         FROM room_members m \
         LEFT JOIN users u ON m.user_id = u.id \
         WHERE m.room_id = ? \
         ORDER BY m.joined_at ASC");
    sqlx::query_as::<_, RoomMemberRow>(&q)
        .bind(room_id.as_str())
        .fetch_all(pool)
        .await
}

/// 有効期限内の全ルーム（作成が新しい順）
#[tracing::instrument(skip(pool), err)]
pub async fn list_live_rooms(pool: &Db) -> Result<Vec<RoomListRow>, sqlx::Error> {
    let q = sql("SELECT r.id, r.code, r.name, r.created_at, r.expires_at, r.created_by, \
         u.name AS created_by_name, (r.password_hash IS NOT NULL) AS has_password \
         FROM rooms r \
         LEFT JOIN users u ON r.created_by = u.id \
         WHERE r.expires_at > ? \
         ORDER BY r.created_at DESC");
    sqlx::query_as::<_, RoomListRow>(&q)
        .bind(ts(chrono::Utc::now()))
        .fetch_all(pool)
        .await
}

/// 最近入室した有効期限内のルーム（新しい順）
#[tracing::instrument(skip(pool), err)]
pub async fn get_recent_rooms(
    pool: &Db,
    user_id: &UserId,
    limit: i64,
) -> Result<Vec<RecentRoomRow>, sqlx::Error> {
    let q = sql("SELECT r.id, r.code, r.name, r.created_at, r.expires_at, m.joined_at \
         FROM room_members m \
         INNER JOIN rooms r ON m.room_id = r.id \
         WHERE m.user_id = ? AND r.expires_at > ? \
         ORDER BY m.joined_at DESC \
         LIMIT ?");
    sqlx::query_as::<_, RecentRoomRow>(&q)
        .bind(user_id.as_str())
        .bind(ts(chrono::Utc::now()))
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// 期限切れルームを削除し、削除件数を返す。卓・着席・記録は連鎖削除される。
#[tracing::instrument(skip(pool), err)]
pub async fn delete_expired_rooms(pool: &Db) -> Result<u64, sqlx::Error> {
    let q = sql("DELETE FROM rooms WHERE expires_at <= ?");
    let result = sqlx::query(&q)
        .bind(ts(chrono::Utc::now()))
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

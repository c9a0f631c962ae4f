use super::models::UserRow;
use super::{Db, sql, ts};
use crate::types::UserId;

#[tracing::instrument(skip(pool), err)]
pub async fn get_user(pool: &Db, id: &UserId) -> Result<Option<UserRow>, sqlx::Error> {
    let q = sql("SELECT * FROM users WHERE id = ?");
    sqlx::query_as::<_, UserRow>(&q)
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
}

/// ユーザをupsertする（INSERT ON CONFLICT UPDATE）。
/// `is_admin` はここでは変更しない。
#[tracing::instrument(skip(pool), err)]
pub async fn upsert_user(
    pool: &Db,
    id: &UserId,
    email: Option<&str>,
    name: &str,
    is_guest: bool,
) -> Result<(), sqlx::Error> {
    let now = ts(chrono::Utc::now());
    let q = sql("INSERT INTO users (id, email, name, is_guest, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET
             email = excluded.email,
             name = excluded.name,
             is_guest = excluded.is_guest,
             updated_at = excluded.updated_at");
    sqlx::query(&q)
        .bind(id.as_str())
        .bind(email)
        .bind(name)
        .bind(is_guest)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

/// ユーザが存在しなければ作成する。既存の行は変更しない。
/// 作成した場合は true を返す。
#[tracing::instrument(skip(pool), err)]
pub async fn insert_user_if_missing(
    pool: &Db,
    id: &UserId,
    email: Option<&str>,
    name: &str,
    is_guest: bool,
) -> Result<bool, sqlx::Error> {
    let q = sql("INSERT INTO users (id, email, name, is_guest) VALUES (?, ?, ?, ?)
         ON CONFLICT (id) DO NOTHING");
    let result = sqlx::query(&q)
        .bind(id.as_str())
        .bind(email)
        .bind(name)
        .bind(is_guest)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;

    #[tokio::test]
    async fn upsert_updates_profile_fields() {
        let pool = memory_pool().await;
        let id = UserId("u1".into());

        upsert_user(&pool, &id, Some("a@example.com"), "Alice", false)
            .await
            .unwrap();
        upsert_user(&pool, &id, Some("alice@example.com"), "アリス", false)
            .await
            .unwrap();

        let user = get_user(&pool, &id).await.unwrap().unwrap();
        assert_eq!(user.name, "アリス");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn insert_if_missing_does_not_overwrite() {
        let pool = memory_pool().await;
        let id = UserId("u2".into());
        assert!(
            insert_user_if_missing(&pool, &id, None, "First", true)
                .await
                .unwrap()
        );
        assert!(
            !insert_user_if_missing(&pool, &id, None, "Second", true)
                .await
                .unwrap()
        );
        let user = get_user(&pool, &id).await.unwrap().unwrap();
        assert_eq!(user.name, "First");
        assert!(user.is_guest);
    }
}

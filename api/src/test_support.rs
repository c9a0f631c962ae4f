use crate::AppState;
use crate::config::AppConfig;
use crate::db::{self, Db};
use crate::events::EventHub;
use crate::types::{RoomId, TableId, UserId};

/// 単一接続のインメモリ SQLite。接続が閉じるとDBが消えるため寿命を無制限にする。
pub async fn memory_pool() -> Db {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

pub async fn seed_user(pool: &Db, id: &str, name: &str) -> UserId {
    let id = UserId(id.into());
    db::users::upsert_user(pool, &id, None, name, false)
        .await
        .unwrap();
    id
}

pub async fn seed_room(pool: &Db, code: &str, owner: &UserId) -> RoomId {
    let id = RoomId::new_v4();
    let expires_at = chrono::Utc::now() + chrono::Duration::hours(24);
    db::rooms::create_room(pool, &id, code, "Room", owner, None, expires_at)
        .await
        .unwrap();
    id
}

pub async fn seed_table(pool: &Db, room: &RoomId) -> TableId {
    let id = TableId::new_v4();
    db::tables::create_table(pool, &id, room, "卓").await.unwrap();
    id
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        listen_addr: "127.0.0.1:0".into(),
        room_ttl_hours: 24,
        session_ttl_hours: 24,
        min_players_to_start: 1,
        service_key: None,
        guest_email_domain: "guest.local".into(),
        bot_email_domain: "bot.example.com".into(),
    }
}

pub async fn test_state() -> AppState {
    AppState {
        pool: memory_pool().await,
        config: test_config(),
        events: EventHub::new(),
    }
}

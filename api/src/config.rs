use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: String,
    /// ルームの有効期間（時間）
    pub room_ttl_hours: i64,
    /// セッションの有効期間（時間）
    pub session_ttl_hours: i64,
    /// 対局開始に必要な着席人数
    pub min_players_to_start: usize,
    /// `/api/user-sync` と `/v1/session` を保護する共有鍵。未設定なら検証しない。
    pub service_key: Option<String>,
    pub guest_email_domain: String,
    pub bot_email_domain: String,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "invalid value in environment, using default");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:jansou.db?mode=rwc".into()),
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            room_ttl_hours: parse_or("ROOM_TTL_HOURS", 24),
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24 * 7),
            min_players_to_start: parse_or("MIN_PLAYERS_TO_START", 1),
            service_key: env::var("SERVICE_KEY").ok().filter(|k| !k.is_empty()),
            guest_email_domain: env::var("GUEST_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "guest.local".into()),
            bot_email_domain: env::var("BOT_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "bot.example.com".into()),
        }
    }

    pub fn room_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.room_ttl_hours)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

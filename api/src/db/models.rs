use serde::Serialize;

/// SQLite では TEXT として格納されるため String、
/// PostgreSQL では TIMESTAMPTZ として格納されるため chrono 型を使用。
#[cfg(not(feature = "postgres"))]
pub type Timestamp = String;
#[cfg(feature = "postgres")]
pub type Timestamp = chrono::DateTime<chrono::Utc>;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_guest: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub token_hash: String,
    pub user_id: String,
    pub is_guest: bool,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoomRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub created_by: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl RoomRow {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// 最近入室したルーム（`room_members` の入室日時つき）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentRoomRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub joined_at: Timestamp,
}

/// ルーム一覧の1行。作成者名は LEFT JOIN で取得する。
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoomListRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub created_by: Option<String>,
    pub created_by_name: Option<String>,
    pub has_password: bool,
}

/// ルームメンバーとユーザ名
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoomMemberRow {
    pub room_id: String,
    pub user_id: String,
    pub joined_at: Timestamp,
    /// ユーザ行が存在しない場合は `None`
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TableRow {
    pub id: String,
    pub room_id: String,
    pub name: String,
    pub status: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SeatRow {
    pub id: String,
    pub table_id: String,
    pub user_id: String,
    pub position: String,
    pub seat_order: i64,
    pub current_score: i64,
    pub joined_at: Timestamp,
    /// LEFT JOIN で取得するユーザ名
    #[sqlx(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GameRow {
    pub id: String,
    pub table_id: String,
    pub round_name: String,
    pub round_number: i64,
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
    pub han: Option<i64>,
    pub fu: Option<i64>,
    pub score: Option<i64>,
    pub is_draw: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MatchRow {
    pub id: String,
    pub table_id: String,
    pub recorded_by: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MatchScoreRow {
    pub match_id: String,
    pub user_id: String,
    pub score: i64,
    pub rank: i64,
}

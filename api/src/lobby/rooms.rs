use jansou_common::code::{RoomCode, RoomPassword, validate_name};
use serde::{Deserialize, Serialize};

use super::users::ensure_user_best_effort;
use super::{live_room, require_member};
use crate::AppState;
use crate::auth::password;
use crate::db;
use crate::db::models::{RecentRoomRow, RoomListRow, RoomMemberRow, RoomRow, TableRow};
use crate::error::AppError;
use crate::events::{ChangeEvent, room_topic};
use crate::types::{RoomId, TableId, UserId};

/// 最近のルーム一覧の件数
pub const RECENT_ROOMS_LIMIT: i64 = 3;

/// 作成者が削除済みのルームに出す名前
pub const UNKNOWN_CREATOR_NAME: &str = "不明";

/// コード自動生成時の試行回数
const CODE_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoom {
    pub name: String,
    /// 省略時は自動生成
    pub code: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomDetail {
    pub room: RoomRow,
    pub has_password: bool,
    pub members: Vec<RoomMemberRow>,
    pub tables: Vec<TableRow>,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// ルームを作成する。入力はすべてDBに触れる前に検証する。
pub async fn create_room(
    state: &AppState,
    user_id: &UserId,
    input: CreateRoom,
) -> Result<RoomRow, AppError> {
    let name = validate_name("name", &input.name)?.to_string();
    let code = input.code.as_deref().map(RoomCode::parse).transpose()?;
    let password = input.password.as_deref().map(RoomPassword::parse).transpose()?;

    let password_hash = match password {
        Some(pw) => Some(password::hash(pw).await?),
        None => None,
    };
    let expires_at = chrono::Utc::now() + state.config.room_ttl();
    let id = RoomId::new_v4();

    match code {
        Some(code) => {
            db::rooms::create_room(
                &state.pool,
                &id,
                code.as_str(),
                &name,
                user_id,
                password_hash.as_deref(),
                expires_at,
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("room code {code} is already in use"))
                } else {
                    AppError::from(e)
                }
            })?;
        }
        None => {
            let mut created = false;
            for _ in 0..CODE_ATTEMPTS {
                let code = RoomCode::generate(&mut rand::thread_rng());
                match db::rooms::create_room(
                    &state.pool,
                    &id,
                    code.as_str(),
                    &name,
                    user_id,
                    password_hash.as_deref(),
                    expires_at,
                )
                .await
                {
                    Ok(()) => {
                        created = true;
                        break;
                    }
                    Err(e) if is_unique_violation(&e) => {
                        tracing::debug!(code = %code, "room code collision, retrying");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if !created {
                return Err(AppError::Conflict(
                    "could not allocate a free room code".into(),
                ));
            }
        }
    }

    let room = db::rooms::get_room(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::Store("created room disappeared".into()))?;
    tracing::info!(room_id = %id, code = %room.code, "room created");
    Ok(room)
}

/// コードでルームに入室する。再入室は何もしない。
pub async fn join_room_by_code(
    state: &AppState,
    user_id: &UserId,
    code: &str,
    password: Option<&str>,
) -> Result<RoomRow, AppError> {
    let room = live_room(state, code).await?;

    if let Some(stored) = room.password_hash.clone() {
        let presented = password
            .ok_or_else(|| AppError::Forbidden("password required".into()))
            .and_then(|p| {
                RoomPassword::parse(p).map_err(|_| AppError::Forbidden("wrong password".into()))
            })?;
        if !password::verify(presented, stored).await? {
            return Err(AppError::Forbidden("wrong password".into()));
        }
    }

    ensure_user_best_effort(&state.pool, user_id, false).await;

    let room_id = RoomId(room.id.clone());
    if db::rooms::add_member(&state.pool, &room_id, user_id).await? {
        tracing::info!(room_id = %room_id, user_id = %user_id, "joined room");
        state.events.publish(
            &room_topic(&room_id),
            ChangeEvent::RoomUpdated {
                room_id: room_id.to_string(),
            },
        );
    }
    Ok(room)
}

/// 有効期限内のルーム一覧（作成が新しい順）。表示用なので失敗時は空で返す。
pub async fn list_rooms(state: &AppState) -> Vec<RoomListRow> {
    match db::rooms::list_live_rooms(&state.pool).await {
        Ok(rooms) => rooms
            .into_iter()
            .map(|mut room| {
                room.created_by_name
                    .get_or_insert_with(|| UNKNOWN_CREATOR_NAME.to_string());
                room
            })
            .collect(),
        Err(e) => {
            tracing::warn!("failed to load rooms: {e}");
            Vec::new()
        }
    }
}

/// 最近入室したルーム。表示用なので失敗時は空で返す。
pub async fn list_recent_rooms(state: &AppState, user_id: &UserId) -> Vec<RecentRoomRow> {
    match db::rooms::get_recent_rooms(&state.pool, user_id, RECENT_ROOMS_LIMIT).await {
        Ok(rooms) => rooms,
        Err(e) => {
            tracing::warn!(user_id = %user_id, "failed to load recent rooms: {e}");
            Vec::new()
        }
    }
}

pub async fn room_detail(
    state: &AppState,
    user_id: &UserId,
    code: &str,
) -> Result<RoomDetail, AppError> {
    let room = live_room(state, code).await?;
    let room_id = RoomId(room.id.clone());
    require_member(state, &room_id, user_id).await?;

    let members = db::rooms::get_members(&state.pool, &room_id).await?;
    let tables = db::tables::get_tables_by_room(&state.pool, &room_id).await?;
    Ok(RoomDetail {
        has_password: room.has_password(),
        room,
        members,
        tables,
    })
}

pub async fn create_table(
    state: &AppState,
    user_id: &UserId,
    code: &str,
    name: &str,
) -> Result<TableRow, AppError> {
    let name = validate_name("name", name)?;
    let room = live_room(state, code).await?;
    let room_id = RoomId(room.id);
    require_member(state, &room_id, user_id).await?;

    let table_id = TableId::new_v4();
    db::tables::create_table(&state.pool, &table_id, &room_id, name).await?;
    let table = db::tables::get_table(&state.pool, &table_id)
        .await?
        .ok_or_else(|| AppError::Store("created table disappeared".into()))?;

    state.events.publish(
        &room_topic(&room_id),
        ChangeEvent::RoomUpdated {
            room_id: room_id.to_string(),
        },
    );
    Ok(table)
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, test_state};

    fn input(name: &str, code: Option<&str>, password: Option<&str>) -> CreateRoom {
        CreateRoom {
            name: name.into(),
            code: code.map(Into::into),
            password: password.map(Into::into),
        }
    }

    async fn room_count(state: &AppState) -> i64 {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms")
            .fetch_one(&state.pool)
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn malformed_codes_are_rejected_before_any_write() {
        let state = test_state().await;
        let user = seed_user(&state.pool, "u1", "Alice").await;

        for bad in ["482", "48210", "48a1", "abcd", ""] {
            let err = create_room(&state, &user, input("R", Some(bad), None))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{bad:?}");

            let err = join_room_by_code(&state, &user, bad, None)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{bad:?}");
        }
        assert_eq!(room_count(&state).await, 0);
    }

    #[tokio::test]
    async fn malformed_password_is_rejected() {
        let state = test_state().await;
        let user = seed_user(&state.pool, "u1", "Alice").await;
        let err = create_room(&state, &user, input("R", Some("4821"), Some("12345")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(room_count(&state).await, 0);
    }

    #[tokio::test]
    async fn generated_code_is_four_digits() {
        let state = test_state().await;
        let user = seed_user(&state.pool, "u1", "Alice").await;
        let room = create_room(&state, &user, input("R", None, None))
            .await
            .unwrap();
        assert!(RoomCode::parse(&room.code).is_ok());
        assert!(room.code.as_str() >= "1000");
    }

    #[tokio::test]
    async fn live_code_conflicts() {
        let state = test_state().await;
        let user = seed_user(&state.pool, "u1", "Alice").await;
        create_room(&state, &user, input("A", Some("4821"), None))
            .await
            .unwrap();
        let err = create_room(&state, &user, input("B", Some("4821"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn join_without_password_succeeds_and_is_idempotent() {
        let state = test_state().await;
        let owner = seed_user(&state.pool, "owner", "Owner").await;
        let guest = seed_user(&state.pool, "guest", "Guest").await;
        create_room(&state, &owner, input("Room", Some("4821"), None))
            .await
            .unwrap();

        join_room_by_code(&state, &guest, "4821", None).await.unwrap();
        join_room_by_code(&state, &guest, "4821", None).await.unwrap();

        let detail = room_detail(&state, &guest, "4821").await.unwrap();
        assert_eq!(
            detail.members.iter().filter(|m| m.user_id == "guest").count(),
            1
        );
        assert_eq!(detail.members.len(), 2);
        assert!(!detail.has_password);
    }

    #[tokio::test]
    async fn password_room_requires_correct_password() {
        let state = test_state().await;
        let owner = seed_user(&state.pool, "owner", "Owner").await;
        let guest = seed_user(&state.pool, "guest", "Guest").await;
        let room = create_room(&state, &owner, input("Room", Some("1234"), Some("0042")))
            .await
            .unwrap();
        assert!(room.has_password());
        assert_ne!(room.password_hash.as_deref(), Some("0042"));

        for wrong in [None, Some("0000"), Some("abc")] {
            let err = join_room_by_code(&state, &guest, "1234", wrong)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{wrong:?}");
        }
        join_room_by_code(&state, &guest, "1234", Some("0042"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_or_expired_room_is_not_found() {
        let state = test_state().await;
        let user = seed_user(&state.pool, "u1", "Alice").await;
        assert!(matches!(
            join_room_by_code(&state, &user, "9999", None).await,
            Err(AppError::NotFound(_))
        ));

        let expired = chrono::Utc::now() - chrono::Duration::hours(1);
        db::rooms::create_room(&state.pool, &RoomId::new_v4(), "5555", "Old", &user, None, expired)
            .await
            .unwrap();
        assert!(matches!(
            join_room_by_code(&state, &user, "5555", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn detail_and_tables_are_member_only() {
        let state = test_state().await;
        let owner = seed_user(&state.pool, "owner", "Owner").await;
        let stranger = seed_user(&state.pool, "x", "Stranger").await;
        create_room(&state, &owner, input("Room", Some("4821"), None))
            .await
            .unwrap();

        assert!(matches!(
            room_detail(&state, &stranger, "4821").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            create_table(&state, &stranger, "4821", "卓").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            create_table(&state, &owner, "4821", "  ").await,
            Err(AppError::Validation(_))
        ));

        let table = create_table(&state, &owner, "4821", "卓1").await.unwrap();
        assert_eq!(table.status, "waiting");
        let detail = room_detail(&state, &owner, "4821").await.unwrap();
        assert_eq!(detail.tables.len(), 1);
    }

    #[tokio::test]
    async fn recent_rooms_are_capped_at_three() {
        let state = test_state().await;
        let user = seed_user(&state.pool, "u1", "Alice").await;
        for code in ["1001", "1002", "1003", "1004"] {
            create_room(&state, &user, input(code, Some(code), None))
                .await
                .unwrap();
        }
        assert_eq!(list_recent_rooms(&state, &user).await.len(), 3);

        state.pool.close().await;
        assert!(list_recent_rooms(&state, &user).await.is_empty());
    }

    #[tokio::test]
    async fn recent_rooms_follow_join_order() {
        let state = test_state().await;
        let owner = seed_user(&state.pool, "owner", "Owner").await;
        let guest = seed_user(&state.pool, "guest", "Guest").await;
        let codes = ["1001", "1002", "1003", "1004"];
        for code in codes {
            create_room(&state, &owner, input(code, Some(code), None))
                .await
                .unwrap();
        }
        for code in codes {
            join_room_by_code(&state, &guest, code, None).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let recent: Vec<_> = list_recent_rooms(&state, &guest)
            .await
            .into_iter()
            .map(|r| r.code)
            .collect();
        assert_eq!(recent, vec!["1004", "1003", "1002"]);
    }

    #[tokio::test]
    async fn room_list_is_newest_first_with_creator_names() {
        let state = test_state().await;
        let alice = seed_user(&state.pool, "alice", "Alice").await;
        let bob = seed_user(&state.pool, "bob", "Bob").await;
        create_room(&state, &alice, input("A", Some("1001"), None))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        create_room(&state, &bob, input("B", Some("1002"), Some("0042")))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let orphan = create_room(&state, &alice, input("C", Some("1003"), None))
            .await
            .unwrap();
        let expired = chrono::Utc::now() - chrono::Duration::hours(1);
        db::rooms::create_room(&state.pool, &RoomId::new_v4(), "5555", "Old", &alice, None, expired)
            .await
            .unwrap();

        // 作成者が消えたルーム
        sqlx::query("UPDATE rooms SET created_by = NULL WHERE id = ?")
            .bind(&orphan.id)
            .execute(&state.pool)
            .await
            .unwrap();

        let rooms = list_rooms(&state).await;
        let codes: Vec<_> = rooms.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["1003", "1002", "1001"]);
        let names: Vec<_> = rooms
            .iter()
            .map(|r| r.created_by_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec![UNKNOWN_CREATOR_NAME, "Bob", "Alice"]);
        assert!(rooms[1].has_password);

        state.pool.close().await;
        assert!(list_rooms(&state).await.is_empty());
    }

    #[tokio::test]
    async fn joining_publishes_room_update() {
        let state = test_state().await;
        let owner = seed_user(&state.pool, "owner", "Owner").await;
        let guest = seed_user(&state.pool, "guest", "Guest").await;
        let room = create_room(&state, &owner, input("Room", Some("4821"), None))
            .await
            .unwrap();
        let mut rx = state
            .events
            .subscribe(&room_topic(&RoomId(room.id.clone())));

        join_room_by_code(&state, &guest, "4821", None).await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::RoomUpdated { room_id: room.id }
        );
    }
}

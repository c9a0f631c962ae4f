use jansou_common::seat::{self, Wind};
use jansou_common::table::TableStatus;
use serde::Serialize;

use super::member_table;
use super::users::{UNKNOWN_USER_NAME, ensure_user_best_effort};
use crate::AppState;
use crate::db;
use crate::db::models::{GameRow, SeatRow, TableRow};
use crate::error::AppError;
use crate::events::ChangeEvent;
use crate::types::{RoomId, SeatId, TableId, UserId, sentinel_email};

#[derive(Debug, Clone, Serialize)]
pub struct TableDetail {
    pub table: TableRow,
    pub players: Vec<SeatRow>,
    pub games: Vec<GameRow>,
}

fn parse_status(table: &TableRow) -> Result<TableStatus, AppError> {
    table
        .status
        .parse()
        .map_err(|_| AppError::Store(format!("unknown table status: {}", table.status)))
}

fn occupied(seats: &[SeatRow]) -> Result<Vec<Wind>, AppError> {
    seats
        .iter()
        .map(|s| {
            s.position
                .parse::<Wind>()
                .map_err(|_| AppError::Store(format!("unknown seat position: {}", s.position)))
        })
        .collect()
}

fn notify(state: &AppState, room_id: &RoomId, table_id: &TableId) {
    state.events.publish_table(
        room_id,
        table_id,
        ChangeEvent::TableUpdated {
            table_id: table_id.to_string(),
        },
    );
}

/// 卓・着席者（席順）・直近の局
pub async fn table_detail(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<TableDetail, AppError> {
    let (table, _) = member_table(state, table_id, user_id).await?;
    let players = db::seats::get_seats(&state.pool, table_id)
        .await?
        .into_iter()
        .map(|mut seat| {
            seat.name.get_or_insert_with(|| UNKNOWN_USER_NAME.to_string());
            seat
        })
        .collect();
    let games =
        db::games::get_recent_games(&state.pool, table_id, db::games::RECENT_GAMES_LIMIT).await?;
    Ok(TableDetail {
        table,
        players,
        games,
    })
}

/// 空いている最初の席（東南西北の順）に着席する。
pub async fn join_table(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<SeatRow, AppError> {
    let (_, room_id) = member_table(state, table_id, user_id).await?;
    ensure_user_best_effort(&state.pool, user_id, false).await;

    let seats = db::seats::get_seats(&state.pool, table_id).await?;
    if seats.iter().any(|s| s.user_id == user_id.as_str()) {
        return Err(AppError::Conflict("already seated at this table".into()));
    }
    let position = seat::first_open_seat(&occupied(&seats)?)?;

    let seat_id = SeatId::new_v4();
    db::seats::insert_seat(&state.pool, &seat_id, table_id, user_id, position).await?;
    tracing::info!(table_id = %table_id, user_id = %user_id, %position, "seated");
    notify(state, &room_id, table_id);

    db::seats::get_seats(&state.pool, table_id)
        .await?
        .into_iter()
        .find(|s| s.id == seat_id.as_str())
        .ok_or_else(|| AppError::Store("inserted seat disappeared".into()))
}

/// 自分の席だけを外し、卓を `waiting` に戻す（残り人数に関わらず）。
pub async fn leave_table(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<TableStatus, AppError> {
    let (table, room_id) = member_table(state, table_id, user_id).await?;
    if !db::seats::delete_seat(&state.pool, table_id, user_id).await? {
        return Err(AppError::NotFound("not seated at this table".into()));
    }
    let status = parse_status(&table)?.after_leave();
    db::tables::update_status(&state.pool, table_id, status).await?;
    tracing::info!(table_id = %table_id, user_id = %user_id, "left table");
    notify(state, &room_id, table_id);
    Ok(status)
}

/// 対局開始。開始者が着席しており、人数が設定値以上であること。
pub async fn start_game(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<TableStatus, AppError> {
    let (table, room_id) = member_table(state, table_id, user_id).await?;
    let seats = db::seats::get_seats(&state.pool, table_id).await?;
    let starter_seated = seats.iter().any(|s| s.user_id == user_id.as_str());

    let current = parse_status(&table)?;
    let next = current.start(
        starter_seated,
        seats.len(),
        state.config.min_players_to_start,
    )?;
    if next != current {
        db::tables::update_status(&state.pool, table_id, next).await?;
        tracing::info!(table_id = %table_id, seated = seats.len(), "game started");
        notify(state, &room_id, table_id);
    }
    Ok(next)
}

async fn seat_bot(
    state: &AppState,
    table_id: &TableId,
    index: usize,
    position: Wind,
) -> Result<SeatId, sqlx::Error> {
    let bot_id = UserId::new_v4();
    let email = sentinel_email(&bot_id, &state.config.bot_email_domain);
    db::users::upsert_user(&state.pool, &bot_id, Some(&email), &seat::bot_name(index), false)
        .await?;
    let seat_id = SeatId::new_v4();
    db::seats::insert_seat(&state.pool, &seat_id, table_id, &bot_id, position).await?;
    Ok(seat_id)
}

/// 空席に BOT を最大3人座らせる。失敗した BOT は飛ばして残りを続ける。
pub async fn add_bots(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<Vec<SeatRow>, AppError> {
    let (table, room_id) = member_table(state, table_id, user_id).await?;
    let seats = db::seats::get_seats(&state.pool, table_id).await?;
    let positions = seat::bot_seats(&occupied(&seats)?)?;
    if parse_status(&table)? != TableStatus::Waiting {
        return Err(AppError::Validation(
            "bots can only be added while the table is waiting".into(),
        ));
    }

    let mut added = Vec::with_capacity(positions.len());
    for (index, position) in positions.into_iter().enumerate() {
        match seat_bot(state, table_id, index, position).await {
            Ok(seat_id) => added.push(seat_id),
            Err(e) => tracing::warn!(table_id = %table_id, %position, "failed to seat bot: {e}"),
        }
    }
    if !added.is_empty() {
        notify(state, &room_id, table_id);
    }

    Ok(db::seats::get_seats(&state.pool, table_id)
        .await?
        .into_iter()
        .filter(|s| added.iter().any(|id| id.as_str() == s.id))
        .collect())
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use super::*;
    use crate::test_support::{seed_room, seed_table, seed_user, test_state};

    struct Fixture {
        state: AppState,
        table: TableId,
        users: Vec<UserId>,
    }

    /// ルーム作成者 u0 と、入室済みの u1..u4
    async fn fixture() -> Fixture {
        let state = test_state().await;
        let mut users = Vec::new();
        for i in 0..5 {
            users.push(seed_user(&state.pool, &format!("u{i}"), &format!("User{i}")).await);
        }
        let room = seed_room(&state.pool, "4821", &users[0]).await;
        for user in &users[1..] {
            db::rooms::add_member(&state.pool, &room, user).await.unwrap();
        }
        let table = seed_table(&state.pool, &room).await;
        Fixture {
            state,
            table,
            users,
        }
    }

    async fn positions(f: &Fixture) -> Vec<(String, String)> {
        db::seats::get_seats(&f.state.pool, &f.table)
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.position, s.user_id))
            .collect()
    }

    #[tokio::test]
    async fn second_player_takes_south() {
        let f = fixture().await;
        let a = join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(a.position, "東");
        assert_eq!(a.seat_order, 1);
        assert_eq!(a.current_score, 25_000);

        let b = join_table(&f.state, &f.users[1], &f.table).await.unwrap();
        assert_eq!(b.position, "南");
        assert_eq!(b.seat_order, 2);
    }

    #[tokio::test]
    async fn seats_never_duplicate() {
        let f = fixture().await;
        for user in &f.users[..4] {
            join_table(&f.state, user, &f.table).await.unwrap();
        }
        assert!(matches!(
            join_table(&f.state, &f.users[0], &f.table).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            join_table(&f.state, &f.users[4], &f.table).await,
            Err(AppError::TableFull)
        ));

        let seats = positions(&f).await;
        assert_eq!(seats.len(), 4);
        let winds: Vec<_> = seats.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(winds, vec!["東", "南", "西", "北"]);
    }

    #[tokio::test]
    async fn non_members_cannot_touch_tables() {
        let f = fixture().await;
        let stranger = seed_user(&f.state.pool, "x", "Stranger").await;
        assert!(matches!(
            join_table(&f.state, &stranger, &f.table).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            table_detail(&f.state, &f.users[0], &TableId::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn leaving_removes_only_own_seat() {
        let f = fixture().await;
        for user in &f.users[..3] {
            join_table(&f.state, user, &f.table).await.unwrap();
        }
        leave_table(&f.state, &f.users[1], &f.table).await.unwrap();

        let seats = positions(&f).await;
        assert_eq!(
            seats,
            vec![
                ("東".to_string(), "u0".to_string()),
                ("西".to_string(), "u2".to_string()),
            ]
        );
        assert!(matches!(
            leave_table(&f.state, &f.users[1], &f.table).await,
            Err(AppError::NotFound(_))
        ));

        // 空いた南は次の参加者が埋める
        let seat = join_table(&f.state, &f.users[3], &f.table).await.unwrap();
        assert_eq!(seat.position, "南");
    }

    #[tokio::test]
    async fn full_table_starts_playing() {
        let f = fixture().await;
        for user in &f.users[..4] {
            join_table(&f.state, user, &f.table).await.unwrap();
        }
        let status = start_game(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(status, TableStatus::Playing);

        let detail = table_detail(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(detail.table.status, "playing");

        // 二度目の開始は playing のまま
        let status = start_game(&f.state, &f.users[1], &f.table).await.unwrap();
        assert_eq!(status, TableStatus::Playing);
    }

    #[tokio::test]
    async fn unseated_member_cannot_start() {
        let f = fixture().await;
        join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        assert!(matches!(
            start_game(&f.state, &f.users[1], &f.table).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn start_respects_min_players() {
        let mut f = fixture().await;
        f.state.config.min_players_to_start = 4;
        join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        assert!(matches!(
            start_game(&f.state, &f.users[0], &f.table).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn leaving_a_playing_table_returns_to_waiting() {
        let f = fixture().await;
        for user in &f.users[..4] {
            join_table(&f.state, user, &f.table).await.unwrap();
        }
        start_game(&f.state, &f.users[0], &f.table).await.unwrap();

        let status = leave_table(&f.state, &f.users[3], &f.table).await.unwrap();
        assert_eq!(status, TableStatus::Waiting);

        let detail = table_detail(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(detail.table.status, "waiting");
        assert_eq!(detail.players.len(), 3);
    }

    #[tokio::test]
    async fn bots_fill_at_most_three_open_seats() {
        let f = fixture().await;
        let bots = add_bots(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(bots.len(), 3);
        let names: Vec<_> = bots.iter().filter_map(|b| b.name.as_deref()).collect();
        assert_eq!(names, vec!["BOT1", "BOT2", "BOT3"]);

        // 人間用に北が残る
        let seat = join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(seat.position, "北");

        assert!(matches!(
            add_bots(&f.state, &f.users[0], &f.table).await,
            Err(AppError::TableFull)
        ));
    }

    #[tokio::test]
    async fn bots_never_overwrite_seats() {
        let f = fixture().await;
        join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        join_table(&f.state, &f.users[1], &f.table).await.unwrap();

        let bots = add_bots(&f.state, &f.users[0], &f.table).await.unwrap();
        assert_eq!(bots.len(), 2);

        let seats = positions(&f).await;
        assert_eq!(seats.len(), 4);
        assert_eq!(seats[0], ("東".to_string(), "u0".to_string()));
        assert_eq!(seats[1], ("南".to_string(), "u1".to_string()));

        let bot = db::users::get_user(&f.state.pool, &UserId(seats[2].1.clone()))
            .await
            .unwrap()
            .unwrap();
        assert!(bot.email.unwrap().ends_with("@bot.example.com"));
    }

    #[tokio::test]
    async fn bots_require_waiting_table() {
        let f = fixture().await;
        join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        start_game(&f.state, &f.users[0], &f.table).await.unwrap();
        assert!(matches!(
            add_bots(&f.state, &f.users[0], &f.table).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn seat_changes_are_published() {
        let f = fixture().await;
        let mut rx = f
            .state
            .events
            .subscribe(&crate::events::table_topic(&f.table));
        join_table(&f.state, &f.users[0], &f.table).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            ChangeEvent::TableUpdated { .. }
        ));
    }
}

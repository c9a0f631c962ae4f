use jansou_common::record::{MatchEntry, RoundRecord, validate_match_entries};

use super::member_table;
use crate::AppState;
use crate::db;
use crate::db::matches::MatchWithScores;
use crate::db::models::GameRow;
use crate::error::AppError;
use crate::events::ChangeEvent;
use crate::types::{GameId, MatchId, TableId, UserId};

/// 1局の結果を追記する。
pub async fn record_game(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
    round: RoundRecord,
) -> Result<GameRow, AppError> {
    round.validate()?;
    let (_, room_id) = member_table(state, table_id, user_id).await?;

    let seats = db::seats::get_seats(&state.pool, table_id).await?;
    let unseated = round
        .participants()
        .into_iter()
        .any(|id| !seats.iter().any(|s| s.user_id == id));
    if unseated {
        return Err(AppError::Validation(
            "winner and loser must be seated at this table".into(),
        ));
    }

    let game_id = GameId::new_v4();
    db::games::insert_game(&state.pool, &game_id, table_id, &round).await?;
    state.events.publish_table(
        &room_id,
        table_id,
        ChangeEvent::GameRecorded {
            table_id: table_id.to_string(),
        },
    );

    db::games::get_game(&state.pool, &game_id)
        .await?
        .ok_or_else(|| AppError::Store("recorded game disappeared".into()))
}

/// 半荘結果を記録する。ヘッダとスコアは全件成功か全件失敗。
pub async fn record_match(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
    entries: Vec<MatchEntry>,
) -> Result<MatchWithScores, AppError> {
    validate_match_entries(&entries)?;
    let (_, room_id) = member_table(state, table_id, user_id).await?;

    let match_id = MatchId::new_v4();
    db::matches::insert_match(&state.pool, &match_id, table_id, user_id, &entries).await?;
    tracing::info!(table_id = %table_id, match_id = %match_id, players = entries.len(), "match recorded");
    state.events.publish_table(
        &room_id,
        table_id,
        ChangeEvent::MatchRecorded {
            table_id: table_id.to_string(),
        },
    );

    db::matches::get_matches(&state.pool, table_id)
        .await?
        .into_iter()
        .find(|m| m.header.id == match_id.as_str())
        .ok_or_else(|| AppError::Store("recorded match disappeared".into()))
}

pub async fn list_games(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<Vec<GameRow>, AppError> {
    member_table(state, table_id, user_id).await?;
    Ok(
        db::games::get_recent_games(&state.pool, table_id, db::games::RECENT_GAMES_LIMIT)
            .await?,
    )
}

pub async fn list_matches(
    state: &AppState,
    user_id: &UserId,
    table_id: &TableId,
) -> Result<Vec<MatchWithScores>, AppError> {
    member_table(state, table_id, user_id).await?;
    Ok(db::matches::get_matches(&state.pool, table_id).await?)
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use jansou_common::record::{MatchEntry, RoundRecord};
use jansou_common::table::TableStatus;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::SessionContext;
use crate::db::matches::MatchWithScores;
use crate::db::models::{GameRow, SeatRow};
use crate::error::AppError;
use crate::lobby::{records, tables};
use crate::types::TableId;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/table/{id}", get(table_detail))
        .route("/table/{id}/join", post(join_table))
        .route("/table/{id}/leave", post(leave_table))
        .route("/table/{id}/bots", post(add_bots))
        .route("/table/{id}/start", post(start_game))
        .route("/table/{id}/game", get(list_games).post(record_game))
        .route("/table/{id}/match", get(list_matches).post(record_match))
}

#[derive(Serialize)]
struct StatusResponse {
    status: TableStatus,
}

#[derive(Deserialize)]
struct RecordMatchBody {
    scores: Vec<MatchEntry>,
}

async fn table_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<tables::TableDetail>, AppError> {
    let table_id = TableId(id);
    Ok(Json(
        tables::table_detail(&state, &session.user_id, &table_id).await?,
    ))
}

async fn join_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<SeatRow>, AppError> {
    let table_id = TableId(id);
    Ok(Json(
        tables::join_table(&state, &session.user_id, &table_id).await?,
    ))
}

async fn leave_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<StatusResponse>, AppError> {
    let table_id = TableId(id);
    let status = tables::leave_table(&state, &session.user_id, &table_id).await?;
    Ok(Json(StatusResponse { status }))
}

async fn add_bots(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<Vec<SeatRow>>, AppError> {
    let table_id = TableId(id);
    Ok(Json(
        tables::add_bots(&state, &session.user_id, &table_id).await?,
    ))
}

async fn start_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<StatusResponse>, AppError> {
    let table_id = TableId(id);
    let status = tables::start_game(&state, &session.user_id, &table_id).await?;
    Ok(Json(StatusResponse { status }))
}

async fn list_games(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<Vec<GameRow>>, AppError> {
    let table_id = TableId(id);
    Ok(Json(
        records::list_games(&state, &session.user_id, &table_id).await?,
    ))
}

async fn record_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
    Json(body): Json<RoundRecord>,
) -> Result<(StatusCode, Json<GameRow>), AppError> {
    let table_id = TableId(id);
    let game = records::record_game(&state, &session.user_id, &table_id, body).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn list_matches(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Json<Vec<MatchWithScores>>, AppError> {
    let table_id = TableId(id);
    Ok(Json(
        records::list_matches(&state, &session.user_id, &table_id).await?,
    ))
}

async fn record_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
    Json(body): Json<RecordMatchBody>,
) -> Result<(StatusCode, Json<MatchWithScores>), AppError> {
    let table_id = TableId(id);
    let recorded = records::record_match(&state, &session.user_id, &table_id, body.scores).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

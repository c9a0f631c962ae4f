use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::AppState;
use crate::auth::SessionContext;
use crate::db::models::{RecentRoomRow, RoomListRow, RoomRow, TableRow};
use crate::error::AppError;
use crate::lobby::rooms::{self, CreateRoom, RoomDetail};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/room", get(list_rooms).post(create_room))
        .route("/room/recent", get(recent_rooms))
        .route("/room/{code}", get(room_detail))
        .route("/room/{code}/join", post(join_room))
        .route("/room/{code}/table", post(create_table))
}

#[derive(Deserialize, Default)]
struct JoinRoomBody {
    password: Option<String>,
}

#[derive(Deserialize)]
struct CreateTableBody {
    name: String,
}

async fn create_room(
    State(state): State<AppState>,
    session: SessionContext,
    Json(body): Json<CreateRoom>,
) -> Result<(StatusCode, Json<RoomRow>), AppError> {
    let room = rooms::create_room(&state, &session.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn list_rooms(
    State(state): State<AppState>,
    _session: SessionContext,
) -> Json<Vec<RoomListRow>> {
    Json(rooms::list_rooms(&state).await)
}

async fn recent_rooms(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<Vec<RecentRoomRow>> {
    Json(rooms::list_recent_rooms(&state, &session.user_id).await)
}

async fn room_detail(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: SessionContext,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(
        rooms::room_detail(&state, &session.user_id, &code).await?,
    ))
}

/// パスワードなしのルームには空ボディでも入室できる。
async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: SessionContext,
    body: Bytes,
) -> Result<Json<RoomRow>, AppError> {
    let body: JoinRoomBody = if body.is_empty() {
        JoinRoomBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("invalid request body: {e}")))?
    };
    let room =
        rooms::join_room_by_code(&state, &session.user_id, &code, body.password.as_deref())
            .await?;
    Ok(Json(room))
}

async fn create_table(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: SessionContext,
    Json(body): Json<CreateTableBody>,
) -> Result<(StatusCode, Json<TableRow>), AppError> {
    let table = rooms::create_table(&state, &session.user_id, &code, &body.name).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

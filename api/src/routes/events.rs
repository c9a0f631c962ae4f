use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::get;
use axum::Router;
use futures_util::Stream;

use crate::AppState;
use crate::auth::SessionContext;
use crate::error::AppError;
use crate::events::{room_topic, sse_stream, table_topic};
use crate::lobby::{live_room, member_table, require_member};
use crate::types::{RoomId, TableId};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/room/{code}/events", get(room_events))
        .route("/table/{id}/events", get(table_events))
}

/// ルームの変更通知（メンバーのみ）
async fn room_events(
    State(state): State<AppState>,
    Path(code): Path<String>,
    session: SessionContext,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let room = live_room(&state, &code).await?;
    let room_id = RoomId(room.id);
    require_member(&state, &room_id, &session.user_id).await?;

    let rx = state.events.subscribe(&room_topic(&room_id));
    Ok(Sse::new(sse_stream(rx)).keep_alive(KeepAlive::default()))
}

async fn table_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: SessionContext,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let table_id = TableId(id);
    member_table(&state, &table_id, &session.user_id).await?;

    let rx = state.events.subscribe(&table_topic(&table_id));
    Ok(Sse::new(sse_stream(rx)).keep_alive(KeepAlive::default()))
}

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{SessionContext, require_service_key};
use crate::db::models::UserRow;
use crate::error::AppError;
use crate::lobby::users;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(sign_in).delete(sign_out))
        .route("/session/guest", post(sign_in_guest))
        .route("/user/me", get(me))
}

#[derive(Deserialize)]
struct SignInBody {
    id: String,
    email: String,
    name: String,
}

#[derive(Deserialize)]
struct GuestBody {
    name: String,
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user: UserRow,
}

/// IDプロバイダ経由のサインイン（サービス鍵で保護）
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SignInBody>,
) -> Result<Json<SessionResponse>, AppError> {
    require_service_key(&headers, &state.config)?;
    let (token, user) = users::sign_in(&state, &body.id, &body.email, &body.name).await?;
    Ok(Json(SessionResponse { token, user }))
}

async fn sign_in_guest(
    State(state): State<AppState>,
    Json(body): Json<GuestBody>,
) -> Result<Json<SessionResponse>, AppError> {
    let (token, user) = users::sign_in_guest(&state, &body.name).await?;
    Ok(Json(SessionResponse { token, user }))
}

async fn sign_out(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<StatusCode, AppError> {
    users::sign_out(&state, &session.token_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<UserRow>, AppError> {
    Ok(Json(users::me(&state, &session.user_id).await?))
}

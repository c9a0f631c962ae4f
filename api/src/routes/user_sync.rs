use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::AppState;
use crate::auth::require_service_key;
use crate::db;
use crate::error::AppError;
use crate::lobby::users::validate_profile;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/user-sync",
        post(user_sync).fallback(method_not_allowed),
    )
}

#[derive(Deserialize)]
struct UserSyncBody {
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

fn missing() -> AppError {
    AppError::Validation("Missing user data".into())
}

fn required(value: Option<String>) -> Result<String, AppError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(missing)
}

/// 外部IDプロバイダからのプロフィール同期（IDキーでupsert）。
/// JSONとして読めない本文は 500 でパースエラーを返す。
async fn user_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    require_service_key(&headers, &state.config)?;

    let body: UserSyncBody = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("user sync body is not JSON: {e}");
        AppError::Store(e.to_string())
    })?;
    let id = required(body.id)?;
    let email = required(body.email)?;
    let name = required(body.name)?;

    let profile = validate_profile(&id, &email, &name)?;
    // このエンドポイントだけはストアのエラー内容をそのまま返す
    db::users::upsert_user(
        &state.pool,
        &profile.id,
        Some(profile.email),
        profile.name,
        false,
    )
    .await
    .map_err(|e| {
        tracing::warn!(user_id = %profile.id, "user sync failed: {e}");
        AppError::Store(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "message": "User synced successfully",
    })))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub mod password;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::AppState;
use crate::config::AppConfig;
use crate::db;
use crate::db::Db;
use crate::error::AppError;
use crate::types::UserId;

/// セッショントークンのバイト長（base64化前）
const TOKEN_BYTES: usize = 32;

/// Session resolved from the `Authorization: Bearer <token>` header.
///
/// The token itself is never stored; the server keeps only its SHA-256 hash
/// and looks the session up by that hash on every request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: UserId,
    pub is_guest: bool,
    /// ログアウト時の削除キー
    pub token_hash: String,
}

/// `Bearer <token>` 形式のヘッダからトークン部分を取り出す。
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".into()))?;

    let mut parts = value.split_ascii_whitespace();
    if parts.next() != Some("Bearer") {
        return Err(AppError::Unauthorized(
            "authorization must be Bearer".into(),
        ));
    }
    match (parts.next(), parts.next()) {
        (Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AppError::Unauthorized("malformed bearer token".into())),
    }
}

/// 新しいセッショントークンを生成する。
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

fn to_hex(data: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

/// サービス鍵が設定されていれば、Bearer トークンとして一致することを要求する。
pub(crate) fn require_service_key(headers: &HeaderMap, config: &AppConfig) -> Result<(), AppError> {
    let Some(expected) = config.service_key.as_deref() else {
        return Ok(());
    };
    let presented = bearer_token(headers)?;
    if presented != expected {
        return Err(AppError::Unauthorized("invalid service key".into()));
    }
    Ok(())
}

/// トークンを発行し、ハッシュだけを保存する。戻り値は平文トークン。
pub(crate) async fn issue_session(
    pool: &Db,
    config: &AppConfig,
    user_id: &UserId,
    is_guest: bool,
) -> Result<String, AppError> {
    let token = generate_token();
    let expires_at = chrono::Utc::now() + config.session_ttl();
    db::sessions::create_session(pool, &hash_token(&token), user_id, is_guest, expires_at).await?;
    Ok(token)
}

pub(crate) async fn authenticate(pool: &Db, token: &str) -> Result<SessionContext, AppError> {
    let token_hash = hash_token(token);
    let session = db::sessions::get_live_session(pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("session does not exist".into()))?;
    Ok(SessionContext {
        user_id: UserId(session.user_id),
        is_guest: session.is_guest,
        token_hash,
    })
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        authenticate(&state.pool, token).await
    }
}

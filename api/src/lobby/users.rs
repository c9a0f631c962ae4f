use jansou_common::code::validate_name;

use crate::AppState;
use crate::auth;
use crate::db;
use crate::db::Db;
use crate::db::models::UserRow;
use crate::error::AppError;
use crate::types::{UserId, sentinel_email};

/// ユーザ行が見つからないときの表示名
pub const UNKNOWN_USER_NAME: &str = "Unknown User";

/// 失敗しても処理を続ける書き込みの結果。`Degraded` は常に warn で記録済み。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    Degraded(String),
}

/// 外部IDプロバイダから渡されたプロフィール
#[derive(Debug, Clone)]
pub struct Profile<'a> {
    pub id: UserId,
    pub email: &'a str,
    pub name: &'a str,
}

pub fn validate_profile<'a>(
    id: &str,
    email: &'a str,
    name: &'a str,
) -> Result<Profile<'a>, AppError> {
    let id = UserId::validate(id).map_err(AppError::Validation)?;
    let name = validate_name("name", name)?;
    let email = validate_name("email", email)?;
    Ok(Profile { id, email, name })
}

/// 外部IDプロバイダのプロフィールを検証して upsert する。
pub async fn sync_profile(
    pool: &Db,
    id: &str,
    email: &str,
    name: &str,
) -> Result<UserId, AppError> {
    let profile = validate_profile(id, email, name)?;
    db::users::upsert_user(pool, &profile.id, Some(profile.email), profile.name, false).await?;
    Ok(profile.id)
}

/// ユーザ行がなければ作る。失敗しても呼び出し元の処理は止めない。
pub async fn ensure_user_best_effort(pool: &Db, user_id: &UserId, is_guest: bool) -> SyncOutcome {
    match db::users::insert_user_if_missing(pool, user_id, None, UNKNOWN_USER_NAME, is_guest).await
    {
        Ok(_) => SyncOutcome::Synced,
        Err(e) => {
            tracing::warn!(user_id = %user_id, "failed to ensure user row: {e}");
            SyncOutcome::Degraded(e.to_string())
        }
    }
}

async fn fetch_user(pool: &Db, user_id: &UserId) -> Result<UserRow, AppError> {
    db::users::get_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))
}

/// プロバイダ認証済みユーザのサインイン。プロフィールを同期してセッションを発行する。
pub async fn sign_in(
    state: &AppState,
    id: &str,
    email: &str,
    name: &str,
) -> Result<(String, UserRow), AppError> {
    let user_id = sync_profile(&state.pool, id, email, name).await?;
    let token = auth::issue_session(&state.pool, &state.config, &user_id, false).await?;
    let user = fetch_user(&state.pool, &user_id).await?;
    tracing::info!(user_id = %user_id, "signed in");
    Ok((token, user))
}

/// ゲストユーザを作成してセッションを発行する。
pub async fn sign_in_guest(state: &AppState, name: &str) -> Result<(String, UserRow), AppError> {
    let name = validate_name("name", name)?;
    let user_id = UserId::new_v4();
    let email = sentinel_email(&user_id, &state.config.guest_email_domain);
    db::users::upsert_user(&state.pool, &user_id, Some(&email), name, true).await?;
    let token = auth::issue_session(&state.pool, &state.config, &user_id, true).await?;
    let user = fetch_user(&state.pool, &user_id).await?;
    tracing::info!(user_id = %user_id, "guest signed in");
    Ok((token, user))
}

pub async fn sign_out(state: &AppState, token_hash: &str) -> Result<(), AppError> {
    db::sessions::delete_session(&state.pool, token_hash).await?;
    Ok(())
}

pub async fn me(state: &AppState, user_id: &UserId) -> Result<UserRow, AppError> {
    fetch_user(&state.pool, user_id).await
}

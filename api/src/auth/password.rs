//! ルームパスワードのハッシュ化と照合（argon2）。
//! 4桁しかないため総当たりには弱いが、平文では保存しない。

use argon2::password_hash::{Encoding, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jansou_common::code::RoomPassword;
use rand::rngs::OsRng;

use crate::error::AppError;

fn hash_blocking(password: &RoomPassword) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Store(format!("failed to hash password: {e}")))
}

fn verify_blocking(password: &RoomPassword, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::parse(stored, Encoding::default())
        .map_err(|e| AppError::Store(format!("invalid stored password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// argon2 は CPU を使うため blocking スレッドで実行する。
pub async fn hash(password: RoomPassword) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| AppError::Store(format!("password task failed: {e}")))?
}

pub async fn verify(password: RoomPassword, stored: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored))
        .await
        .map_err(|e| AppError::Store(format!("password task failed: {e}")))?
}

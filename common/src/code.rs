use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::JansouError;

/// ルームコード・ルームパスワードの桁数
pub const CODE_LEN: usize = 4;

fn is_four_digits(s: &str) -> bool {
    s.len() == CODE_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

/// 4桁の数字からなるルームコード。
///
/// 人が入力する唯一の識別子なので、先頭の `0` も含めて文字列として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    pub fn parse(s: &str) -> Result<Self, JansouError> {
        if !is_four_digits(s) {
            return Err(JansouError::Validation(
                "room code must be exactly 4 digits".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// `1000..=9999` からランダムにコードを生成する。
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(1000..=9999u16).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = JansouError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// ルームの入室パスワード（4桁の数字）。
///
/// Debug 出力では値を伏せる。
#[derive(Clone, PartialEq, Eq)]
pub struct RoomPassword(String);

impl RoomPassword {
    pub fn parse(s: &str) -> Result<Self, JansouError> {
        if !is_four_digits(s) {
            return Err(JansouError::Validation(
                "password must be exactly 4 digits".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for RoomPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RoomPassword(****)")
    }
}

/// 空白のみの名前を拒否し、前後の空白を除いた値を返す。
pub fn validate_name<'a>(field: &str, s: &'a str) -> Result<&'a str, JansouError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(JansouError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed)
}

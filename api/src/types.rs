use serde::{Deserialize, Serialize};

macro_rules! newtype_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new_v4() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

newtype_id!(UserId);
newtype_id!(RoomId);
newtype_id!(TableId);
newtype_id!(SeatId);
newtype_id!(GameId);
newtype_id!(MatchId);

impl UserId {
    /// 外部IDプロバイダから渡されたIDを検証する。空・空白のみ・制御文字は拒否。
    pub fn validate(s: &str) -> Result<Self, String> {
        if s.trim().is_empty() {
            return Err("user ID must not be empty".into());
        }
        if s.len() > 128 {
            return Err("user ID is too long".into());
        }
        if s.chars().any(char::is_control) {
            return Err("user ID contains invalid characters".into());
        }
        Ok(Self(s.to_string()))
    }
}

/// 合成ユーザ（ゲスト・BOT）のメールアドレスを `{id}@{domain}` 形式で生成する。
pub fn sentinel_email(id: &UserId, domain: &str) -> String {
    format!("{}@{}", id.as_str(), domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_blank() {
        assert!(UserId::validate("").is_err());
        assert!(UserId::validate("   ").is_err());
    }

    #[test]
    fn validate_rejects_control_chars() {
        assert!(UserId::validate("abc\n").is_err());
    }

    #[test]
    fn validate_accepts_provider_ids() {
        let id = UserId::validate("8a6e0804-2bd0-4672-b79d-d97027f9071a").unwrap();
        assert_eq!(id.as_str(), "8a6e0804-2bd0-4672-b79d-d97027f9071a");
    }

    #[test]
    fn sentinel_email_format() {
        let id = UserId("abc".into());
        assert_eq!(sentinel_email(&id, "guest.local"), "abc@guest.local");
    }

    #[test]
    fn new_v4_ids_are_unique() {
        assert_ne!(TableId::new_v4(), TableId::new_v4());
    }
}

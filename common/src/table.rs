use serde::{Deserialize, Serialize};

use crate::error::JansouError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Waiting,
    Playing,
}

impl TableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
        }
    }

    /// 対局開始の遷移。
    ///
    /// 開始者が着席していること、着席人数が `min_players` 以上であることを要求する。
    /// 既に `playing` の卓はそのまま `playing` を返す。
    pub fn start(
        self,
        starter_seated: bool,
        seated_count: usize,
        min_players: usize,
    ) -> Result<TableStatus, JansouError> {
        if !starter_seated {
            return Err(JansouError::NotSeated);
        }
        if seated_count < min_players.max(1) {
            return Err(JansouError::Validation(format!(
                "at least {} seated player(s) required to start",
                min_players.max(1)
            )));
        }
        Ok(TableStatus::Playing)
    }

    /// 誰かが退席したあとの状態。残り人数に関わらず `waiting` に戻る。
    pub fn after_leave(self) -> TableStatus {
        TableStatus::Waiting
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TableStatus {
    type Err = JansouError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "waiting" => Ok(Self::Waiting),
            "playing" => Ok(Self::Playing),
            other => Err(JansouError::Validation(format!(
                "unknown table status: {other}"
            ))),
        }
    }
}

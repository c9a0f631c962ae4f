use serde::{Deserialize, Serialize};

use crate::error::JansouError;

/// 着席時の持ち点
pub const STARTING_SCORE: i64 = 25_000;

/// 一度に追加できるBOTの上限。最低1席は人間用に残る。
pub const MAX_BOTS: usize = 3;

/// 卓の座席（風）。並び順は東南西北で固定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wind {
    #[serde(rename = "東")]
    East,
    #[serde(rename = "南")]
    South,
    #[serde(rename = "西")]
    West,
    #[serde(rename = "北")]
    North,
}

impl Wind {
    pub const ALL: [Wind; 4] = [Wind::East, Wind::South, Wind::West, Wind::North];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::East => "東",
            Self::South => "南",
            Self::West => "西",
            Self::North => "北",
        }
    }

    /// 1始まりの席順
    pub fn seat_order(self) -> i64 {
        match self {
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
            Self::North => 4,
        }
    }
}

impl std::fmt::Display for Wind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Wind {
    type Err = JansouError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| JansouError::Validation(format!("unknown seat position: {s}")))
    }
}

/// 空いている席を東南西北の順で返す。
pub fn open_seats(occupied: &[Wind]) -> Vec<Wind> {
    Wind::ALL
        .into_iter()
        .filter(|w| !occupied.contains(w))
        .collect()
}

/// 参加者に割り当てる席。固定順で最初の空席を選ぶ（ランダムではない）。
pub fn first_open_seat(occupied: &[Wind]) -> Result<Wind, JansouError> {
    open_seats(occupied)
        .into_iter()
        .next()
        .ok_or(JansouError::TableFull)
}

/// BOTに割り当てる席の一覧。`min(空席数, MAX_BOTS)` 件。
pub fn bot_seats(occupied: &[Wind]) -> Result<Vec<Wind>, JansouError> {
    let mut seats = open_seats(occupied);
    if seats.is_empty() {
        return Err(JansouError::TableFull);
    }
    seats.truncate(MAX_BOTS);
    Ok(seats)
}

/// BOTの表示名（1始まり）
pub fn bot_name(index: usize) -> String {
    format!("BOT{}", index + 1)
}

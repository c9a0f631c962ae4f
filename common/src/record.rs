//! 対局結果の入力検証。点数計算（翻・符・役）は行わず、形だけを確認する。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::JansouError;

/// 1卓あたりの最大人数
pub const MAX_PLAYERS: usize = 4;

/// 符の下限（七対子の25符を含め、20未満は存在しない）
const MIN_FU: i64 = 20;

/// 半荘終了時の1人分の成績
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub user_id: String,
    pub score: i64,
    pub rank: i64,
}

/// 半荘結果の検証: 1〜4人、ユーザ重複なし、順位は `1..=人数`。
pub fn validate_match_entries(entries: &[MatchEntry]) -> Result<(), JansouError> {
    if entries.is_empty() {
        return Err(JansouError::Validation(
            "at least one player score is required".into(),
        ));
    }
    if entries.len() > MAX_PLAYERS {
        return Err(JansouError::Validation(format!(
            "at most {MAX_PLAYERS} player scores are allowed"
        )));
    }
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.user_id.trim().is_empty() {
            return Err(JansouError::Validation("user_id must not be empty".into()));
        }
        if !seen.insert(entry.user_id.as_str()) {
            return Err(JansouError::Validation(format!(
                "duplicate player in match: {}",
                entry.user_id
            )));
        }
        let max_rank = entries.len() as i64;
        if !(1..=max_rank).contains(&entry.rank) {
            return Err(JansouError::Validation(format!(
                "rank must be between 1 and {max_rank}"
            )));
        }
    }
    Ok(())
}

/// 1局の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundOutcome {
    /// 和了。`loser_id` がなければツモ。
    Win {
        winner_id: String,
        loser_id: Option<String>,
        han: Option<i64>,
        fu: Option<i64>,
        score: i64,
    },
    /// 流局
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_name: String,
    pub round_number: i64,
    pub outcome: RoundOutcome,
}

/// `games` テーブルの列に対応する値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundColumns<'a> {
    pub winner_id: Option<&'a str>,
    pub loser_id: Option<&'a str>,
    pub han: Option<i64>,
    pub fu: Option<i64>,
    pub score: Option<i64>,
    pub is_draw: bool,
}

impl RoundRecord {
    pub fn validate(&self) -> Result<(), JansouError> {
        if self.round_name.trim().is_empty() {
            return Err(JansouError::Validation(
                "round_name must not be blank".into(),
            ));
        }
        if self.round_number < 1 {
            return Err(JansouError::Validation(
                "round_number must be at least 1".into(),
            ));
        }
        if let RoundOutcome::Win {
            winner_id,
            loser_id,
            han,
            fu,
            score,
        } = &self.outcome
        {
            if winner_id.trim().is_empty() {
                return Err(JansouError::Validation("winner_id is required".into()));
            }
            if loser_id.as_deref() == Some(winner_id.as_str()) {
                return Err(JansouError::Validation(
                    "winner and loser must differ".into(),
                ));
            }
            if han.is_some_and(|h| h < 1) {
                return Err(JansouError::Validation("han must be at least 1".into()));
            }
            if fu.is_some_and(|f| f < MIN_FU) {
                return Err(JansouError::Validation(format!(
                    "fu must be at least {MIN_FU}"
                )));
            }
            if *score <= 0 {
                return Err(JansouError::Validation("score must be positive".into()));
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> RoundColumns<'_> {
        match &self.outcome {
            RoundOutcome::Win {
                winner_id,
                loser_id,
                han,
                fu,
                score,
            } => RoundColumns {
                winner_id: Some(winner_id.as_str()),
                loser_id: loser_id.as_deref(),
                han: *han,
                fu: *fu,
                score: Some(*score),
                is_draw: false,
            },
            RoundOutcome::Draw => RoundColumns {
                winner_id: None,
                loser_id: None,
                han: None,
                fu: None,
                score: None,
                is_draw: true,
            },
        }
    }

    /// 結果に登場するユーザID（和了者・放銃者）
    pub fn participants(&self) -> Vec<&str> {
        let cols = self.columns();
        cols.winner_id.into_iter().chain(cols.loser_id).collect()
    }
}

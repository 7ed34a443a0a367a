//! State - クレームプロセスの状態
//!
//! # 状態遷移
//! - Uninitialized → Running: 最初の step で cursor / max_claims を設定
//! - Running → Finished: cursor が max_claims に達した次の step
//! - Finished は終端（以降の step は状態を変更しない）

use serde::{Deserialize, Serialize};

/// ClaimPhase は ClaimState から導出されるフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPhase {
    Uninitialized,
    Running,
    Finished,
}

/// 直近の tick の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    Claimed { index: usize },
    Contended { index: usize },
    Finished,
}

/// ClaimState は Driver が tick 間で持ち回る状態
///
/// `cursor` / `max_claims` / `finished` / `initialized` が状態機械の本体で、
/// `claimed` / `contended` / `last_outcome` は実行結果の集計です。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimState {
    pub cursor: usize,
    pub max_claims: usize,
    pub finished: bool,
    pub initialized: bool,
    pub claimed: usize,
    pub contended: usize,
    pub last_outcome: Option<TickOutcome>,
}

impl ClaimState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ClaimPhase {
        if self.finished {
            ClaimPhase::Finished
        } else if self.initialized {
            ClaimPhase::Running
        } else {
            ClaimPhase::Uninitialized
        }
    }
}

//! Events - クレーム状態の変化イベント
//!
//! Presenter に通知される内容を値として表現したものです。
//! RecordingPresenter がログとして保持し、CLI が JSON で出力します。

use serde::{Deserialize, Serialize};

/// ClaimEvent はチケット 1 枚の状態変化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClaimEvent {
    /// クレーム成功（available: false）
    Claimed { index: usize },
    /// 取得済みチケットへの試行（一時的なパルス開始）
    AttemptFailed { index: usize },
    /// パルスの表示期間が終了
    AttemptCleared { index: usize },
}

impl ClaimEvent {
    pub fn index(&self) -> usize {
        match self {
            ClaimEvent::Claimed { index }
            | ClaimEvent::AttemptFailed { index }
            | ClaimEvent::AttemptCleared { index } => *index,
        }
    }
}

//! ClaimProcess - tick ごとのクレーム状態機械
//!
//! # フロー（1 tick）
//! 1. 未初期化なら cursor = 0, max_claims を設定
//! 2. cursor < max_claims なら Registry::claim_ticket_by_index(cursor)
//!    - AlreadyClaimed: 次の index へ（同じ index は再試行しない）
//!    - 成功: AdvancePolicy に従う
//!    - 致命的エラー: Err を返して実行を中断
//! 3. そうでなければ finished = true

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{ClaimError, ClaimState, TickOutcome};
use crate::registry::Registry;

/// Default bound on indices attempted per run.
pub const DEFAULT_MAX_CLAIMS: usize = 10;

/// ClaimProcess は 1 tick 分の状態遷移
///
/// 状態は Driver が所有し、値として受け渡します。
pub trait ClaimProcess: Send + Sync {
    fn step(&self, registry: &Registry, state: ClaimState) -> Result<ClaimState, ClaimError>;
}

/// 成功したクレームの後に cursor を進めるかどうか
///
/// 1 つのプロセスはどちらか一方だけを使います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// 成功でも失敗でも次の index へ
    #[default]
    Always,
    /// 失敗したときだけ進む。成功した index は次の tick で再試行され、
    /// AlreadyClaimed になってから進む
    OnFailure,
}

/// 0..max_claims を順に取りに行く基本プロセス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicClaimProcess {
    max_claims: usize,
    advance: AdvancePolicy,
}

impl BasicClaimProcess {
    pub fn new(max_claims: usize, advance: AdvancePolicy) -> Self {
        Self {
            max_claims,
            advance,
        }
    }

    pub fn max_claims(&self) -> usize {
        self.max_claims
    }

    pub fn advance(&self) -> AdvancePolicy {
        self.advance
    }

    /// Upper bound on ticks until `finished`, counting the finishing tick.
    pub fn max_ticks(&self) -> usize {
        match self.advance {
            AdvancePolicy::Always => self.max_claims + 1,
            AdvancePolicy::OnFailure => 2 * self.max_claims + 1,
        }
    }
}

impl Default for BasicClaimProcess {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLAIMS, AdvancePolicy::default())
    }
}

impl ClaimProcess for BasicClaimProcess {
    fn step(&self, registry: &Registry, mut state: ClaimState) -> Result<ClaimState, ClaimError> {
        if state.finished {
            return Ok(state);
        }

        if !state.initialized {
            state.cursor = 0;
            state.max_claims = self.max_claims;
            state.initialized = true;
        }

        if state.cursor < state.max_claims {
            let index = state.cursor;
            match registry.claim_ticket_by_index(index) {
                Ok(()) => {
                    state.claimed += 1;
                    state.last_outcome = Some(TickOutcome::Claimed { index });
                    if self.advance == AdvancePolicy::Always {
                        state.cursor += 1;
                    }
                }
                Err(err) if !err.is_fatal() => {
                    state.contended += 1;
                    state.last_outcome = Some(TickOutcome::Contended { index });
                    state.cursor += 1;
                }
                Err(err) => return Err(err),
            }
            trace!(index, cursor = state.cursor, "claim step");
        } else {
            state.finished = true;
            state.last_outcome = Some(TickOutcome::Finished);
        }

        Ok(state)
    }
}

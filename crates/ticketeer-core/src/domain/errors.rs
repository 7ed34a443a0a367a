//! Errors - エラー型と分類
//!
//! クレームの失敗は 2 種類に分かれます。
//! - 競合（Contention）: 想定内。呼び出し元に返し、次の index へ進む合図になる
//! - 致命的（Fatal）: 登録やルーティングの不整合。実行を中断する

use thiserror::Error;

use super::ids::TicketId;

/// ErrorKind はクレーム失敗の運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 他の呼び出し元が先に取得した（リトライせず次へ）
    Contention,
    /// 不変条件の違反（実行を中断）
    Fatal,
}

/// ClaimError はレジストリ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("ticket {index} is already claimed")]
    AlreadyClaimed { index: usize },

    #[error("no ticket is registered at index {index}")]
    UnknownIndex { index: usize },

    #[error("ticket {index} ({id}) is not stored in shard {shard}")]
    NotInShard {
        index: usize,
        id: TicketId,
        shard: usize,
    },

    #[error("index {index} was routed to shard {shard}, but only {shard_count} shards exist")]
    ShardOutOfRange {
        index: usize,
        shard: usize,
        shard_count: usize,
    },
}

impl ClaimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClaimError::AlreadyClaimed { .. } => ErrorKind::Contention,
            ClaimError::UnknownIndex { .. }
            | ClaimError::NotInShard { .. }
            | ClaimError::ShardOutOfRange { .. } => ErrorKind::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }

    /// The ticket index the failed operation was about.
    pub fn index(&self) -> usize {
        match self {
            ClaimError::AlreadyClaimed { index }
            | ClaimError::UnknownIndex { index }
            | ClaimError::NotInShard { index, .. }
            | ClaimError::ShardOutOfRange { index, .. } => *index,
        }
    }
}

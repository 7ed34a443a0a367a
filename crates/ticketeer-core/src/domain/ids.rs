//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + ジェネリック実装
//! チケットとドライバー実行の ID は ULID で表現します。
//! `Id<T>` というジェネリック型で共通実装を提供し、
//! `T` はマーカー型（PhantomData）としてコンパイル時の型安全性だけを担います。
//!
//! チケット ID に要求されるのは「等値比較で引ける程度に一意」であることだけです。
//! 衝突は防御しません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"ticket-", "run-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// ```ignore
/// let ticket_id: TicketId = Id::from(Ulid::new());
/// let run_id: RunId = Id::from(Ulid::new());
/// // ticket_id と run_id は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Ticket のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TicketMarker {}

impl IdMarker for TicketMarker {
    fn prefix() -> &'static str {
        "ticket-"
    }
}

/// Driver 実行のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunMarker {}

impl IdMarker for RunMarker {
    fn prefix() -> &'static str {
        "run-"
    }
}

/// Identifier of a Ticket (the claimable unit).
pub type TicketId = Id<TicketMarker>;

/// Identifier of one Driver run (used to correlate log lines).
pub type RunId = Id<RunMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let ticket = TicketId::from_ulid(ulid1);
        let run = RunId::from_ulid(ulid2);

        assert_eq!(ticket.as_ulid(), ulid1);
        assert_eq!(run.as_ulid(), ulid2);

        assert!(ticket.to_string().starts_with("ticket-"));
        assert!(run.to_string().starts_with("run-"));

        // let _: TicketId = run; // <- does not compile
    }

    #[test]
    fn equal_ulids_give_equal_ids() {
        let ulid = Ulid::new();
        let a: TicketId = ulid.into();
        let b: TicketId = ulid.into();
        assert_eq!(a, b);
        assert_ne!(a, TicketId::from_ulid(Ulid::new()));
    }

    #[test]
    fn ticket_id_serializes_as_plain_ulid() {
        let id = TicketId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&id).unwrap();
        assert!(serialized.contains(&id.as_ulid().to_string()));

        let deserialized: TicketId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<TicketId>(), size_of::<Ulid>());
        assert_eq!(size_of::<RunId>(), 16);
    }
}

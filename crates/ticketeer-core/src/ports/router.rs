//! Router port - index からシャード番号へのマッピング
//!
//! # 実装
//! - ModulusRouter: `index % shard_count`（デフォルト）
//! - BlockRouter: 連続した index のブロック単位で割り当て

/// Router は index をシャード番号に解決する純粋関数
///
/// # 契約
/// - 決定的: 同じ `(shard_count, index)` は常に同じシャード
/// - 範囲: `0 <= route(..) < shard_count`
/// - 網羅: index が増えればすべてのシャードに到達する
///
/// Registry の構築後に差し替えてはいけません（登録済みチケットが引けなくなる）。
pub trait Router: Send + Sync {
    fn route(&self, shard_count: usize, index: usize) -> usize;
}

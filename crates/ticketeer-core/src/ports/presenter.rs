//! Presenter port - クレーム状態変化の通知先
//!
//! 描画や UI バインディングはこの trait の向こう側にあり、
//! このクレートは通知の契約だけを持ちます。
//!
//! # 実装
//! - NoopPresenter: 何もしない
//! - TracingPresenter: ログに出す
//! - RecordingPresenter: イベントを記録する（テスト・CLI 用）
//! - FanoutPresenter: 複数の Presenter に配る

/// Presenter はクレーム状態の変化を受け取る
///
/// 呼び出しはクレーム処理の途中で同期的に行われます。
/// 実装側でブロックしないこと。
///
/// `on_claim_attempt_failed` と `on_attempt_cleared` はパルスのロック中に
/// 呼ばれるので、この 2 つから同じ Registry を呼び返さないこと。
/// その代わり、通知の順序はパルスの変化と一致します。
pub trait Presenter: Send + Sync {
    /// チケットが取得された（available: false）
    fn on_claim_succeeded(&self, index: usize);

    /// 取得済みチケットへの試行があった（パルス開始・再開）
    fn on_claim_attempt_failed(&self, index: usize);

    /// パルスの表示期間が切れた
    fn on_attempt_cleared(&self, index: usize);
}

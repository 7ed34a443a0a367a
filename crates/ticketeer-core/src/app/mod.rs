//! App - アプリケーション層
//!
//! ports と registry を組み合わせてクレーム処理を実行します。
//!
//! # 主要コンポーネント
//! - **RegistryBuilder**: Registry の構築と投入
//! - **ClaimProcess**: 1 tick 分の状態遷移
//! - **Driver**: tick ループ
//! - **DriverGroup**: 複数 Driver の並行実行
//! - **PulseReaper**: 期限切れパルスの回収ループ
//! - **TickCadence**: tick 間の遅延

pub mod builder;
pub mod cadence;
pub mod driver;
pub mod group;
pub mod process;
pub mod reaper_loop;

pub use self::builder::{BuildError, RegistryBuilder};
pub use self::cadence::TickCadence;
pub use self::driver::{Driver, DriverError, RunReport};
pub use self::group::DriverGroup;
pub use self::process::{AdvancePolicy, BasicClaimProcess, ClaimProcess};
pub use self::reaper_loop::PulseReaper;

//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! 時刻・ID 生成・ルーティング・表示はすべて trait の向こう側にあり、
//! Registry と Driver はこれらを差し替え可能な部品として受け取ります。

pub mod clock;
pub mod id_generator;
pub mod presenter;
pub mod router;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::presenter::Presenter;
pub use self::router::Router;

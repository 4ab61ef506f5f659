//! Ports - 抽象化レイヤー
//!
//! engine の外側にある協力者（時刻、ID 発行、状態の保存先）への
//! インターフェースを定義します。

pub mod clock;
pub mod id_generator;
pub mod listener;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::listener::Listener;

//! Ports - 抽象化レイヤー
//!
//! エンジンが外部の協力者（handler, sideline, 時計, 乱数）に
//! 依存する箇所をすべて trait として切り出す。

pub mod clock;
pub mod handler;
pub mod outcome;
pub mod sideline;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::handler::MessageHandler;
pub use self::outcome::OutcomeSource;
pub use self::sideline::SidelineStore;

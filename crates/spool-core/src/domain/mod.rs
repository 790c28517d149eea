//! Domain model (ids, envelope, match pattern).
//!
//! キュー・ワーカー・永続化を前提としない純粋なデータ型のみを置きます。

pub mod envelope;
pub mod ids;
pub mod pattern;

pub use self::envelope::Envelope;
pub use self::ids::{EnvelopeId, Id, IdMarker};
pub use self::pattern::MatchPattern;

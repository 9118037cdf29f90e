mod error;
mod navigator;
mod snapshot;
mod state;

pub use error::{InvariantViolation, SessionError, ValidationError};
pub use navigator::{Navigator, Step};
pub use snapshot::{SessionEvent, SessionSnapshot};
pub use state::{QuizSession, SessionMode, SessionPhase};

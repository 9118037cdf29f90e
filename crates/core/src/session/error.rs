use thiserror::Error;

use crate::model::LedgerError;

use super::state::{SessionMode, SessionPhase};

/// A command that is illegal in the current state. Nothing was changed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("no questions available for session")]
    EmptyBank,

    #[error("session is {phase}, not in progress")]
    NotInProgress { phase: SessionPhase },

    #[error("session already completed")]
    AlreadyCompleted,

    #[error("session has not been submitted yet")]
    NotCompleted,

    #[error("{operation} is not available in {mode} mode")]
    WrongMode {
        operation: &'static str,
        mode: SessionMode,
    },

    #[error("answer is locked until you move to another question")]
    AnswerLocked,

    #[error("no selection made")]
    NoSelection,

    #[error("check the answer before moving on")]
    MustCheckFirst,

    #[error("question {index} is out of range for {len} questions")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("option {option} is out of range for {len} options")]
    OptionOutOfRange { option: usize, len: usize },
}

/// Internal state that should be impossible. Indicates a programming error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvariantViolation {
    #[error("cursor {cursor} is out of range for {len} questions")]
    CursorOutOfRange { cursor: usize, len: usize },

    #[error("ledger has {ledger} slots for {questions} questions")]
    LedgerLengthMismatch { ledger: usize, questions: usize },
}

/// Errors emitted by session commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl SessionError {
    /// The validation error, if this was a rejected command rather than a bug.
    #[must_use]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            SessionError::Validation(e) => Some(e),
            SessionError::Invariant(_) => None,
        }
    }
}

impl From<LedgerError> for SessionError {
    /// A missing ledger slot means the cursor and ledger disagree.
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SlotOutOfRange { index, len } => {
                InvariantViolation::CursorOutOfRange { cursor: index, len }.into()
            }
        }
    }
}

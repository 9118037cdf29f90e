//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::BankId;
use quiz_core::session::SessionError;
use storage::repository::StorageError;

/// Errors emitted while loading a question bank. No session exists after one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("unknown question bank: {0}")]
    UnknownBank(String),
    #[error("question bank {bank} could not be fetched")]
    Unreachable {
        bank: BankId,
        #[source]
        source: StorageError,
    },
    #[error("question bank {bank} is malformed")]
    Malformed {
        bank: BankId,
        #[source]
        source: StorageError,
    },
}

impl LoadError {
    pub(crate) fn from_storage(bank: BankId, source: StorageError) -> Self {
        if source.is_unreachable() {
            LoadError::Unreachable { bank, source }
        } else {
            LoadError::Malformed { bank, source }
        }
    }
}

/// Errors emitted by the quiz loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

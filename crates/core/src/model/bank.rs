use thiserror::Error;

use crate::model::ids::BankId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("pass percent must be between 0 and 100, got {0}")]
    InvalidPassPercent(u32),
}

/// Minimum score, in whole percent, needed to pass a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassPercent(u8);

impl PassPercent {
    /// # Errors
    ///
    /// Returns `BankError::InvalidPassPercent` for values above 100.
    pub fn new(value: u32) -> Result<Self, BankError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(BankError::InvalidPassPercent(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// The questions of one loaded bank plus its pass threshold.
///
/// Order is whatever the loader produced; the bank never reorders itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    id: BankId,
    pass_percent: PassPercent,
    questions: Vec<Question>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(id: BankId, pass_percent: PassPercent, questions: Vec<Question>) -> Self {
        Self {
            id,
            pass_percent,
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> BankId {
        self.id
    }

    #[must_use]
    pub fn pass_percent(&self) -> PassPercent {
        self.pass_percent
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Consume the bank, yielding its questions.
    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

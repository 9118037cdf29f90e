use serde::{Deserialize, Serialize};

use crate::model::{AnswerLedger, BankId, Question, SessionId};

use super::state::{SessionMode, SessionPhase};

/// Notices the view should present once, such as a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Study mode moved past the last question.
    BankExhausted { total: usize },
    /// Exam mode was submitted and graded.
    SessionCompleted { score_percent: u8, passed: bool },
}

/// Read-only copy of session state for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub bank_id: BankId,
    pub mode: SessionMode,
    pub phase: SessionPhase,
    pub cursor: usize,
    pub total: usize,
    pub answered: usize,
    pub pass_percent: u8,
    pub study_reveal: bool,
    pub elapsed_secs: u64,
    pub current: Question,
    pub ledger: AnswerLedger,
}

impl SessionSnapshot {
    /// One-based question number for display.
    #[must_use]
    pub fn question_number(&self) -> usize {
        self.cursor + 1
    }

    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total - self.answered
    }
}

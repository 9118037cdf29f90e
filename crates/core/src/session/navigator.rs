//! Mode-aware movement rules.
//!
//! The navigator only decides where the cursor should go; `QuizSession`
//! applies the decision so every transition stays all-or-nothing.

use super::error::ValidationError;
use super::state::SessionMode;

/// Where a navigation command leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing changes.
    Stay,
    /// Move the cursor. `clear_destination` wipes the destination slot first.
    MoveTo {
        index: usize,
        clear_destination: bool,
    },
    /// Study mode ran past the last question.
    Exhaust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    mode: SessionMode,
    len: usize,
}

impl Navigator {
    #[must_use]
    pub fn new(mode: SessionMode, len: usize) -> Self {
        Self { mode, len }
    }

    /// Study mode forgets prior attempts on every visit.
    fn clears_on_visit(self) -> bool {
        self.mode == SessionMode::Study
    }

    /// Index-grid jump. Allowed in both modes.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuestionOutOfRange` for an index past the end.
    pub fn jump(self, index: usize) -> Result<Step, ValidationError> {
        if index >= self.len {
            return Err(ValidationError::QuestionOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(Step::MoveTo {
            index,
            clear_destination: self.clears_on_visit(),
        })
    }

    /// Next-question button.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MustCheckFirst` in study mode when the current
    /// answer has not been checked yet.
    pub fn advance(self, cursor: usize, revealed: bool) -> Result<Step, ValidationError> {
        let next = cursor + 1;
        match self.mode {
            SessionMode::Exam if next < self.len => Ok(Step::MoveTo {
                index: next,
                clear_destination: false,
            }),
            SessionMode::Exam => Ok(Step::Stay),
            SessionMode::Study if !revealed => Err(ValidationError::MustCheckFirst),
            SessionMode::Study if next < self.len => Ok(Step::MoveTo {
                index: next,
                clear_destination: true,
            }),
            SessionMode::Study => Ok(Step::Exhaust),
        }
    }

    /// Previous-question button; a no-op on the first question.
    #[must_use]
    pub fn retreat(self, cursor: usize) -> Step {
        match cursor.checked_sub(1) {
            Some(index) => Step::MoveTo {
                index,
                clear_destination: self.clears_on_visit(),
            },
            None => Step::Stay,
        }
    }
}

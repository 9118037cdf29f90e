use quiz_core::session::QuizSession;

/// Aggregated view of quiz progress, useful for status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub elapsed_secs: u64,
    pub is_complete: bool,
}

impl QuizProgress {
    pub(crate) fn of(session: &QuizSession) -> Self {
        Self {
            total: session.bank().len(),
            answered: session.answered_count(),
            unanswered: session.unanswered_count(),
            elapsed_secs: session.elapsed_secs(),
            is_complete: session.is_complete(),
        }
    }

    /// Elapsed time as `mm:ss`.
    #[must_use]
    pub fn elapsed_label(&self) -> String {
        format!("{:02}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }
}

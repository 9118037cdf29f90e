use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use quiz_core::Clock;
use quiz_core::grader::{ExamResult, QuestionFeedback};
use quiz_core::model::{QuestionBank, SessionId};
use quiz_core::review::ExamReview;
use quiz_core::session::{
    QuizSession, SessionError, SessionEvent, SessionMode, SessionPhase, SessionSnapshot,
};

use super::progress::QuizProgress;
use super::timer::{ExamTimer, TICK_PERIOD};

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// Owns one quiz session and, in exam mode, the timer that feeds it.
///
/// Queued timer ticks are applied before every command and snapshot, so the
/// session is only ever mutated from the runner's own thread.
pub struct QuizRunner {
    session: QuizSession,
    timer: Option<ExamTimer>,
    clock: Clock,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl QuizRunner {
    /// Start a session on `bank`. Exam sessions spawn their timer on the
    /// current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the bank has no questions.
    ///
    /// # Panics
    ///
    /// Panics if an exam session is started outside a tokio runtime.
    pub fn start(bank: QuestionBank, mode: SessionMode, clock: Clock) -> Result<Self, SessionError> {
        Self::start_with_period(bank, mode, clock, TICK_PERIOD)
    }

    pub(crate) fn start_with_period(
        bank: QuestionBank,
        mode: SessionMode,
        clock: Clock,
        period: Duration,
    ) -> Result<Self, SessionError> {
        let session = QuizSession::start(bank, mode)?;
        let timer = session.is_timed().then(|| ExamTimer::start(period));
        let started_at = clock.now();

        tracing::info!(
            session = %session.id(),
            bank = %session.bank().id(),
            mode = %mode,
            questions = session.bank().len(),
            "quiz started"
        );

        Ok(Self {
            session,
            timer,
            clock,
            started_at,
            submitted_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.session.mode()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.session.result()
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(ExamTimer::is_running)
    }

    /// Progress after applying queued ticks.
    pub fn progress(&mut self) -> QuizProgress {
        self.sync_timer();
        QuizProgress::of(&self.session)
    }

    /// Current state for rendering, after applying queued ticks.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invariant` if the session state is corrupt.
    pub fn snapshot(&mut self) -> Result<SessionSnapshot, SessionError> {
        self.sync_timer();
        self.session.snapshot()
    }

    /// Drain one-shot notices for the view.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        self.session.take_events()
    }

    /// Wait for the next timer tick and apply it. Returns the elapsed seconds,
    /// or `None` when this runner has no running timer.
    pub async fn next_tick(&mut self) -> Option<u64> {
        let timer = self.timer.as_mut().filter(|t| t.is_running())?;
        if !timer.next_tick().await {
            return None;
        }
        self.session.tick();
        self.sync_timer();
        Some(self.session.elapsed_secs())
    }

    //
    // ─── COMMANDS ──────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// See [`QuizSession::select_answer`].
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        self.sync_timer();
        let result = self.session.select_answer(option);
        self.trace_rejection("select_answer", result)
    }

    /// # Errors
    ///
    /// See [`QuizSession::select_answers`].
    pub fn select_answers(&mut self, options: &[usize]) -> Result<(), SessionError> {
        self.sync_timer();
        let result = self.session.select_answers(options);
        self.trace_rejection("select_answers", result)
    }

    /// # Errors
    ///
    /// See [`QuizSession::jump_to`].
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.sync_timer();
        let result = self.session.jump_to(index);
        self.trace_rejection("jump_to", result)
    }

    /// # Errors
    ///
    /// See [`QuizSession::advance`].
    pub fn advance(&mut self) -> Result<(), SessionError> {
        self.sync_timer();
        let before = self.session.phase();
        let result = self.session.advance();
        if before != SessionPhase::Exhausted && self.session.phase() == SessionPhase::Exhausted {
            tracing::info!(
                session = %self.session.id(),
                answered = self.session.answered_count(),
                "question bank exhausted"
            );
        }
        self.trace_rejection("advance", result)
    }

    /// # Errors
    ///
    /// See [`QuizSession::retreat`].
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        self.sync_timer();
        let result = self.session.retreat();
        self.trace_rejection("retreat", result)
    }

    /// # Errors
    ///
    /// See [`QuizSession::check_answer`].
    pub fn check_answer(&mut self) -> Result<QuestionFeedback, SessionError> {
        self.sync_timer();
        let result = self.session.check_answer();
        self.trace_rejection("check_answer", result)
    }

    /// Grade the exam and stop its timer.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::submit`]. A rejected submit leaves the timer alone.
    pub fn submit(&mut self) -> Result<ExamResult, SessionError> {
        self.sync_timer();
        let result = self.session.submit();
        let result = self.trace_rejection("submit", result)?;

        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
        self.submitted_at = Some(self.clock.now());

        tracing::info!(
            session = %self.session.id(),
            score_percent = result.score_percent,
            passed = result.passed,
            elapsed_secs = self.session.elapsed_secs(),
            "exam submitted"
        );
        Ok(result)
    }

    /// # Errors
    ///
    /// See [`QuizSession::review`].
    pub fn review(&self) -> Result<ExamReview, SessionError> {
        self.session.review()
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn sync_timer(&mut self) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        for _ in 0..timer.drain() {
            self.session.tick();
        }
    }

    fn trace_rejection<T>(
        &self,
        operation: &'static str,
        result: Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        if let Err(err) = &result {
            match err {
                SessionError::Validation(reason) => tracing::debug!(
                    session = %self.session.id(),
                    operation,
                    %reason,
                    "command rejected"
                ),
                other => tracing::error!(
                    session = %self.session.id(),
                    operation,
                    error = %other,
                    "session invariant violated"
                ),
            }
        }
        result
    }
}

impl fmt::Debug for QuizRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizRunner")
            .field("session", &self.session)
            .field("timer_running", &self.is_timer_running())
            .field("started_at", &self.started_at)
            .field("submitted_at", &self.submitted_at)
            .finish_non_exhaustive()
    }
}

// ─── TESTS ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::mem;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grader::{self, ExamResult, QuestionFeedback};
use crate::model::{AnswerLedger, ParseIdError, Question, QuestionBank, SessionId};
use crate::review::ExamReview;

use super::error::{InvariantViolation, SessionError, ValidationError};
use super::navigator::{Navigator, Step};
use super::snapshot::{SessionEvent, SessionSnapshot};

//
// ─── MODE & PHASE ──────────────────────────────────────────────────────────────
//

/// How a session is run. Chosen before the bank loads and fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    /// Timed, free navigation, graded once on submit.
    Exam,
    /// Untimed, check each answer before moving on, no aggregate score.
    Study,
}

impl SessionMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Exam => "exam",
            SessionMode::Study => "study",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "exam" => Ok(Self::Exam),
            "study" => Ok(Self::Study),
            other => Err(ParseIdError::new("session mode", other)),
        }
    }
}

/// Lifecycle of a started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    InProgress,
    /// Exam submitted and graded. Terminal.
    Completed,
    /// Study mode ran past the last question. Jumping back resumes the session.
    Exhausted,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::InProgress => "in progress",
            SessionPhase::Completed => "completed",
            SessionPhase::Exhausted => "exhausted",
        })
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt over a loaded bank.
///
/// Every command either applies fully or returns an error and leaves the
/// session untouched. Elapsed time only moves through [`QuizSession::tick`];
/// whoever owns the session drives the clock.
pub struct QuizSession {
    id: SessionId,
    mode: SessionMode,
    phase: SessionPhase,
    bank: QuestionBank,
    ledger: AnswerLedger,
    cursor: usize,
    study_reveal: bool,
    elapsed_secs: u64,
    result: Option<ExamResult>,
    events: Vec<SessionEvent>,
    exhaustion_signalled: bool,
}

impl QuizSession {
    /// Start a session on a freshly loaded bank.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyBank` if the bank has no questions.
    pub fn start(bank: QuestionBank, mode: SessionMode) -> Result<Self, SessionError> {
        Self::start_with_id(SessionId::new(), bank, mode)
    }

    /// Like [`QuizSession::start`] with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyBank` if the bank has no questions.
    pub fn start_with_id(
        id: SessionId,
        bank: QuestionBank,
        mode: SessionMode,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(ValidationError::EmptyBank.into());
        }
        let ledger = AnswerLedger::new(bank.len());
        Ok(Self {
            id,
            mode,
            phase: SessionPhase::InProgress,
            bank,
            ledger,
            cursor: 0,
            study_reveal: false,
            elapsed_secs: 0,
            result: None,
            events: Vec::new(),
            exhaustion_signalled: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn study_reveal(&self) -> bool {
        self.study_reveal
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Result of the submitted exam, if any.
    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Whether the elapsed-time counter should be running.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.mode == SessionMode::Exam && self.phase == SessionPhase::InProgress
    }

    /// The question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation::CursorOutOfRange` if the cursor is invalid.
    pub fn current_question(&self) -> Result<&Question, SessionError> {
        self.bank.question(self.cursor).ok_or_else(|| {
            InvariantViolation::CursorOutOfRange {
                cursor: self.cursor,
                len: self.bank.len(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.ledger.count_answered()
    }

    /// Unanswered questions, for the submit confirmation prompt.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.ledger.count_unanswered()
    }

    /// Drain pending notices. Each notice is produced at most once per session.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        mem::take(&mut self.events)
    }

    /// Copy of the state the view needs to render.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Invariant` if internal state is inconsistent.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.check_invariants()?;
        Ok(SessionSnapshot {
            session_id: self.id,
            bank_id: self.bank.id(),
            mode: self.mode,
            phase: self.phase,
            cursor: self.cursor,
            total: self.bank.len(),
            answered: self.ledger.count_answered(),
            pass_percent: self.bank.pass_percent().value(),
            study_reveal: self.study_reveal,
            elapsed_secs: self.elapsed_secs,
            current: self.current_question()?.clone(),
            ledger: self.ledger.clone(),
        })
    }

    //
    // ─── COMMANDS ──────────────────────────────────────────────────────────────
    //

    /// Select (or, for multi-select, toggle) an option of the current question.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the session is not in progress, the
    /// answer is locked after a study-mode check, or the option does not exist.
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        self.select_answers(&[option])
    }

    /// Apply several selections in order, as one command. Every option is
    /// checked before any is recorded, so a rejected batch leaves the
    /// answer untouched.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::select_answer`]; the first out-of-range option
    /// is reported.
    pub fn select_answers(&mut self, options: &[usize]) -> Result<(), SessionError> {
        self.check_invariants()?;
        self.require_in_progress()?;
        if self.mode == SessionMode::Study && self.study_reveal {
            return Err(ValidationError::AnswerLocked.into());
        }
        let question = self.current_question()?;
        let len = question.option_count();
        if let Some(&option) = options.iter().find(|&&option| option >= len) {
            return Err(ValidationError::OptionOutOfRange { option, len }.into());
        }
        let kind = question.assessment_type();
        for &option in options {
            self.ledger.record(self.cursor, kind, option)?;
        }
        Ok(())
    }

    /// Jump to a question from the index grid.
    ///
    /// In study mode the destination is always wiped and must be answered again.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the exam is already submitted or the index
    /// does not exist.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_invariants()?;
        self.require_open()?;
        let step = self.navigator().jump(index)?;
        self.apply(step)
    }

    /// Move to the next question.
    ///
    /// Exam mode stops quietly at the last question. Study mode requires the
    /// current answer to be checked, and running past the end exhausts the bank.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MustCheckFirst` in study mode before a check,
    /// or `ValidationError::AlreadyCompleted` after an exam submit.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        self.check_invariants()?;
        self.require_open()?;
        if self.phase == SessionPhase::Exhausted {
            return Ok(());
        }
        let step = self.navigator().advance(self.cursor, self.study_reveal)?;
        self.apply(step)
    }

    /// Move to the previous question; nothing happens on the first one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AlreadyCompleted` after an exam submit.
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        self.check_invariants()?;
        self.require_open()?;
        let step = self.navigator().retreat(self.cursor);
        self.apply(step)
    }

    /// Reveal the correct answer for the current question (study mode).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoSelection` if nothing is selected, or
    /// `ValidationError::WrongMode` in exam mode.
    pub fn check_answer(&mut self) -> Result<QuestionFeedback, SessionError> {
        self.check_invariants()?;
        if self.mode != SessionMode::Study {
            return Err(ValidationError::WrongMode {
                operation: "check_answer",
                mode: self.mode,
            }
            .into());
        }
        self.require_in_progress()?;
        let answer = self
            .ledger
            .get(self.cursor)
            .ok_or(ValidationError::NoSelection)?;
        let feedback = grader::grade_one(self.current_question()?, Some(answer));
        self.study_reveal = true;
        Ok(feedback)
    }

    /// Grade the exam and finish the session.
    ///
    /// Accepted at any completeness level; unanswered questions score zero.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AlreadyCompleted` on a second submit, or
    /// `ValidationError::WrongMode` in study mode.
    pub fn submit(&mut self) -> Result<ExamResult, SessionError> {
        self.check_invariants()?;
        if self.mode != SessionMode::Exam {
            return Err(ValidationError::WrongMode {
                operation: "submit",
                mode: self.mode,
            }
            .into());
        }
        self.require_in_progress()?;

        let result = grader::grade_all(&self.bank, &self.ledger);
        self.phase = SessionPhase::Completed;
        self.result = Some(result.clone());
        self.events.push(SessionEvent::SessionCompleted {
            score_percent: result.score_percent,
            passed: result.passed,
        });
        Ok(result)
    }

    /// Count one elapsed second. Returns whether the tick was counted.
    pub fn tick(&mut self) -> bool {
        if !self.is_timed() {
            return false;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        true
    }

    /// Per-question breakdown of a submitted exam.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NotCompleted` before submission.
    pub fn review(&self) -> Result<ExamReview, SessionError> {
        if !self.is_complete() {
            return Err(ValidationError::NotCompleted.into());
        }
        Ok(ExamReview::build(&self.bank, &self.ledger))
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn navigator(&self) -> Navigator {
        Navigator::new(self.mode, self.bank.len())
    }

    fn apply(&mut self, step: Step) -> Result<(), SessionError> {
        match step {
            Step::Stay => {}
            Step::MoveTo {
                index,
                clear_destination,
            } => {
                if clear_destination {
                    self.ledger.clear(index)?;
                }
                self.cursor = index;
                self.study_reveal = false;
                if self.phase == SessionPhase::Exhausted {
                    self.phase = SessionPhase::InProgress;
                }
            }
            Step::Exhaust => {
                self.phase = SessionPhase::Exhausted;
                if !self.exhaustion_signalled {
                    self.exhaustion_signalled = true;
                    self.events.push(SessionEvent::BankExhausted {
                        total: self.bank.len(),
                    });
                }
            }
        }
        Ok(())
    }

    fn require_in_progress(&self) -> Result<(), ValidationError> {
        match self.phase {
            SessionPhase::InProgress => Ok(()),
            SessionPhase::Completed => Err(ValidationError::AlreadyCompleted),
            phase @ SessionPhase::Exhausted => Err(ValidationError::NotInProgress { phase }),
        }
    }

    /// Navigation is allowed in progress and from the soft `Exhausted` state.
    fn require_open(&self) -> Result<(), ValidationError> {
        match self.phase {
            SessionPhase::Completed => Err(ValidationError::AlreadyCompleted),
            SessionPhase::InProgress | SessionPhase::Exhausted => Ok(()),
        }
    }

    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.ledger.len() != self.bank.len() {
            return Err(InvariantViolation::LedgerLengthMismatch {
                ledger: self.ledger.len(),
                questions: self.bank.len(),
            });
        }
        if self.cursor >= self.bank.len() {
            return Err(InvariantViolation::CursorOutOfRange {
                cursor: self.cursor,
                len: self.bank.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("bank", &self.bank.id())
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("questions_len", &self.bank.len())
            .field("cursor", &self.cursor)
            .field("answered", &self.ledger.count_answered())
            .field("study_reveal", &self.study_reveal)
            .field("elapsed_secs", &self.elapsed_secs)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grader::{AnswerOutcome, OptionMark};
    use crate::model::{Answer, AssessmentType, BankId, PassPercent, Prompt};

    fn build_single(correct: &str) -> Question {
        let prompt = Prompt::new(
            "Single?",
            vec!["w".into(), "x".into(), "y".into(), "z".into()],
            "single",
        )
        .unwrap();
        Question::from_letters(prompt, AssessmentType::SingleSelect, &[correct]).unwrap()
    }

    fn build_multi(correct: &[&str]) -> Question {
        let prompt = Prompt::new(
            "Multi?",
            vec!["w".into(), "x".into(), "y".into(), "z".into()],
            "multi",
        )
        .unwrap();
        Question::from_letters(prompt, AssessmentType::MultiSelect, correct).unwrap()
    }

    fn build_bank(questions: Vec<Question>, pass: u32) -> QuestionBank {
        QuestionBank::new(BankId::Full, PassPercent::new(pass).unwrap(), questions)
    }

    fn exam(questions: Vec<Question>) -> QuizSession {
        QuizSession::start(build_bank(questions, 70), SessionMode::Exam).unwrap()
    }

    fn study(questions: Vec<Question>) -> QuizSession {
        QuizSession::start(build_bank(questions, 70), SessionMode::Study).unwrap()
    }

    fn validation(err: SessionError) -> ValidationError {
        err.as_validation().cloned().expect("validation error")
    }

    #[test]
    fn start_initializes_empty_ledger() {
        let session = exam(vec![build_single("a"), build_single("b")]);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.ledger().len(), 2);
        assert_eq!(session.answered_count(), 0);
        assert!(!session.study_reveal());
        assert!(session.is_timed());
    }

    #[test]
    fn empty_bank_is_rejected() {
        let err = QuizSession::start(build_bank(Vec::new(), 50), SessionMode::Exam).unwrap_err();
        assert_eq!(validation(err), ValidationError::EmptyBank);
    }

    #[test]
    fn exam_scenario_matches_expected_score() {
        let mut session = exam(vec![
            build_single("a"),
            build_single("b"),
            build_single("c"),
        ]);
        session.select_answer(0).unwrap();
        session.advance().unwrap();
        session.select_answer(1).unwrap();

        let result = session.submit().unwrap();
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.score_percent, 67);
        assert!(!result.passed);
        assert_eq!(session.phase(), SessionPhase::Completed);
    }

    #[test]
    fn second_submit_is_rejected_and_result_kept() {
        let mut session = exam(vec![build_single("a")]);
        session.select_answer(0).unwrap();
        let first = session.submit().unwrap();

        let err = session.submit().unwrap_err();
        assert_eq!(validation(err), ValidationError::AlreadyCompleted);
        assert_eq!(session.result(), Some(&first));
        assert_eq!(
            session.take_events(),
            vec![SessionEvent::SessionCompleted {
                score_percent: 100,
                passed: true
            }]
        );
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn completed_exam_rejects_mutation() {
        let mut session = exam(vec![build_single("a"), build_single("b")]);
        session.submit().unwrap();
        assert_eq!(
            validation(session.select_answer(0).unwrap_err()),
            ValidationError::AlreadyCompleted
        );
        assert_eq!(
            validation(session.jump_to(1).unwrap_err()),
            ValidationError::AlreadyCompleted
        );
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn exam_navigation_keeps_answers() {
        let mut session = exam(vec![build_single("a"), build_multi(&["a", "c"])]);
        session.jump_to(1).unwrap();
        session.select_answer(0).unwrap();
        session.select_answer(2).unwrap();
        session.retreat().unwrap();
        session.jump_to(1).unwrap();

        assert_eq!(session.cursor(), 1);
        assert_eq!(
            session.ledger().get(1).unwrap().options(),
            vec![0, 2]
        );
        session.advance().unwrap();
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn exam_rejects_check_and_study_rejects_submit() {
        let mut e = exam(vec![build_single("a")]);
        e.select_answer(0).unwrap();
        assert!(matches!(
            validation(e.check_answer().unwrap_err()),
            ValidationError::WrongMode { .. }
        ));

        let mut s = study(vec![build_single("a")]);
        assert!(matches!(
            validation(s.submit().unwrap_err()),
            ValidationError::WrongMode { .. }
        ));
    }

    #[test]
    fn option_out_of_range_is_rejected() {
        let mut session = exam(vec![build_single("a")]);
        assert_eq!(
            validation(session.select_answer(4).unwrap_err()),
            ValidationError::OptionOutOfRange { option: 4, len: 4 }
        );
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn batch_selection_is_all_or_nothing() {
        let mut session = exam(vec![build_multi(&["a", "c"])]);
        assert_eq!(
            validation(session.select_answers(&[0, 2, 7]).unwrap_err()),
            ValidationError::OptionOutOfRange { option: 7, len: 4 }
        );
        assert_eq!(session.answered_count(), 0);

        session.select_answers(&[0, 2]).unwrap();
        assert_eq!(session.ledger().get(0).unwrap().options(), vec![0, 2]);
    }

    #[test]
    fn check_without_selection_fails() {
        let mut session = study(vec![build_single("a")]);
        assert_eq!(
            validation(session.check_answer().unwrap_err()),
            ValidationError::NoSelection
        );
        assert!(!session.study_reveal());
    }

    #[test]
    fn study_check_reveals_and_locks() {
        let mut session = study(vec![build_multi(&["a", "c"]), build_single("b")]);
        session.select_answer(0).unwrap();

        let feedback = session.check_answer().unwrap();
        assert_eq!(feedback.outcome, AnswerOutcome::Incorrect);
        assert_eq!(feedback.marks[2], OptionMark::CorrectMissed);
        assert!(session.study_reveal());

        assert_eq!(
            validation(session.select_answer(2).unwrap_err()),
            ValidationError::AnswerLocked
        );
        assert_eq!(
            session.ledger().get(0),
            Some(&Answer::Multi([0].into_iter().collect()))
        );
    }

    #[test]
    fn study_advance_requires_check() {
        let mut session = study(vec![build_single("a"), build_single("b")]);
        session.select_answer(0).unwrap();
        assert_eq!(
            validation(session.advance().unwrap_err()),
            ValidationError::MustCheckFirst
        );
        assert_eq!(session.cursor(), 0);

        session.check_answer().unwrap();
        session.advance().unwrap();
        assert_eq!(session.cursor(), 1);
        assert!(!session.study_reveal());
    }

    #[test]
    fn study_jump_clears_destination() {
        let mut session = study(vec![build_single("a"), build_single("b")]);
        session.select_answer(0).unwrap();
        session.check_answer().unwrap();
        session.jump_to(1).unwrap();
        session.select_answer(1).unwrap();

        session.jump_to(0).unwrap();
        assert!(session.ledger().get(0).is_none());
        assert!(!session.study_reveal());

        // Jumping onto the current question still wipes it.
        session.jump_to(1).unwrap();
        assert!(session.ledger().get(1).is_none());
    }

    #[test]
    fn study_exhausts_once_and_resumes_on_jump() {
        let mut session = study(vec![build_single("a")]);
        session.select_answer(0).unwrap();
        session.check_answer().unwrap();
        session.advance().unwrap();

        assert_eq!(session.phase(), SessionPhase::Exhausted);
        assert_eq!(session.cursor(), 0);
        assert_eq!(
            session.take_events(),
            vec![SessionEvent::BankExhausted { total: 1 }]
        );
        assert!(session.result().is_none());

        session.advance().unwrap();
        assert!(session.take_events().is_empty());
        assert!(matches!(
            validation(session.select_answer(1).unwrap_err()),
            ValidationError::NotInProgress { .. }
        ));

        session.jump_to(0).unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        session.select_answer(0).unwrap();
        session.check_answer().unwrap();
        session.advance().unwrap();
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn ticks_only_count_while_exam_runs() {
        let mut session = exam(vec![build_single("a")]);
        assert!(session.tick());
        assert!(session.tick());
        session.submit().unwrap();
        assert!(!session.tick());
        assert_eq!(session.elapsed_secs(), 2);

        let mut s = study(vec![build_single("a")]);
        assert!(!s.tick());
        assert_eq!(s.elapsed_secs(), 0);
    }

    #[test]
    fn review_only_after_submit() {
        let mut session = exam(vec![build_single("b")]);
        assert_eq!(
            validation(session.review().unwrap_err()),
            ValidationError::NotCompleted
        );
        session.select_answer(1).unwrap();
        session.submit().unwrap();
        let review = session.review().unwrap();
        assert_eq!(review.entries()[0].outcome, AnswerOutcome::Correct);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut session = exam(vec![build_single("a"), build_single("b")]);
        session.jump_to(1).unwrap();
        session.select_answer(3).unwrap();
        session.tick();

        let snap = session.snapshot().unwrap();
        assert_eq!(snap.cursor, 1);
        assert_eq!(snap.question_number(), 2);
        assert_eq!(snap.answered, 1);
        assert_eq!(snap.unanswered(), 1);
        assert_eq!(snap.elapsed_secs, 1);
        assert_eq!(snap.pass_percent, 70);
        assert_eq!(snap.mode, SessionMode::Exam);
        assert_eq!(snap.current.prompt().question(), "Single?");
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("study".parse::<SessionMode>().unwrap(), SessionMode::Study);
        assert!("quiz".parse::<SessionMode>().is_err());
        assert_eq!(SessionMode::Exam.to_string(), "exam");
    }
}

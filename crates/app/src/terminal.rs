//! Line-oriented terminal view: renders snapshots and forwards typed commands.

use std::error::Error;
use std::fmt;
use std::io::Write;

use quiz_core::grader::{self, AnswerOutcome, ExamResult, OptionMark};
use quiz_core::model::{AssessmentType, BankId, decode_letter, encode_letter};
use quiz_core::review::ExamReview;
use quiz_core::session::{SessionError, SessionEvent, SessionMode, SessionPhase};
use services::{QuizLoopService, QuizRunner};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

type DriverResult<T> = Result<T, Box<dyn Error>>;

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

/// One typed command. Bare letters select answer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Select(Vec<usize>),
    Next,
    Prev,
    Check,
    Goto(usize),
    Submit,
    Review,
    Status,
    Restart,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    MissingNumber,
    InvalidNumber(String),
    Unknown(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "empty input"),
            InputError::MissingNumber => write!(f, "goto requires a question number"),
            InputError::InvalidNumber(raw) => write!(f, "invalid question number: {raw}"),
            InputError::Unknown(raw) => write!(f, "unknown command: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Parse one line of user input.
///
/// # Errors
///
/// Returns `InputError` for blank lines, unknown words, and bad numbers.
pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(InputError::Empty);
    };

    let input = match head.to_ascii_lowercase().as_str() {
        "next" | ">" => Input::Next,
        "prev" | "back" | "<" => Input::Prev,
        "check" => Input::Check,
        "goto" | "go" => {
            let raw = words.next().ok_or(InputError::MissingNumber)?;
            let number: usize = raw
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| InputError::InvalidNumber(raw.to_string()))?;
            Input::Goto(number - 1)
        }
        "submit" => Input::Submit,
        "review" => Input::Review,
        "status" => Input::Status,
        "restart" | "retry" => Input::Restart,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => {
            let options = line
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',')
                .map(|c| decode_letter(c.encode_utf8(&mut [0; 4])))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| InputError::Unknown(line.trim().to_string()))?;
            Input::Select(options)
        }
    };
    Ok(input)
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn describe_error(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

fn letter(index: usize) -> char {
    encode_letter(index).unwrap_or('?')
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

enum Flow {
    Continue,
    Restart,
    Quit,
}

/// Drives one quiz from a line reader, writing everything to `out`.
pub struct Driver<'a, R, W> {
    service: &'a QuizLoopService,
    lines: Lines<R>,
    out: W,
    confirm_submit: bool,
}

impl<'a, R, W> Driver<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(service: &'a QuizLoopService, input: R, out: W) -> Self {
        Self {
            service,
            lines: input.lines(),
            out,
            confirm_submit: false,
        }
    }

    /// Load `bank` and run the quiz until the user quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the bank cannot be loaded and the user declines to
    /// retry, or if reading input or writing output fails.
    pub async fn run(mut self, bank: BankId, mode: SessionMode) -> DriverResult<()> {
        let mut runner = self.start(bank, mode).await?;
        self.render(&mut runner)?;

        loop {
            self.prompt()?;
            let flow = loop {
                let timed = runner.is_timer_running();
                tokio::select! {
                    line = self.lines.next_line() => {
                        let Some(line) = line? else {
                            break Flow::Quit;
                        };
                        break self.handle(&mut runner, line.trim())?;
                    }
                    Some(elapsed) = runner.next_tick(), if timed => {
                        if elapsed % 60 == 0 {
                            writeln!(self.out, "\n[{} elapsed]", runner.progress().elapsed_label())?;
                            self.prompt()?;
                        }
                    }
                }
            };

            match flow {
                Flow::Continue => {}
                Flow::Restart => match self.service.restart(&runner).await {
                    Ok(next) => {
                        runner = next;
                        self.confirm_submit = false;
                        writeln!(self.out, "Starting over with a fresh question order.")?;
                        self.render(&mut runner)?;
                    }
                    Err(err) => writeln!(self.out, "! could not restart: {}", describe_error(&err))?,
                },
                Flow::Quit => {
                    writeln!(self.out, "Bye.")?;
                    return Ok(());
                }
            }
        }
    }

    async fn start(&mut self, bank: BankId, mode: SessionMode) -> DriverResult<QuizRunner> {
        loop {
            match self.service.start_quiz(bank, mode).await {
                Ok(runner) => return Ok(runner),
                Err(err) => {
                    writeln!(
                        self.out,
                        "! could not start the quiz: {}",
                        describe_error(&err)
                    )?;
                    write!(self.out, "Retry? [y/N] ")?;
                    self.out.flush()?;
                    let answer = self.lines.next_line().await?.unwrap_or_default();
                    if !is_yes(&answer) {
                        return Err(err.into());
                    }
                }
            }
        }
    }

    fn handle(&mut self, runner: &mut QuizRunner, line: &str) -> DriverResult<Flow> {
        if self.confirm_submit {
            self.confirm_submit = false;
            if is_yes(line) {
                self.submit(runner)?;
            } else {
                writeln!(self.out, "Submit cancelled.")?;
            }
            return Ok(Flow::Continue);
        }

        let input = match parse_input(line) {
            Ok(input) => input,
            Err(InputError::Empty) => return Ok(Flow::Continue),
            Err(err) => {
                writeln!(self.out, "! {err} (type `help` for commands)")?;
                return Ok(Flow::Continue);
            }
        };

        match input {
            Input::Select(options) => {
                if self.report(runner.select_answers(&options))?.is_some() {
                    self.render(runner)?;
                }
            }
            Input::Next => self.navigate(runner, QuizRunner::advance)?,
            Input::Prev => self.navigate(runner, QuizRunner::retreat)?,
            Input::Goto(index) => self.navigate(runner, |r| r.jump_to(index))?,
            Input::Check => {
                if let Some(feedback) = self.report(runner.check_answer())? {
                    self.render(runner)?;
                    let verdict = match feedback.outcome {
                        AnswerOutcome::Correct => "Correct!",
                        AnswerOutcome::Incorrect => "Incorrect.",
                        AnswerOutcome::Unanswered => "Unanswered.",
                    };
                    writeln!(self.out, "{verdict} {}", feedback.explanation)?;
                }
            }
            Input::Submit => {
                let unanswered = runner.progress().unanswered;
                let pending = runner.mode() == SessionMode::Exam
                    && runner.phase() == SessionPhase::InProgress
                    && unanswered > 0;
                if pending {
                    write!(
                        self.out,
                        "{unanswered} question(s) unanswered. Submit anyway? [y/N] "
                    )?;
                    self.out.flush()?;
                    self.confirm_submit = true;
                } else {
                    self.submit(runner)?;
                }
            }
            Input::Review => {
                if let Some(review) = self.report(runner.review())? {
                    self.print_review(&review)?;
                }
            }
            Input::Status => self.print_status(runner)?,
            Input::Restart => return Ok(Flow::Restart),
            Input::Help => self.print_help()?,
            Input::Quit => return Ok(Flow::Quit),
        }

        self.flush_events(runner)?;
        Ok(Flow::Continue)
    }

    fn navigate(
        &mut self,
        runner: &mut QuizRunner,
        command: impl FnOnce(&mut QuizRunner) -> Result<(), SessionError>,
    ) -> DriverResult<()> {
        if self.report(command(runner))?.is_some() && runner.phase() != SessionPhase::Exhausted {
            self.render(runner)?;
        }
        Ok(())
    }

    fn submit(&mut self, runner: &mut QuizRunner) -> DriverResult<()> {
        self.report(runner.submit())?;
        self.flush_events(runner)
    }

    /// Print a rejected command; the session is unchanged in that case.
    fn report<T>(&mut self, result: Result<T, SessionError>) -> DriverResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(SessionError::Validation(reason)) => {
                writeln!(self.out, "! {reason}")?;
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn flush_events(&mut self, runner: &mut QuizRunner) -> DriverResult<()> {
        for event in runner.take_events() {
            match event {
                SessionEvent::BankExhausted { total } => writeln!(
                    self.out,
                    "You have worked through all {total} questions. \
                     `goto <n>` revisits one, `restart` reshuffles the bank."
                )?,
                SessionEvent::SessionCompleted { .. } => {
                    if let Some(result) = runner.result().cloned() {
                        let elapsed = runner.progress().elapsed_label();
                        self.print_result(&result, &elapsed)?;
                    }
                }
            }
        }
        Ok(())
    }

    //
    // ─── RENDERING ─────────────────────────────────────────────────────────────
    //

    fn prompt(&mut self) -> DriverResult<()> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }

    fn render(&mut self, runner: &mut QuizRunner) -> DriverResult<()> {
        let snapshot = runner.snapshot()?;
        if snapshot.phase == SessionPhase::Completed {
            writeln!(
                self.out,
                "Exam submitted. `review` shows every question, `restart` starts over."
            )?;
            return Ok(());
        }

        let mut header = format!(
            "── Question {}/{} ── {} ── answered {}/{}",
            snapshot.question_number(),
            snapshot.total,
            snapshot.mode,
            snapshot.answered,
            snapshot.total
        );
        if snapshot.mode == SessionMode::Exam {
            header.push_str(&format!(" ── {}", runner.progress().elapsed_label()));
        }
        writeln!(self.out, "\n{header}")?;
        writeln!(self.out, "{}", snapshot.current.prompt().question())?;

        let kind = snapshot.current.assessment_type();
        if kind == AssessmentType::MultiSelect {
            writeln!(self.out, "(choose all that apply)")?;
        }

        let answer = snapshot.ledger.get(snapshot.cursor);
        let marks = snapshot
            .study_reveal
            .then(|| grader::grade_one(&snapshot.current, answer).marks);

        for (index, text) in snapshot.current.prompt().answers().iter().enumerate() {
            let chosen = answer.is_some_and(|a| a.contains(index));
            let boxed = match (kind, chosen) {
                (AssessmentType::SingleSelect, true) => "(*)",
                (AssessmentType::SingleSelect, false) => "( )",
                (AssessmentType::MultiSelect, true) => "[x]",
                (AssessmentType::MultiSelect, false) => "[ ]",
            };
            let note = marks
                .as_ref()
                .and_then(|m| m.get(index))
                .map_or("", |mark| mark_note(*mark));
            writeln!(self.out, "  {boxed} {}) {text}{note}", letter(index))?;
        }
        Ok(())
    }

    fn print_result(&mut self, result: &ExamResult, elapsed: &str) -> DriverResult<()> {
        let verdict = if result.passed { "PASSED" } else { "FAILED" };
        writeln!(
            self.out,
            "Score {}% (pass mark {}%): {verdict}",
            result.score_percent, result.pass_percent
        )?;
        writeln!(
            self.out,
            "correct {}, incorrect {}, unanswered {} of {}; time {elapsed}",
            result.correct_count, result.incorrect_count, result.unanswered_count, result.total_count
        )?;
        Ok(())
    }

    fn print_review(&mut self, review: &ExamReview) -> DriverResult<()> {
        for entry in review.entries() {
            let outcome = match entry.outcome {
                AnswerOutcome::Correct => "correct",
                AnswerOutcome::Incorrect => "incorrect",
                AnswerOutcome::Unanswered => "unanswered",
            };
            writeln!(
                self.out,
                "\n#{} [{}] {outcome}",
                entry.index + 1,
                entry.assessment_type
            )?;
            writeln!(self.out, "{}", entry.question)?;
            for (index, option) in entry.options.iter().enumerate() {
                writeln!(
                    self.out,
                    "  {}) {}{}",
                    letter(index),
                    option.text,
                    mark_note(option.mark)
                )?;
            }
            if !entry.explanation.is_empty() {
                writeln!(self.out, "  explanation: {}", entry.explanation)?;
            }
        }
        Ok(())
    }

    fn print_status(&mut self, runner: &mut QuizRunner) -> DriverResult<()> {
        let progress = runner.progress();
        let snapshot = runner.snapshot()?;
        let grid = snapshot
            .ledger
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let number = index + 1;
                let filled = if slot.is_some() { "*" } else { "" };
                if index == snapshot.cursor {
                    format!("[{number}{filled}]")
                } else {
                    format!("{number}{filled}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.out, "{grid}")?;
        writeln!(
            self.out,
            "{} answered, {} unanswered, {} elapsed, {}",
            progress.answered,
            progress.unanswered,
            progress.elapsed_label(),
            snapshot.phase
        )?;
        Ok(())
    }

    fn print_help(&mut self) -> DriverResult<()> {
        writeln!(self.out, "Commands:")?;
        writeln!(self.out, "  a, b, ...       select an option (toggles in multi-select)")?;
        writeln!(self.out, "  next, prev      move between questions")?;
        writeln!(self.out, "  goto <n>        jump to question n")?;
        writeln!(self.out, "  check           reveal the answer (study mode)")?;
        writeln!(self.out, "  submit          grade the exam (exam mode)")?;
        writeln!(self.out, "  review          per-question breakdown after submit")?;
        writeln!(self.out, "  status          question grid and progress")?;
        writeln!(self.out, "  restart         reload the bank in a fresh order")?;
        writeln!(self.out, "  quit            leave")?;
        Ok(())
    }
}

fn mark_note(mark: OptionMark) -> &'static str {
    match mark {
        OptionMark::CorrectChosen => "   <- correct",
        OptionMark::CorrectMissed => "   <- correct (missed)",
        OptionMark::IncorrectChosen => "   <- incorrect",
        OptionMark::Unmarked => "",
    }
}

// ─── TESTS ─────────────────────────────────────────────────────────────────────

//! Grading of recorded answers against a question bank.
//!
//! Everything here is a pure read of the bank and ledger; nothing mutates
//! session state.

use serde::{Deserialize, Serialize};

use crate::model::{Answer, AnswerLedger, AssessmentType, PassPercent, Question, QuestionBank};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// How one question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    Unanswered,
}

/// Highlight for a single option once the correct answer is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionMark {
    /// Correct option the user picked.
    CorrectChosen,
    /// Correct option the user missed.
    CorrectMissed,
    /// Wrong option the user picked.
    IncorrectChosen,
    Unmarked,
}

/// Immediate feedback for one question in study mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub outcome: AnswerOutcome,
    pub marks: Vec<OptionMark>,
    pub explanation: String,
}

/// Aggregate result of grading a whole bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub unanswered_count: usize,
    pub total_count: usize,
    pub score_percent: u8,
    pub pass_percent: u8,
    pub passed: bool,
    /// Outcome per question, in bank order.
    pub outcomes: Vec<AnswerOutcome>,
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// Whether `answer` earns credit for `question`.
///
/// Multi-select needs an exact set match; subsets and supersets get nothing.
#[must_use]
pub fn is_correct(question: &Question, answer: Option<&Answer>) -> bool {
    outcome(question, answer) == AnswerOutcome::Correct
}

/// Classify an answer as correct, incorrect, or unanswered.
#[must_use]
pub fn outcome(question: &Question, answer: Option<&Answer>) -> AnswerOutcome {
    let Some(answer) = answer else {
        return AnswerOutcome::Unanswered;
    };
    let correct = match (question.assessment_type(), answer) {
        (AssessmentType::SingleSelect, Answer::Single(chosen)) => {
            question.correct().len() == 1 && question.is_correct_option(*chosen)
        }
        (AssessmentType::MultiSelect, Answer::Multi(chosen)) => chosen == question.correct(),
        // Shape mismatch cannot come from the ledger's own recording rules.
        (AssessmentType::SingleSelect, Answer::Multi(_))
        | (AssessmentType::MultiSelect, Answer::Single(_)) => false,
    };
    if correct {
        AnswerOutcome::Correct
    } else {
        AnswerOutcome::Incorrect
    }
}

/// Per-option highlights plus the explanation, shown even when nothing was chosen.
#[must_use]
pub fn grade_one(question: &Question, answer: Option<&Answer>) -> QuestionFeedback {
    let marks = (0..question.option_count())
        .map(|option| {
            let chosen = answer.is_some_and(|a| a.contains(option));
            match (question.is_correct_option(option), chosen) {
                (true, true) => OptionMark::CorrectChosen,
                (true, false) => OptionMark::CorrectMissed,
                (false, true) => OptionMark::IncorrectChosen,
                (false, false) => OptionMark::Unmarked,
            }
        })
        .collect();

    QuestionFeedback {
        outcome: outcome(question, answer),
        marks,
        explanation: question.prompt().explanation().to_string(),
    }
}

/// `correct / total * 100`, rounded half up. An empty bank scores 0.
#[must_use]
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    let rounded = (correct * 100 + total / 2) / total;
    u8::try_from(rounded).unwrap_or(100)
}

/// Grade every question of the bank against the ledger.
///
/// Slots past the end of a shorter ledger count as unanswered.
#[must_use]
pub fn grade_all(bank: &QuestionBank, ledger: &AnswerLedger) -> ExamResult {
    let outcomes: Vec<AnswerOutcome> = bank
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| outcome(q, ledger.get(i)))
        .collect();

    let count = |wanted: AnswerOutcome| outcomes.iter().filter(|o| **o == wanted).count();
    let correct_count = count(AnswerOutcome::Correct);
    let total_count = outcomes.len();
    let score = score_percent(correct_count, total_count);
    let pass = bank.pass_percent();

    ExamResult {
        correct_count,
        incorrect_count: count(AnswerOutcome::Incorrect),
        unanswered_count: count(AnswerOutcome::Unanswered),
        total_count,
        score_percent: score,
        pass_percent: pass.value(),
        passed: passed(score, pass),
        outcomes,
    }
}

#[must_use]
pub fn passed(score_percent: u8, pass: PassPercent) -> bool {
    score_percent >= pass.value()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BankId, Prompt};
    use proptest::prelude::*;

    fn single(correct: usize) -> Question {
        let prompt = Prompt::new(
            "Pick one",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            "single explanation",
        )
        .unwrap();
        Question::new(prompt, AssessmentType::SingleSelect, [correct]).unwrap()
    }

    fn multi(correct: &[usize]) -> Question {
        let prompt = Prompt::new(
            "Pick some",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            "multi explanation",
        )
        .unwrap();
        Question::new(prompt, AssessmentType::MultiSelect, correct.iter().copied()).unwrap()
    }

    fn multi_answer(options: &[usize]) -> Answer {
        Answer::Multi(options.iter().copied().collect())
    }

    fn bank(questions: Vec<Question>, pass: u32) -> QuestionBank {
        QuestionBank::new(BankId::Full, PassPercent::new(pass).unwrap(), questions)
    }

    #[test]
    fn single_select_matches_unique_index() {
        let q = single(2);
        assert!(is_correct(&q, Some(&Answer::Single(2))));
        assert!(!is_correct(&q, Some(&Answer::Single(1))));
        assert_eq!(outcome(&q, None), AnswerOutcome::Unanswered);
    }

    #[test]
    fn multi_select_requires_exact_set() {
        let q = multi(&[0, 2]);
        assert!(!is_correct(&q, Some(&multi_answer(&[0]))));
        assert!(!is_correct(&q, Some(&multi_answer(&[0, 1, 2]))));
        assert!(is_correct(&q, Some(&multi_answer(&[2, 0]))));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(score_percent(3, 5), 60);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(0, 0), 0);
        assert_eq!(score_percent(4, 4), 100);
    }

    #[test]
    fn three_question_scenario_fails_at_seventy() {
        let bank = bank(vec![single(0), single(1), single(2)], 70);
        let mut ledger = AnswerLedger::new(3);
        ledger.record(0, AssessmentType::SingleSelect, 0).unwrap();
        ledger.record(1, AssessmentType::SingleSelect, 1).unwrap();

        let result = grade_all(&bank, &ledger);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.score_percent, 67);
        assert!(!result.passed);
        assert_eq!(result.unanswered_count, 1);
        assert_eq!(result.incorrect_count, 0);
        assert_eq!(
            result.outcomes,
            vec![
                AnswerOutcome::Correct,
                AnswerOutcome::Correct,
                AnswerOutcome::Unanswered
            ]
        );
    }

    #[test]
    fn five_questions_three_correct_scores_sixty() {
        let questions = (0..5).map(|_| single(0)).collect();
        let mut ledger = AnswerLedger::new(5);
        for i in 0..3 {
            ledger.record(i, AssessmentType::SingleSelect, 0).unwrap();
        }
        ledger.record(3, AssessmentType::SingleSelect, 1).unwrap();

        let at_sixty = grade_all(&bank(questions, 60), &ledger);
        assert_eq!(at_sixty.score_percent, 60);
        assert!(at_sixty.passed);
        assert_eq!(at_sixty.incorrect_count, 1);

        let questions = (0..5).map(|_| single(0)).collect();
        assert!(!grade_all(&bank(questions, 61), &ledger).passed);
    }

    #[test]
    fn feedback_marks_every_option() {
        let q = multi(&[0, 2]);
        let fb = grade_one(&q, Some(&multi_answer(&[0, 1])));
        assert_eq!(fb.outcome, AnswerOutcome::Incorrect);
        assert_eq!(
            fb.marks,
            vec![
                OptionMark::CorrectChosen,
                OptionMark::IncorrectChosen,
                OptionMark::CorrectMissed,
                OptionMark::Unmarked
            ]
        );
        assert_eq!(fb.explanation, "multi explanation");
    }

    #[test]
    fn feedback_without_answer_still_shows_correct_options() {
        let fb = grade_one(&single(3), None);
        assert_eq!(fb.outcome, AnswerOutcome::Unanswered);
        assert_eq!(fb.marks[3], OptionMark::CorrectMissed);
        assert_eq!(
            fb.marks.iter().filter(|m| **m == OptionMark::Unmarked).count(),
            3
        );
    }

    proptest! {
        #[test]
        fn multi_select_credit_is_set_equality(
            correct in proptest::collection::btree_set(0usize..4, 1..4),
            chosen in proptest::collection::btree_set(0usize..4, 1..4),
        ) {
            let q = multi(&correct.iter().copied().collect::<Vec<_>>());
            let answer = Answer::Multi(chosen.clone());
            prop_assert_eq!(is_correct(&q, Some(&answer)), chosen == correct);
        }

        #[test]
        fn counts_partition_total(answers in proptest::collection::vec(proptest::option::of(0usize..4), 1..12)) {
            let questions = answers.iter().map(|_| single(1)).collect();
            let mut ledger = AnswerLedger::new(answers.len());
            for (i, a) in answers.iter().enumerate() {
                if let Some(option) = a {
                    ledger.record(i, AssessmentType::SingleSelect, *option).unwrap();
                }
            }
            let result = grade_all(&bank(questions, 50), &ledger);
            prop_assert_eq!(
                result.correct_count + result.incorrect_count + result.unanswered_count,
                result.total_count
            );
            prop_assert_eq!(result.passed, result.score_percent >= 50);
        }
    }
}

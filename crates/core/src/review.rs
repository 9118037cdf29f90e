use serde::{Deserialize, Serialize};

use crate::grader::{self, AnswerOutcome, OptionMark};
use crate::model::{AnswerLedger, AssessmentType, QuestionBank};

/// One option as it appears on the review page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOption {
    pub text: String,
    pub mark: OptionMark,
}

/// One question of a finished exam, with the user's choices highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// Zero-based position in the session's question order.
    pub index: usize,
    pub question: String,
    pub assessment_type: AssessmentType,
    pub options: Vec<ReviewOption>,
    pub outcome: AnswerOutcome,
    pub explanation: String,
}

/// Detailed per-question breakdown of a graded exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamReview {
    entries: Vec<ReviewEntry>,
}

impl ExamReview {
    #[must_use]
    pub fn build(bank: &QuestionBank, ledger: &AnswerLedger) -> Self {
        let entries = bank
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let feedback = grader::grade_one(question, ledger.get(index));
                let options = question
                    .prompt()
                    .answers()
                    .iter()
                    .zip(feedback.marks)
                    .map(|(text, mark)| ReviewOption {
                        text: text.clone(),
                        mark,
                    })
                    .collect();
                ReviewEntry {
                    index,
                    question: question.prompt().question().to_string(),
                    assessment_type: question.assessment_type(),
                    options,
                    outcome: feedback.outcome,
                    explanation: feedback.explanation,
                }
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[ReviewEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&ReviewEntry> {
        self.entries.get(index)
    }

    /// Entries the user got wrong or skipped, in order.
    pub fn mistakes(&self) -> impl Iterator<Item = &ReviewEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome != AnswerOutcome::Correct)
    }
}

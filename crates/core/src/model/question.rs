use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question must offer at least one answer")]
    NoAnswers,

    #[error("question offers {count} answers, at most {max} can be lettered")]
    TooManyAnswers { count: usize, max: usize },

    #[error("correct response cannot be empty")]
    EmptyCorrectResponse,

    #[error("single-select question needs exactly one correct option, got {count}")]
    SingleSelectArity { count: usize },

    #[error("correct option {index} is out of range for {len} answers")]
    CorrectOutOfRange { index: usize, len: usize },

    #[error("invalid answer letter: {0:?}")]
    InvalidLetter(String),

    #[error("unknown assessment type: {0}")]
    UnknownAssessmentType(String),
}

//
// ─── ASSESSMENT TYPE ───────────────────────────────────────────────────────────
//

/// How many options a question expects the user to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssessmentType {
    SingleSelect,
    MultiSelect,
}

impl AssessmentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentType::SingleSelect => "single-select",
            AssessmentType::MultiSelect => "multi-select",
        }
    }

    #[must_use]
    pub fn is_multi(self) -> bool {
        matches!(self, AssessmentType::MultiSelect)
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-select" => Ok(Self::SingleSelect),
            "multi-select" => Ok(Self::MultiSelect),
            other => Err(QuestionError::UnknownAssessmentType(other.to_string())),
        }
    }
}

//
// ─── LETTER DECODING ───────────────────────────────────────────────────────────
//

/// Decodes an answer letter into a zero-based option index.
///
/// Letters map by alphabet position: `a` is 0, `b` is 1, up to `z` at 25.
/// Uppercase letters are accepted and treated like their lowercase form.
///
/// # Errors
///
/// Returns `QuestionError::InvalidLetter` unless the input is exactly one ASCII letter.
pub fn decode_letter(letter: &str) -> Result<usize, QuestionError> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Ok(usize::from(c.to_ascii_lowercase() as u8 - b'a'))
        }
        _ => Err(QuestionError::InvalidLetter(letter.to_string())),
    }
}

/// Most answers a prompt may offer: one per letter `a`..=`z`.
pub const MAX_ANSWERS: usize = 26;

/// Encodes a zero-based option index as its lowercase letter, if it has one.
#[must_use]
pub fn encode_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'a' + i))
}

//
// ─── PROMPT ────────────────────────────────────────────────────────────────────
//

/// Text shown to the user for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    question: String,
    answers: Vec<String>,
    explanation: String,
}

impl Prompt {
    /// # Errors
    ///
    /// Returns `QuestionError::NoAnswers` if `answers` is empty, or
    /// `QuestionError::TooManyAnswers` past [`MAX_ANSWERS`].
    pub fn new(
        question: impl Into<String>,
        answers: Vec<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        if answers.is_empty() {
            return Err(QuestionError::NoAnswers);
        }
        if answers.len() > MAX_ANSWERS {
            return Err(QuestionError::TooManyAnswers {
                count: answers.len(),
                max: MAX_ANSWERS,
            });
        }
        Ok(Self {
            question: question.into(),
            answers,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated question: every correct index points at an existing option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: Prompt,
    assessment_type: AssessmentType,
    correct: BTreeSet<usize>,
}

impl Question {
    /// Build a question from already-decoded option indices.
    ///
    /// Duplicate indices collapse into one.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the correct set is empty, has the wrong
    /// size for a single-select question, or points past the last option.
    pub fn new(
        prompt: Prompt,
        assessment_type: AssessmentType,
        correct: impl IntoIterator<Item = usize>,
    ) -> Result<Self, QuestionError> {
        let correct: BTreeSet<usize> = correct.into_iter().collect();
        if correct.is_empty() {
            return Err(QuestionError::EmptyCorrectResponse);
        }
        if assessment_type == AssessmentType::SingleSelect && correct.len() != 1 {
            return Err(QuestionError::SingleSelectArity {
                count: correct.len(),
            });
        }
        let len = prompt.answers().len();
        if let Some(&index) = correct.iter().find(|&&i| i >= len) {
            return Err(QuestionError::CorrectOutOfRange { index, len });
        }
        Ok(Self {
            prompt,
            assessment_type,
            correct,
        })
    }

    /// Build a question from the letter form used in bank documents.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidLetter` for letters that do not decode,
    /// plus everything [`Question::new`] rejects.
    pub fn from_letters<S: AsRef<str>>(
        prompt: Prompt,
        assessment_type: AssessmentType,
        letters: &[S],
    ) -> Result<Self, QuestionError> {
        let decoded = letters
            .iter()
            .map(|l| decode_letter(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(prompt, assessment_type, decoded)
    }

    #[must_use]
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    #[must_use]
    pub fn assessment_type(&self) -> AssessmentType {
        self.assessment_type
    }

    /// Zero-based indices of the correct options, ascending.
    #[must_use]
    pub fn correct(&self) -> &BTreeSet<usize> {
        &self.correct
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.prompt.answers().len()
    }

    #[must_use]
    pub fn is_correct_option(&self, index: usize) -> bool {
        self.correct.contains(&index)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

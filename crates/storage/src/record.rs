//! Wire shape of a bank document and its conversion into domain types.
//!
//! Answer letters are decoded here, once. Nothing past this module sees them.

use quiz_core::model::{
    AssessmentType, BankId, PassPercent, Prompt, Question, QuestionBank, encode_letter,
};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub question: String,
    pub answers: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub prompt: PromptRecord,
    pub assessment_type: String,
    pub correct_response: Vec<String>,
}

/// Persisted shape for a bank: `{ pass_percent, questions: [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecord {
    pub pass_percent: u32,
    pub questions: Vec<QuestionRecord>,
}

impl QuestionRecord {
    /// # Errors
    ///
    /// Returns `quiz_core::Error` if the prompt, type, or letters are invalid.
    pub fn into_question(self) -> Result<Question, quiz_core::Error> {
        let prompt = Prompt::new(
            self.prompt.question,
            self.prompt.answers,
            self.prompt.explanation,
        )?;
        let kind: AssessmentType = self.assessment_type.parse()?;
        Ok(Question::from_letters(
            prompt,
            kind,
            &self.correct_response,
        )?)
    }

    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            prompt: PromptRecord {
                question: question.prompt().question().to_owned(),
                answers: question.prompt().answers().to_vec(),
                explanation: question.prompt().explanation().to_owned(),
            },
            assessment_type: question.assessment_type().as_str().to_owned(),
            // Prompts cap answers at `MAX_ANSWERS`, so every index has a letter.
            correct_response: question
                .correct()
                .iter()
                .filter_map(|i| encode_letter(*i))
                .map(String::from)
                .collect(),
        }
    }
}

impl BankRecord {
    /// Convert the record into a domain bank, keeping document order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Malformed` naming the first offending question.
    pub fn into_bank(self, id: BankId) -> Result<QuestionBank, StorageError> {
        let pass_percent =
            PassPercent::new(self.pass_percent).map_err(|e| StorageError::Malformed {
                context: "pass_percent".into(),
                source: e.into(),
            })?;

        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .into_question()
                    .map_err(|source| StorageError::Malformed {
                        context: format!("question {}", index + 1),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QuestionBank::new(id, pass_percent, questions))
    }

    #[must_use]
    pub fn from_bank(bank: &QuestionBank) -> Self {
        Self {
            pass_percent: u32::from(bank.pass_percent().value()),
            questions: bank
                .questions()
                .iter()
                .map(QuestionRecord::from_question)
                .collect(),
        }
    }

    /// Parse a JSON bank document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the bytes are not a bank document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::MAX_ANSWERS;

    const DOC: &str = r#"{
        "pass_percent": 72,
        "questions": [
            {
                "prompt": {
                    "question": "Which are valid?",
                    "answers": ["one", "two", "three"],
                    "explanation": "One and three."
                },
                "assessment_type": "multi-select",
                "correct_response": ["a", "c"]
            },
            {
                "prompt": { "question": "Pick b", "answers": ["x", "y"], "explanation": "" },
                "assessment_type": "single-select",
                "correct_response": ["b"]
            }
        ]
    }"#;

    #[test]
    fn decodes_letters_into_indices() {
        let bank = BankRecord::from_json(DOC.as_bytes())
            .unwrap()
            .into_bank(BankId::Test003)
            .unwrap();

        assert_eq!(bank.pass_percent().value(), 72);
        assert_eq!(bank.len(), 2);
        let first = bank.question(0).unwrap();
        assert_eq!(first.assessment_type(), AssessmentType::MultiSelect);
        assert_eq!(first.correct().iter().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(bank.question(1).unwrap().correct().len(), 1);
    }

    #[test]
    fn out_of_range_letter_is_malformed() {
        let doc = DOC.replace(r#"["b"]"#, r#"["d"]"#);
        let err = BankRecord::from_json(doc.as_bytes())
            .unwrap()
            .into_bank(BankId::Test003)
            .unwrap_err();
        match err {
            StorageError::Malformed { context, .. } => assert_eq!(context, "question 2"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_assessment_type_is_malformed() {
        let doc = DOC.replace("single-select", "essay");
        let err = BankRecord::from_json(doc.as_bytes())
            .unwrap()
            .into_bank(BankId::Test003)
            .unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[test]
    fn pass_percent_over_hundred_is_malformed() {
        let doc = DOC.replace("72", "172");
        let err = BankRecord::from_json(doc.as_bytes())
            .unwrap()
            .into_bank(BankId::Test003)
            .unwrap_err();
        assert!(err.to_string().contains("pass_percent"));
    }

    #[test]
    fn too_many_answers_is_malformed() {
        let answers = (0..=MAX_ANSWERS)
            .map(|i| format!("\"{i}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let doc = DOC.replace(r#"["x", "y"]"#, &format!("[{answers}]"));
        let err = BankRecord::from_json(doc.as_bytes())
            .unwrap()
            .into_bank(BankId::Test003)
            .unwrap_err();
        match err {
            StorageError::Malformed { context, source } => {
                assert_eq!(context, "question 2");
                assert!(source.to_string().contains("27 answers"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        let err = BankRecord::from_json(b"{ not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn from_bank_encodes_letters_back() {
        let record = BankRecord::from_json(DOC.as_bytes()).unwrap();
        let bank = record.clone().into_bank(BankId::Full).unwrap();
        assert_eq!(BankRecord::from_bank(&bank), record);
    }
}

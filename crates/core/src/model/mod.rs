mod answer;
mod bank;
mod ids;
mod question;

pub use ids::{BankId, ParseIdError, SessionId};

pub use answer::{Answer, AnswerLedger, LedgerError};
pub use bank::{BankError, PassPercent, QuestionBank};
pub use question::{
    AssessmentType, MAX_ANSWERS, Prompt, Question, QuestionError, decode_letter, encode_letter,
};

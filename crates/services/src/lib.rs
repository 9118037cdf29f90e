#![forbid(unsafe_code)]

pub mod bank_loader;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use bank_loader::BankLoader;
pub use error::{LoadError, QuizError};

pub use sessions::{ExamTimer, QuizLoopService, QuizProgress, QuizRunner};

mod progress;
mod service;
mod timer;
mod workflow;

// Public API of the quiz session subsystem.
pub use progress::QuizProgress;
pub use service::QuizRunner;
pub use timer::{ExamTimer, TICK_PERIOD};
pub use workflow::QuizLoopService;

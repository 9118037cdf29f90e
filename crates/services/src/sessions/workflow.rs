use quiz_core::Clock;
use quiz_core::model::BankId;
use quiz_core::session::SessionMode;
use storage::repository::Storage;

use crate::bank_loader::BankLoader;
use crate::error::QuizError;
use super::service::QuizRunner;

/// Orchestrates bank loading and quiz start.
///
/// Loading is the only asynchronous step; a failed load creates nothing.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    loader: BankLoader,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, loader: BankLoader) -> Self {
        Self { clock, loader }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(clock, BankLoader::from_storage(storage))
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.loader = self.loader.with_shuffle(shuffle);
        self
    }

    /// The bank catalog, in display order.
    #[must_use]
    pub fn list_banks(&self) -> &'static [BankId] {
        &BankId::ALL
    }

    /// Load `bank_id` and start a quiz on it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Load` if the bank cannot be loaded, or
    /// `QuizError::Session` if it has no questions.
    pub async fn start_quiz(
        &self,
        bank_id: BankId,
        mode: SessionMode,
    ) -> Result<QuizRunner, QuizError> {
        let bank = self.loader.load(bank_id).await?;
        Ok(QuizRunner::start(bank, mode, self.clock)?)
    }

    /// Like [`QuizLoopService::start_quiz`], resolving the bank by name.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Load` for unknown names and failed loads.
    pub async fn start_named(&self, bank: &str, mode: SessionMode) -> Result<QuizRunner, QuizError> {
        let bank = self.loader.load_named(bank).await?;
        Ok(QuizRunner::start(bank, mode, self.clock)?)
    }

    /// Reload the runner's bank with a fresh order and start over in the same mode.
    ///
    /// The previous runner is left untouched, so a failed reload can keep it;
    /// replacing it drops its timer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the reload fails.
    pub async fn restart(&self, previous: &QuizRunner) -> Result<QuizRunner, QuizError> {
        let bank_id = previous.session().bank().id();
        tracing::info!(session = %previous.id(), bank = %bank_id, "restarting quiz");
        self.start_quiz(bank_id, previous.mode()).await
    }
}

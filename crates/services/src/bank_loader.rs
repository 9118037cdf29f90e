use rand::rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

use quiz_core::model::{BankId, QuestionBank};
use storage::repository::{BankSource, Storage};

use crate::error::LoadError;

/// Fetches bank documents and turns them into session-ready banks.
///
/// Each load yields a fresh uniform shuffle of the document's question order.
#[derive(Clone)]
pub struct BankLoader {
    source: Arc<dyn BankSource>,
    shuffle: bool,
}

impl BankLoader {
    #[must_use]
    pub fn new(source: Arc<dyn BankSource>) -> Self {
        Self {
            source,
            shuffle: true,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.banks))
    }

    /// Keep document order instead of shuffling. Useful for scripted runs.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Load a bank by its catalog id.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Unreachable` when the source cannot provide the
    /// document and `LoadError::Malformed` when its content is invalid.
    pub async fn load(&self, id: BankId) -> Result<QuestionBank, LoadError> {
        let record = self.source.fetch_bank(id).await.map_err(|err| {
            tracing::warn!(
                bank = %id,
                source = %self.source.describe(),
                error = %err,
                "bank fetch failed"
            );
            LoadError::from_storage(id, err)
        })?;

        let bank = record.into_bank(id).map_err(|err| {
            tracing::warn!(bank = %id, error = %err, "bank document rejected");
            LoadError::from_storage(id, err)
        })?;

        let bank = if self.shuffle {
            let pass_percent = bank.pass_percent();
            let mut questions = bank.into_questions();
            questions.shuffle(&mut rng());
            QuestionBank::new(id, pass_percent, questions)
        } else {
            bank
        };

        tracing::info!(
            bank = %id,
            questions = bank.len(),
            pass_percent = bank.pass_percent().value(),
            shuffled = self.shuffle,
            "bank loaded"
        );
        Ok(bank)
    }

    /// Load a bank by short id or document name.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::UnknownBank` for names outside the catalog, or
    /// any error from [`BankLoader::load`].
    pub async fn load_named(&self, name: &str) -> Result<QuestionBank, LoadError> {
        let id: BankId = name
            .trim()
            .parse()
            .map_err(|_| LoadError::UnknownBank(name.to_string()))?;
        self.load(id).await
    }
}

use async_trait::async_trait;
use quiz_core::model::BankId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::json::{HttpBankSource, JsonDirSource};
use crate::record::BankRecord;

/// Errors surfaced by bank sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("bank not found: {0}")]
    NotFound(BankId),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed bank document ({context}): {source}")]
    Malformed {
        context: String,
        #[source]
        source: quiz_core::Error,
    },
}

impl StorageError {
    /// Whether the source itself could not be reached, as opposed to
    /// returning a document that failed to parse.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, StorageError::NotFound(_) | StorageError::Connection(_))
    }

    /// Whether a secondary source should be tried instead. An unparsable body
    /// (an error page from a proxy, say) counts; a document that parses but
    /// fails validation is never produced by a source and is not retried.
    #[must_use]
    pub fn warrants_fallback(&self) -> bool {
        self.is_unreachable() || matches!(self, StorageError::Serialization(_))
    }
}

/// Source contract for raw bank documents.
#[async_trait]
pub trait BankSource: Send + Sync {
    /// Fetch the document for one bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the source has no such bank, or
    /// other storage errors when the transport or payload fails.
    async fn fetch_bank(&self, id: BankId) -> Result<BankRecord, StorageError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Preloaded bank documents, for bundled data and tests.
#[derive(Clone, Default)]
pub struct InMemoryBankSource {
    banks: Arc<Mutex<HashMap<BankId, BankRecord>>>,
}

impl InMemoryBankSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            banks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add or replace a bank document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert(&self, id: BankId, record: BankRecord) -> Result<(), StorageError> {
        let mut guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, record);
        Ok(())
    }

    /// Builder-style [`InMemoryBankSource::insert`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn with_bank(self, id: BankId, record: BankRecord) -> Result<Self, StorageError> {
        self.insert(id, record)?;
        Ok(self)
    }
}

#[async_trait]
impl BankSource for InMemoryBankSource {
    async fn fetch_bank(&self, id: BankId) -> Result<BankRecord, StorageError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound(id))
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

/// Tries `primary`, and falls back to `fallback` when the primary cannot be
/// reached or answers with something that is not a bank document.
pub struct FallbackSource {
    primary: Arc<dyn BankSource>,
    fallback: Arc<dyn BankSource>,
}

impl FallbackSource {
    #[must_use]
    pub fn new(primary: Arc<dyn BankSource>, fallback: Arc<dyn BankSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl BankSource for FallbackSource {
    async fn fetch_bank(&self, id: BankId) -> Result<BankRecord, StorageError> {
        match self.primary.fetch_bank(id).await {
            Err(err) if err.warrants_fallback() => {
                tracing::warn!(
                    bank = %id,
                    primary = %self.primary.describe(),
                    fallback = %self.fallback.describe(),
                    error = %err,
                    "primary bank source failed, using fallback"
                );
                self.fallback.fetch_bank(id).await
            }
            other => other,
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} (fallback: {})",
            self.primary.describe(),
            self.fallback.describe()
        )
    }
}

/// Bank source behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub banks: Arc<dyn BankSource>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(source: InMemoryBankSource) -> Self {
        Self {
            banks: Arc::new(source),
        }
    }

    /// Banks read from JSON documents in `dir`.
    #[must_use]
    pub fn json_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            banks: Arc::new(JsonDirSource::new(dir)),
        }
    }

    /// Banks fetched over HTTP, with a local directory as fallback.
    #[must_use]
    pub fn http_with_fallback(http: HttpBankSource, dir: impl Into<PathBuf>) -> Self {
        let primary: Arc<dyn BankSource> = Arc::new(http);
        let fallback: Arc<dyn BankSource> = Arc::new(JsonDirSource::new(dir));
        Self {
            banks: Arc::new(FallbackSource::new(primary, fallback)),
        }
    }
}

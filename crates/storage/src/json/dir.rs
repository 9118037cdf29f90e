use async_trait::async_trait;
use quiz_core::model::BankId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::record::BankRecord;
use crate::repository::{BankSource, StorageError};

/// Bank documents stored as `<document_name>` files under one directory.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, id: BankId) -> PathBuf {
        self.dir.join(id.document_name())
    }
}

#[async_trait]
impl BankSource for JsonDirSource {
    async fn fetch_bank(&self, id: BankId) -> Result<BankRecord, StorageError> {
        let path = self.path_for(id);
        tracing::debug!(bank = %id, path = %path.display(), "reading bank document");

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(id),
            _ => StorageError::Connection(format!("{}: {e}", path.display())),
        })?;

        BankRecord::from_json(&bytes)
    }

    fn describe(&self) -> String {
        format!("dir {}", self.dir.display())
    }
}

use async_trait::async_trait;
use quiz_core::model::BankId;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::record::BankRecord;
use crate::repository::{BankSource, StorageError};

/// Bank documents served over HTTP as `<base>/<document_name>`.
#[derive(Clone)]
pub struct HttpBankSource {
    client: Client,
    base: Url,
}

impl HttpBankSource {
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, StorageError> {
        Self::with_client(Client::new(), base)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if `base` is not an absolute URL.
    pub fn with_client(client: Client, base: &str) -> Result<Self, StorageError> {
        // Url::join drops the last path segment unless it ends with '/'.
        let normalized = format!("{}/", base.trim_end_matches('/'));
        let base = Url::parse(&normalized)
            .map_err(|e| StorageError::Connection(format!("invalid bank url {base}: {e}")))?;
        Ok(Self { client, base })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the document name cannot be joined.
    pub fn url_for(&self, id: BankId) -> Result<Url, StorageError> {
        self.base
            .join(id.document_name())
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl BankSource for HttpBankSource {
    async fn fetch_bank(&self, id: BankId) -> Result<BankRecord, StorageError> {
        let url = self.url_for(id)?;
        tracing::debug!(bank = %id, %url, "fetching bank document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(id));
        }
        if !status.is_success() {
            return Err(StorageError::Connection(format!("unexpected status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        BankRecord::from_json(&bytes)
    }

    fn describe(&self) -> String {
        format!("http {}", self.base)
    }
}

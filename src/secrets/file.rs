//! Directory-backed secret store.

use super::SecretStore;
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Reads secret `<id>` from `<root>/<id>.json`.
///
/// Identifiers containing `/` map to subdirectories, so `billing/prod` is
/// read from `<root>/billing/prod.json`. Unlike config files, a missing
/// secret is an error.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn secret_path(&self, secret_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", secret_id))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<Value> {
        let path = self.secret_path(secret_id);
        debug!(secret = secret_id, path = %path.display(), "Reading secret file");

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ConfigError::secret_store(secret_id, format!("{}: {}", path.display(), e)))?;
        super::parse_payload(secret_id, &content)
    }

    fn name(&self) -> &str {
        "file"
    }
}

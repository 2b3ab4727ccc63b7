//! Secret store abstraction.
//!
//! A secret store maps a secret identifier (for example `billing-api/production`)
//! to a JSON object of secret values. Payloads may be flat with dotted keys
//! (`{"db.password": "..."}`) or already nested.
//!
//! ## Stores
//!
//! - `StaticSecretStore`: in-memory payloads, for embedding and tests
//! - `FileSecretStore`: one JSON file per secret under a directory
//! - `CommandSecretStore`: AWS Secrets Manager through the `aws` CLI

mod command;
mod file;

pub use command::{CommandSecretStore, DEFAULT_REGION};
pub use file::FileSecretStore;

use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// A source of secret payloads.
///
/// Implementations own their own timeouts and credentials; callers only see
/// the parsed payload or an error.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the payload stored under `secret_id`.
    async fn fetch(&self, secret_id: &str) -> Result<Value>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// In-memory secret store.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, Value>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payload under `secret_id`.
    pub fn with_secret(mut self, secret_id: impl Into<String>, payload: Value) -> Self {
        self.secrets.insert(secret_id.into(), payload);
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<Value> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| ConfigError::secret_store(secret_id, "secret not found"))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Parse a secret string payload into JSON.
pub(crate) fn parse_payload(secret_id: &str, payload: &str) -> Result<Value> {
    serde_json::from_str(payload.trim())
        .map_err(|e| ConfigError::secret_store(secret_id, format!("payload is not JSON: {}", e)))
}

//! AWS Secrets Manager store backed by the `aws` CLI.

use super::SecretStore;
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Default AWS region for secret lookups.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Fetches `SecretString` payloads with
/// `aws secretsmanager get-secret-value` and parses them as JSON.
///
/// Credentials and timeouts come from the AWS CLI's own configuration.
#[derive(Debug, Clone)]
pub struct CommandSecretStore {
    program: String,
    region: String,
    profile: Option<String>,
}

impl CommandSecretStore {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            program: "aws".to_string(),
            region: region.into(),
            profile: None,
        }
    }

    /// Use a named AWS CLI profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Override the executable, for wrappers such as `aws-vault exec`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, secret_id: &str) -> Vec<String> {
        let mut args = vec![
            "secretsmanager".to_string(),
            "get-secret-value".to_string(),
            "--secret-id".to_string(),
            secret_id.to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--query".to_string(),
            "SecretString".to_string(),
            "--output".to_string(),
            "text".to_string(),
        ];
        if let Some(ref profile) = self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

impl Default for CommandSecretStore {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

#[async_trait]
impl SecretStore for CommandSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<Value> {
        debug!(
            secret = secret_id,
            region = %self.region,
            "Fetching secret from AWS Secrets Manager"
        );

        let output = Command::new(&self.program)
            .args(self.args(secret_id))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ConfigError::secret_store(
                    secret_id,
                    format!("failed to run '{}': {}. Is it installed?", self.program, e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                "process exited with non-zero status".to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ConfigError::secret_store(secret_id, reason));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        super::parse_payload(secret_id, &stdout)
    }

    fn name(&self) -> &str {
        "aws"
    }
}

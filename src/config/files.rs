//! JSON file sources.
//!
//! Only a nonexistent file is treated as an empty contribution. A file that
//! exists but cannot be read or parsed is an error.

use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Read a JSON config file, returning an empty object when it does not exist.
pub async fn read_json_file(path: &Path) -> Result<Value> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            debug!(path = %path.display(), "Config file found");
            serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file not found");
            Ok(Value::Object(Map::new()))
        }
        Err(e) => Err(ConfigError::io(path, e)),
    }
}

/// Read a JSON file that must exist.
pub async fn read_required_json_file(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e))
}

//! Environment and secret name resolution.

use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use tracing::debug;

/// Process-wide environment variable naming the active environment.
pub const ENV_VAR: &str = "APP_ENV";

/// Environment used when nothing else is configured.
pub const DEFAULT_ENV: &str = "local";

/// Placeholder replaced by the environment name in secret name templates.
pub const ENV_PLACEHOLDER: &str = "{env}";

/// Resolve the active environment from an explicit value, `APP_ENV`, or `local`.
pub fn resolve_env(explicit: Option<&str>) -> String {
    resolve_env_with(explicit, std::env::var(ENV_VAR).ok().as_deref())
}

/// Resolve the environment against an explicit process default.
///
/// Empty strings count as unset at both levels.
pub fn resolve_env_with(explicit: Option<&str>, process_default: Option<&str>) -> String {
    explicit
        .filter(|s| !s.is_empty())
        .or(process_default.filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_ENV)
        .to_string()
}

/// Resolve the secret identifier.
///
/// An explicit name is returned unchanged and the package name is never
/// looked up. Otherwise the name is `<package>/<env>`, and any failure to
/// read the package name is returned as-is.
pub async fn resolve_secret_name<F, Fut>(
    explicit: Option<&str>,
    package_name: F,
    env: &str,
) -> Result<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    let package = package_name().await?;
    Ok(format!("{}/{}", package, env))
}

/// Substitute `{env}` in a secret name template.
pub fn render_secret_template(template: &str, env: &str) -> String {
    template.replace(ENV_PLACEHOLDER, env)
}

/// Read the `name` field of a JSON package manifest.
pub async fn package_name(manifest_path: &Path) -> Result<String> {
    let manifest_error = |reason: String| ConfigError::Manifest {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let content = tokio::fs::read_to_string(manifest_path)
        .await
        .map_err(|e| manifest_error(e.to_string()))?;
    let manifest: Value =
        serde_json::from_str(&content).map_err(|e| manifest_error(e.to_string()))?;

    let name = manifest
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| manifest_error("missing string field 'name'".to_string()))?;

    debug!(name, "Found package name");
    Ok(name.to_string())
}

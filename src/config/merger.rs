//! Configuration merger with ordered source merging.
//!
//! Resolves each requested source concurrently, then deep-merges them in the
//! requested order into a fresh object. Nothing is cached between calls.

use super::env::{package_name, resolve_env, resolve_secret_name};
use super::files::read_json_file;
use super::merge::{deep_merge_all, unflatten};
use super::source::{ConfigSource, parse_order, validate_order};
use crate::error::{ConfigError, Result};
use crate::secrets::SecretStore;
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Default local override file name.
pub const DEFAULT_RC_FILE: &str = ".stratarc";

/// Default package manifest file name.
pub const DEFAULT_MANIFEST_FILE: &str = "package.json";

/// Default config directory name.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// How to treat a merge where neither the default nor the env file
/// contributed anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingSourcePolicy {
    /// Missing files are empty contributions.
    #[default]
    Lenient,
    /// Fail when the order names `default` or `env` and both are empty.
    Strict,
}

/// Where a merger reads its sources from.
#[derive(Debug, Clone)]
pub struct MergerOptions {
    /// Directory holding `default.json` and `<env>.json`
    pub config_dir: PathBuf,
    /// Local override file
    pub rc_path: PathBuf,
    /// JSON manifest providing the package name for secret names
    pub manifest_path: PathBuf,
    /// Explicit environment (falls back to `APP_ENV`, then `local`)
    pub env: Option<String>,
    /// Explicit secret name (falls back to `<package>/<env>`)
    pub secret_name: Option<String>,
    pub missing_policy: MissingSourcePolicy,
}

impl Default for MergerOptions {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            rc_path: PathBuf::from(DEFAULT_RC_FILE),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_FILE),
            env: None,
            secret_name: None,
            missing_policy: MissingSourcePolicy::default(),
        }
    }
}

impl MergerOptions {
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_rc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rc_path = path.into();
        self
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_secret_name(mut self, name: impl Into<String>) -> Self {
        self.secret_name = Some(name.into());
        self
    }

    pub fn with_missing_policy(mut self, policy: MissingSourcePolicy) -> Self {
        self.missing_policy = policy;
        self
    }
}

/// Per-call merge behaviour.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Sources to merge, later entries win
    pub order: Vec<ConfigSource>,
    /// Expand dotted secret keys into nested objects before merging
    pub unflatten_secrets: bool,
    /// Fetch secrets when the environment is `local`
    pub include_secrets_for_local: bool,
    /// Fetch secrets when the environment is `test`
    pub include_secrets_for_test: bool,
    /// Add an `is<Env>: true` key just before the rc source
    pub add_env_flag: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            order: ConfigSource::ALL.to_vec(),
            unflatten_secrets: true,
            include_secrets_for_local: true,
            include_secrets_for_test: false,
            add_env_flag: false,
        }
    }
}

impl MergeOptions {
    pub fn with_order(mut self, order: impl Into<Vec<ConfigSource>>) -> Self {
        self.order = order.into();
        self
    }

    pub fn with_unflatten_secrets(mut self, unflatten: bool) -> Self {
        self.unflatten_secrets = unflatten;
        self
    }

    pub fn with_secrets_for_local(mut self, include: bool) -> Self {
        self.include_secrets_for_local = include;
        self
    }

    pub fn with_secrets_for_test(mut self, include: bool) -> Self {
        self.include_secrets_for_test = include;
        self
    }

    pub fn with_env_flag(mut self, add: bool) -> Self {
        self.add_env_flag = add;
        self
    }
}

/// Merges default, env, secret and rc sources for one environment.
#[derive(Clone)]
pub struct ConfigMerger {
    config_dir: PathBuf,
    rc_path: PathBuf,
    manifest_path: PathBuf,
    env: String,
    secret_name: Option<String>,
    missing_policy: MissingSourcePolicy,
    store: Arc<dyn SecretStore>,
}

impl std::fmt::Debug for ConfigMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMerger")
            .field("config_dir", &self.config_dir)
            .field("rc_path", &self.rc_path)
            .field("env", &self.env)
            .field("secret_name", &self.secret_name)
            .field("missing_policy", &self.missing_policy)
            .field("store", &self.store.name())
            .finish()
    }
}

impl ConfigMerger {
    /// Create a merger; the environment is resolved once, here.
    pub fn new(options: MergerOptions, store: Arc<dyn SecretStore>) -> Self {
        let env = resolve_env(options.env.as_deref());
        debug!(
            env = %env,
            config_dir = %options.config_dir.display(),
            secret_name = ?options.secret_name,
            store = store.name(),
            "Config merger created"
        );
        Self {
            config_dir: options.config_dir,
            rc_path: options.rc_path,
            manifest_path: options.manifest_path,
            env,
            secret_name: options.secret_name,
            missing_policy: options.missing_policy,
            store,
        }
    }

    /// The resolved environment name.
    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn default_config_path(&self) -> PathBuf {
        self.config_dir.join("default.json")
    }

    pub fn env_config_path(&self) -> PathBuf {
        self.config_dir.join(format!("{}.json", self.env))
    }

    /// The secret identifier: explicit, or `<package>/<env>` from the manifest.
    pub async fn secret_name(&self) -> Result<String> {
        resolve_secret_name(
            self.secret_name.as_deref(),
            || package_name(&self.manifest_path),
            &self.env,
        )
        .await
    }

    /// `<config_dir>/default.json`, or `{}` if absent.
    pub async fn default_config(&self) -> Result<Value> {
        read_json_file(&self.default_config_path()).await
    }

    /// `<config_dir>/<env>.json`, or `{}` if absent.
    pub async fn env_config(&self) -> Result<Value> {
        read_json_file(&self.env_config_path()).await
    }

    /// The local override file, or `{}` if absent.
    pub async fn rc_config(&self) -> Result<Value> {
        read_json_file(&self.rc_path).await
    }

    /// Fetch the secret payload, optionally expanding dotted keys.
    pub async fn secrets(&self, unflatten_keys: bool) -> Result<Value> {
        let name = self.secret_name().await?;
        debug!(secret = %name, store = self.store.name(), "Fetching secrets");
        let payload = self.store.fetch(&name).await?;
        Ok(if unflatten_keys {
            unflatten(payload)
        } else {
            payload
        })
    }

    /// Whether the secret fetch is skipped for this environment.
    pub fn secrets_suppressed(&self, options: &MergeOptions) -> bool {
        (self.env == "local" && !options.include_secrets_for_local)
            || (self.env == "test" && !options.include_secrets_for_test)
    }

    /// The `is<Env>: true` object added by `add_env_flag`.
    ///
    /// The env name is capitalized, not camel-cased: `pre-prod` gives
    /// `isPre-prod` and `preProd` gives `isPreprod`.
    pub fn env_flag(&self) -> Value {
        let mut map = Map::new();
        map.insert(format!("is{}", capitalize(&self.env)), Value::Bool(true));
        Value::Object(map)
    }

    async fn secrets_for_merge(&self, options: &MergeOptions) -> Result<Value> {
        if self.secrets_suppressed(options) {
            info!(env = %self.env, "Skipping secrets for this environment");
            return Ok(empty_object());
        }
        self.secrets(options.unflatten_secrets).await
    }

    /// Merge the sources named in `options.order`.
    ///
    /// The order is validated before any source is read. Sources not named
    /// in the order are never read. The first failing source fails the merge.
    ///
    /// `secrets` contributes `{}` without being fetched when the env is
    /// `test` and `include_secrets_for_test` is off, which is the
    /// [`MergeOptions::default`]. The same applies to `local` with
    /// `include_secrets_for_local`.
    pub async fn merge(&self, options: &MergeOptions) -> Result<Value> {
        validate_order(&options.order)?;
        debug!(
            env = %self.env,
            order = ?options.order,
            unflatten_secrets = options.unflatten_secrets,
            "Merging configuration"
        );

        let wants = |source: ConfigSource| options.order.contains(&source);
        let (mut default, mut env, mut secrets, mut rc) = tokio::try_join!(
            load_if(wants(ConfigSource::Default), self.default_config()),
            load_if(wants(ConfigSource::Env), self.env_config()),
            load_if(wants(ConfigSource::Secrets), self.secrets_for_merge(options)),
            load_if(wants(ConfigSource::Rc), self.rc_config()),
        )?;

        self.check_missing(default.as_ref(), env.as_ref())?;

        let mut layers = Vec::with_capacity(options.order.len() + 1);
        for source in &options.order {
            if *source == ConfigSource::Rc && options.add_env_flag {
                layers.push(self.env_flag());
            }
            let layer = match source {
                ConfigSource::Default => default.take(),
                ConfigSource::Env => env.take(),
                ConfigSource::Secrets => secrets.take(),
                ConfigSource::Rc => rc.take(),
            };
            layers.push(layer.unwrap_or_else(empty_object));
        }
        if options.add_env_flag && !wants(ConfigSource::Rc) {
            layers.push(self.env_flag());
        }

        Ok(deep_merge_all(layers))
    }

    /// Merge with an order given as source names.
    pub async fn merge_named<S: AsRef<str>>(
        &self,
        names: &[S],
        options: &MergeOptions,
    ) -> Result<Value> {
        let order = parse_order(names)?;
        self.merge(&options.clone().with_order(order)).await
    }

    fn check_missing(&self, default: Option<&Value>, env: Option<&Value>) -> Result<()> {
        if self.missing_policy == MissingSourcePolicy::Lenient {
            return Ok(());
        }
        if default.is_none() && env.is_none() {
            return Ok(());
        }
        let contributed = [default, env]
            .into_iter()
            .flatten()
            .any(|value| !is_empty_object(value));
        if contributed {
            Ok(())
        } else {
            Err(ConfigError::NoConfigFiles {
                dir: self.config_dir.clone(),
                env: self.env.clone(),
            })
        }
    }
}

async fn load_if<F>(enabled: bool, load: F) -> Result<Option<Value>>
where
    F: Future<Output = Result<Value>>,
{
    if enabled {
        load.await.map(Some)
    } else {
        Ok(None)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// First character upper case, the rest lower case.
fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

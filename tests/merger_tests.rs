//! Integration tests for ConfigMerger.
//!
//! These tests build config directories on disk and verify merge order,
//! missing-file tolerance, secret handling and error propagation.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use strata_config::config::{
    ConfigMerger, ConfigSource, MergeOptions, MergerOptions, MissingSourcePolicy, deep_merge_all,
};
use strata_config::error::{ConfigError, Result};
use strata_config::secrets::{SecretStore, StaticSecretStore};
use tempfile::TempDir;

/// Secret store that counts fetches and serves one payload for any name.
struct CountingStore {
    payload: Value,
    fetches: AtomicUsize,
}

impl CountingStore {
    fn new(payload: Value) -> Arc<Self> {
        Arc::new(Self {
            payload,
            fetches: AtomicUsize::new(0),
        })
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn fetch(&self, _secret_id: &str) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Secret store that always fails.
struct FailingStore;

#[async_trait]
impl SecretStore for FailingStore {
    async fn fetch(&self, secret_id: &str) -> Result<Value> {
        Err(ConfigError::secret_store(secret_id, "access denied"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
}

/// Temp dir with config/default.json, config/dev.json, config/test.json and .stratarc.
fn setup_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config");
    write_json(&config.join("default.json"), &json!({"fooDefault": 123, "shared": {"a": "default", "b": "default"}}));
    write_json(&config.join("dev.json"), &json!({"fooDev": 456, "shared": {"b": "dev"}}));
    write_json(&config.join("test.json"), &json!({"fooTest": 1011}));
    write_json(&temp.path().join(".stratarc"), &json!({"fooRc": 789, "shared": {"a": "rc"}}));
    temp
}

/// Every non-empty ordered selection of distinct sources.
fn collect_orders(prefix: &mut Vec<ConfigSource>, out: &mut Vec<Vec<ConfigSource>>) {
    for source in ConfigSource::ALL {
        if prefix.contains(&source) {
            continue;
        }
        prefix.push(source);
        out.push(prefix.clone());
        collect_orders(prefix, out);
        prefix.pop();
    }
}

fn options_for(temp: &TempDir, env: &str) -> MergerOptions {
    MergerOptions::default()
        .with_config_dir(temp.path().join("config"))
        .with_rc_path(temp.path().join(".stratarc"))
        .with_manifest_path(temp.path().join("package.json"))
        .with_env(env)
}

fn merger_with(temp: &TempDir, env: &str, store: Arc<dyn SecretStore>) -> ConfigMerger {
    ConfigMerger::new(options_for(temp, env).with_secret_name("my-app/secret"), store)
}

fn secret_store() -> Arc<dyn SecretStore> {
    Arc::new(StaticSecretStore::new().with_secret(
        "my-app/secret",
        json!({"fooSecret": "bar", "shared.b": "secret"}),
    ))
}

#[tokio::test]
async fn default_order_merges_all_sources() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", secret_store());

    let merged = merger.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(
        merged,
        json!({
            "fooDefault": 123,
            "shared": {"a": "rc", "b": "secret"},
            "fooDev": 456,
            "fooSecret": "bar",
            "fooRc": 789
        })
    );
}

#[tokio::test]
async fn env_overrides_default_recursively() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config");
    write_json(&config.join("default.json"), &json!({"x": 1, "y": {"z": 1}}));
    write_json(&config.join("test.json"), &json!({"y": {"z": 2}}));

    let merger = merger_with(&temp, "test", secret_store());
    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Env]);
    let merged = merger.merge(&options).await.unwrap();
    assert_eq!(merged, json!({"x": 1, "y": {"z": 2}}));
}

#[tokio::test]
async fn every_order_matches_fold_of_sources() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", secret_store());

    let default = merger.default_config().await.unwrap();
    let env = merger.env_config().await.unwrap();
    let secrets = merger.secrets(true).await.unwrap();
    let rc = merger.rc_config().await.unwrap();
    let value_of = |source: ConfigSource| match source {
        ConfigSource::Default => default.clone(),
        ConfigSource::Env => env.clone(),
        ConfigSource::Secrets => secrets.clone(),
        ConfigSource::Rc => rc.clone(),
    };

    let mut orders = Vec::new();
    collect_orders(&mut Vec::new(), &mut orders);
    assert_eq!(orders.len(), 64);

    for order in orders {
        let expected = deep_merge_all(order.iter().map(|s| value_of(*s)));
        let merged = merger
            .merge(&MergeOptions::default().with_order(order.clone()))
            .await
            .unwrap();
        assert_eq!(merged, expected, "order {:?}", order);
    }
}

#[tokio::test]
async fn later_source_wins_in_custom_order() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", secret_store());

    let options = MergeOptions::default().with_order([
        ConfigSource::Rc,
        ConfigSource::Env,
        ConfigSource::Default,
    ]);
    let merged = merger.merge(&options).await.unwrap();
    assert_eq!(merged["shared"], json!({"a": "default", "b": "default"}));
    assert_eq!(merged["fooRc"], json!(789));
}

#[tokio::test]
async fn merge_is_idempotent() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", secret_store());

    let first = merger.merge(&MergeOptions::default()).await.unwrap();
    let second = merger.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn each_merge_rereads_sources() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", secret_store());
    let options = MergeOptions::default().with_order([ConfigSource::Default]);

    let before = merger.merge(&options).await.unwrap();
    write_json(&temp.path().join("config/default.json"), &json!({"fooDefault": 1}));
    let after = merger.merge(&options).await.unwrap();

    assert_eq!(before["fooDefault"], json!(123));
    assert_eq!(after, json!({"fooDefault": 1}));
}

#[tokio::test]
async fn secrets_are_unflattened_by_default() {
    let temp = TempDir::new().unwrap();
    let store = StaticSecretStore::new()
        .with_secret("my-app/secret", json!({"a.b": 1, "a.c": 2, "top": 3}));
    let merger = merger_with(&temp, "staging", Arc::new(store));
    let options = MergeOptions::default().with_order([ConfigSource::Secrets]);

    let nested = merger.merge(&options).await.unwrap();
    assert_eq!(nested, json!({"a": {"b": 1, "c": 2}, "top": 3}));

    let flat = merger
        .merge(&options.clone().with_unflatten_secrets(false))
        .await
        .unwrap();
    assert_eq!(flat, json!({"a.b": 1, "a.c": 2, "top": 3}));
}

#[tokio::test]
async fn nested_secrets_are_unchanged_by_unflatten() {
    let temp = TempDir::new().unwrap();
    let payload = json!({"db": {"password": "pw"}, "token": "t"});
    let store = StaticSecretStore::new().with_secret("my-app/secret", payload.clone());
    let merger = merger_with(&temp, "staging", Arc::new(store));

    assert_eq!(merger.secrets(true).await.unwrap(), payload);
    assert_eq!(merger.secrets(false).await.unwrap(), payload);
}

#[tokio::test]
async fn invalid_source_fails_before_any_read() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config");
    std::fs::create_dir_all(&config).unwrap();
    // Reading this file would produce a parse error instead.
    std::fs::write(config.join("default.json"), "{ broken").unwrap();

    let store = CountingStore::new(json!({}));
    let merger = merger_with(&temp, "staging", store.clone());

    let err = merger
        .merge_named(&["default", "bogus", "secrets"], &MergeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSource { ref value, .. } if value == "bogus"));
    assert!(err.to_string().contains("bogus"));
    assert!(err.is_configuration());
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn duplicate_source_is_rejected() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", secret_store());
    let err = merger
        .merge_named(&["default", "env", "default"], &MergeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateSource(_)));
}

#[tokio::test]
async fn missing_env_file_yields_default_only() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "staging", secret_store());
    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Env]);

    let merged = merger.merge(&options).await.unwrap();
    let default = merger.default_config().await.unwrap();
    assert_eq!(merged, default);
}

#[tokio::test]
async fn missing_rc_file_is_empty() {
    let temp = TempDir::new().unwrap();
    let merger = merger_with(&temp, "staging", secret_store());
    assert_eq!(merger.rc_config().await.unwrap(), json!({}));
}

#[tokio::test]
async fn malformed_default_is_parse_error() {
    let temp = setup_dir();
    std::fs::write(temp.path().join("config/default.json"), "{\"a\": ").unwrap();
    let merger = merger_with(&temp, "dev", secret_store());

    let err = merger.merge(&MergeOptions::default()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse { ref path, .. } if path.ends_with("default.json")));
}

#[tokio::test]
async fn unrequested_sources_are_not_read() {
    let temp = setup_dir();
    std::fs::write(temp.path().join("config/dev.json"), "not json").unwrap();
    let store = CountingStore::new(json!({"s": 1}));
    let merger = merger_with(&temp, "dev", store.clone());

    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Rc]);
    let merged = merger.merge(&options).await.unwrap();
    assert_eq!(merged["fooRc"], json!(789));
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn secret_store_failure_fails_merge() {
    let temp = setup_dir();
    let merger = merger_with(&temp, "dev", Arc::new(FailingStore));

    let err = merger.merge(&MergeOptions::default()).await.unwrap_err();
    assert!(matches!(err, ConfigError::SecretStore { ref secret, .. } if secret == "my-app/secret"));
}

#[tokio::test]
async fn secrets_skipped_for_test_env_unless_requested() {
    let temp = setup_dir();
    let store = CountingStore::new(json!({"fooSecret": "bar"}));
    let merger = merger_with(&temp, "test", store.clone());

    let merged = merger.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(
        merged,
        json!({
            "fooDefault": 123,
            "shared": {"a": "rc", "b": "default"},
            "fooTest": 1011,
            "fooRc": 789
        })
    );
    assert_eq!(store.fetches(), 0);

    let merged = merger
        .merge(&MergeOptions::default().with_secrets_for_test(true))
        .await
        .unwrap();
    assert_eq!(merged["fooSecret"], json!("bar"));
    assert_eq!(store.fetches(), 1);
}

#[tokio::test]
async fn secrets_for_local_env_can_be_disabled() {
    let temp = setup_dir();
    let store = CountingStore::new(json!({"fooSecret": "bar"}));
    let merger = merger_with(&temp, "local", store.clone());

    let merged = merger.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(merged["fooSecret"], json!("bar"));

    let merged = merger
        .merge(&MergeOptions::default().with_secrets_for_local(false))
        .await
        .unwrap();
    assert!(merged.get("fooSecret").is_none());
    assert_eq!(store.fetches(), 1);
}

#[tokio::test]
async fn secret_name_derived_from_manifest() {
    let temp = setup_dir();
    write_json(&temp.path().join("package.json"), &json!({"name": "billing-api"}));
    let store = StaticSecretStore::new().with_secret("billing-api/dev", json!({"key": "v"}));
    let merger = ConfigMerger::new(options_for(&temp, "dev"), Arc::new(store));

    assert_eq!(merger.secret_name().await.unwrap(), "billing-api/dev");
    let merged = merger.merge(&MergeOptions::default()).await.unwrap();
    assert_eq!(merged["key"], json!("v"));
}

#[tokio::test]
async fn missing_manifest_only_matters_for_secrets() {
    let temp = setup_dir();
    let merger = ConfigMerger::new(options_for(&temp, "dev"), secret_store());

    let err = merger.merge(&MergeOptions::default()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Manifest { .. }));

    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Env]);
    assert!(merger.merge(&options).await.is_ok());
}

#[tokio::test]
async fn lenient_policy_allows_no_config_files() {
    let temp = TempDir::new().unwrap();
    let merger = merger_with(&temp, "staging", secret_store());
    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Env]);
    assert_eq!(merger.merge(&options).await.unwrap(), json!({}));
}

#[tokio::test]
async fn strict_policy_requires_default_or_env() {
    let temp = TempDir::new().unwrap();
    let merger = ConfigMerger::new(
        options_for(&temp, "staging")
            .with_secret_name("my-app/secret")
            .with_missing_policy(MissingSourcePolicy::Strict),
        secret_store(),
    );

    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Env]);
    let err = merger.merge(&options).await.unwrap_err();
    assert!(matches!(err, ConfigError::NoConfigFiles { ref env, .. } if env == "staging"));

    // Orders without file sources are not affected.
    let options = MergeOptions::default().with_order([ConfigSource::Secrets]);
    assert!(merger.merge(&options).await.is_ok());

    write_json(&temp.path().join("config/staging.json"), &json!({"a": 1}));
    let options = MergeOptions::default().with_order([ConfigSource::Default, ConfigSource::Env]);
    assert_eq!(merger.merge(&options).await.unwrap(), json!({"a": 1}));
}

#[tokio::test]
async fn env_flag_is_merged_before_rc() {
    let temp = setup_dir();
    write_json(&temp.path().join(".stratarc"), &json!({"isDev": false}));
    let merger = merger_with(&temp, "dev", secret_store());

    let merged = merger
        .merge(&MergeOptions::default().with_env_flag(true))
        .await
        .unwrap();
    assert_eq!(merged["isDev"], json!(false));

    let options = MergeOptions::default()
        .with_order([ConfigSource::Default, ConfigSource::Env])
        .with_env_flag(true);
    let merged = merger.merge(&options).await.unwrap();
    assert_eq!(merged["isDev"], json!(true));
}

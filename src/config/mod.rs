//! Layered configuration.
//!
//! Merges up to four sources into one JSON object:
//! 1. **default** - `<config_dir>/default.json`
//! 2. **env** - `<config_dir>/<env>.json`
//! 3. **secrets** - secret store payload for `<package>/<env>` (or an explicit name)
//! 4. **rc** - local override file (`.stratarc`)
//!
//! ## Merge Strategy
//! - Objects: deep merge field by field, later sources win
//! - Arrays and scalars: replaced entirely
//! - Missing files contribute an empty object; malformed files are errors
//!
//! ## Environment Variables
//! - `APP_ENV` - Active environment when none is given explicitly (default: `local`)

pub mod env;
mod files;
mod merge;
mod merger;
mod source;

pub use env::{
    DEFAULT_ENV, ENV_VAR, package_name, render_secret_template, resolve_env, resolve_env_with,
    resolve_secret_name,
};
pub use files::{read_json_file, read_required_json_file};
pub use merge::{PATH_SEPARATOR, deep_merge, deep_merge_all, get_path, unflatten};
pub use merger::{
    ConfigMerger, DEFAULT_CONFIG_DIR, DEFAULT_MANIFEST_FILE, DEFAULT_RC_FILE, MergeOptions,
    MergerOptions, MissingSourcePolicy,
};
pub use source::{ConfigSource, parse_order, validate_order};

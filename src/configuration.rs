//! Process-wide engine configuration.
//!
//! ## Environment Variables
//! - `APP_ENV` - Current environment name (falls back to `RAILS_ENV`, then
//!   `RACK_ENV`, then `development`); selects the default `<env>.yml` file
//!
//! The override prefix is process-wide as well. Set it once at startup, before
//! the first load; resolvers built with an explicit prefix ignore it.

use arc_swap::ArcSwap;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// Prefix used for environment overrides unless configured otherwise.
pub const DEFAULT_ENV_PREFIX: &str = "KONFIG";

/// Environment name used when none is set.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Variables consulted, in order, for the current environment name.
pub const ENVIRONMENT_VARS: &[&str] = &["APP_ENV", "RAILS_ENV", "RACK_ENV"];

/// Extension of the default per-environment file.
pub const DEFAULT_EXTENSION: &str = "yml";

static ENV_PREFIX: LazyLock<ArcSwap<String>> =
    LazyLock::new(|| ArcSwap::from_pointee(DEFAULT_ENV_PREFIX.to_string()));

/// Current process-wide override prefix.
pub fn env_prefix() -> String {
    ENV_PREFIX.load().as_ref().clone()
}

/// Replace the process-wide override prefix.
pub fn set_env_prefix(prefix: impl Into<String>) {
    ENV_PREFIX.store(Arc::new(prefix.into()));
}

/// Restore [`DEFAULT_ENV_PREFIX`].
pub fn reset_env_prefix() {
    set_env_prefix(DEFAULT_ENV_PREFIX);
}

/// Name of the current environment, read from the process environment.
pub fn current_environment() -> String {
    environment_name(|name| std::env::var(name).ok())
}

/// Name of the environment selected by an environment snapshot.
pub fn environment_from(env: &BTreeMap<String, String>) -> String {
    environment_name(|name| env.get(name).cloned())
}

fn environment_name(read: impl Fn(&str) -> Option<String>) -> String {
    ENVIRONMENT_VARS
        .iter()
        .find_map(|name| read(name).filter(|value| !value.is_empty()))
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Default source file for an environment, e.g. `development.yml`.
pub fn default_filename(environment: &str) -> String {
    format!("{environment}.{DEFAULT_EXTENSION}")
}

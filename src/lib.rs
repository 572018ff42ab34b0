//! konfig: layered YAML configuration
//!
//! Resolves configuration from an ordered list of YAML files, deep-merges them
//! (later files win), applies `KONFIG_*` environment overrides, and exposes
//! the result as a read-only [`Settings`] tree with strict dot-path lookup.
//!
//! ```no_run
//! use konfig::Resolver;
//!
//! let settings = Resolver::new("config")
//!     .with_files(["base.yml", "production.yml", "local.yml"])
//!     .load()?;
//! let pool = settings.lookup("database.pool")?;
//! let same = konfig::settings().lookup("database.pool")?.clone();
//! assert_eq!(pool, &same);
//! # Ok::<(), konfig::KonfigError>(())
//! ```

pub mod cli;
pub mod codec;
pub mod configuration;
pub mod error;
pub mod holder;
pub mod logging;
pub mod merge;
pub mod overrides;
pub mod provider;
pub mod resolver;
pub mod settings;
pub mod source;
pub mod template;

pub use configuration::{DEFAULT_ENV_PREFIX, env_prefix, reset_env_prefix, set_env_prefix};
pub use error::{ErrorKind, KonfigError, Result};
pub use holder::SettingsHolder;
pub use provider::{ConfigProvider, DirectoryProvider, ProviderMode, YamlProvider};
pub use resolver::{Resolution, Resolver};
pub use settings::{Node, Settings};
pub use source::Mapping;

use std::sync::Arc;

/// The process-wide active settings tree.
pub fn settings() -> Arc<Settings> {
    holder::global().current()
}

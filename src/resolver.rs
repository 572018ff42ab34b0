//! The resolution engine.
//!
//! Resolution runs in four steps, each to completion before the next:
//! 1. **Sources** - every listed file is read (templates expanded unless
//!    disabled) and parsed; missing files are skipped if at least one loads
//! 2. **Merge** - parsed mappings are deep-merged in list order, later wins
//! 3. **Overrides** - `<PREFIX>_*` environment variables are merged on top
//! 4. **Tree** - the result is frozen into a [`Settings`] value
//!
//! [`Resolver::resolve`] touches no shared state. [`Resolver::load_into`] and
//! [`Resolver::load`] additionally publish the new tree into a holder.

use crate::configuration;
use crate::error::Result;
use crate::holder::{self, SettingsHolder};
use crate::merge::merge_all;
use crate::overrides::{self, OverrideEntry};
use crate::settings::Settings;
use crate::source::{self, LoadOptions};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Snapshot of the process environment. Non-UTF-8 entries are skipped.
pub fn env_snapshot() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Outcome of one resolution run.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub settings: Settings,
    /// Files that were actually loaded, in merge order.
    pub sources: Vec<PathBuf>,
    /// Overrides applied after the file merge.
    pub overrides: Vec<OverrideEntry>,
}

/// Builder and entry point for resolving one configuration.
#[derive(Debug, Clone)]
pub struct Resolver {
    workdir: PathBuf,
    files: Option<Vec<String>>,
    env_prefix: Option<String>,
    expand_templates: bool,
    environment: Option<BTreeMap<String, String>>,
}

impl Resolver {
    /// Resolver over `workdir` with default settings: the per-environment
    /// default file, the process-wide prefix, templates on, live environment.
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            files: None,
            env_prefix: None,
            expand_templates: true,
            environment: None,
        }
    }

    /// Use a single explicit file.
    pub fn with_file(self, filename: impl Into<String>) -> Self {
        self.with_files([filename])
    }

    /// Use an explicit ordered file list (later files win).
    pub fn with_files<I, S>(mut self, filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = Some(filenames.into_iter().map(Into::into).collect());
        self
    }

    /// Use `prefix` for environment overrides instead of the process-wide one.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Enable or disable `<%= %>` expansion.
    pub fn with_templates(mut self, enabled: bool) -> Self {
        self.expand_templates = enabled;
        self
    }

    /// Parse sources as-is, without template expansion.
    pub fn without_templates(self) -> Self {
        self.with_templates(false)
    }

    /// Resolve against a fixed environment instead of the process environment.
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The ordered file list this resolver will load.
    ///
    /// Without explicit files this is `<environment>.yml`, with the
    /// environment read from the injected snapshot when there is one.
    pub fn files(&self) -> Vec<String> {
        match &self.environment {
            Some(env) => self.files_for(env),
            None => self.files_for(&env_snapshot()),
        }
    }

    fn files_for(&self, env: &BTreeMap<String, String>) -> Vec<String> {
        match &self.files {
            Some(files) => files.clone(),
            None => vec![configuration::default_filename(
                &configuration::environment_from(env),
            )],
        }
    }

    /// The override prefix in effect.
    pub fn env_prefix(&self) -> String {
        self.env_prefix
            .clone()
            .unwrap_or_else(configuration::env_prefix)
    }

    pub fn expands_templates(&self) -> bool {
        self.expand_templates
    }

    /// Resolve into a new tree without publishing it.
    pub fn resolve(&self) -> Result<Settings> {
        self.resolve_detailed().map(|resolution| resolution.settings)
    }

    /// Resolve and report which sources and overrides contributed.
    pub fn resolve_detailed(&self) -> Result<Resolution> {
        let env = match &self.environment {
            Some(env) => env.clone(),
            None => env_snapshot(),
        };
        let prefix = self.env_prefix();
        let files = self.files_for(&env);

        let options = LoadOptions {
            expand_templates: self.expand_templates,
            env: &env,
        };
        let loaded = source::load_files(&self.workdir, &files, options)?;
        let sources: Vec<PathBuf> = loaded.iter().map(|s| s.path.clone()).collect();
        debug!(
            workdir = %self.workdir.display(),
            loaded = sources.len(),
            requested = files.len(),
            "Merging config sources"
        );

        let merged = merge_all(loaded.into_iter().map(|s| s.mapping));
        let applied = overrides::collect_overrides(&env, &prefix);
        let resolved = overrides::apply_entries(merged, applied.iter().cloned());

        Ok(Resolution {
            settings: Settings::new(resolved),
            sources,
            overrides: applied,
        })
    }

    /// Resolve, then publish into `holder`.
    ///
    /// On failure the holder keeps its previous tree.
    pub fn load_into(&self, holder: &SettingsHolder) -> Result<Arc<Settings>> {
        let settings = self.resolve()?;
        Ok(holder.publish(settings))
    }

    /// Resolve, then publish into the process-wide holder.
    pub fn load(&self) -> Result<Arc<Settings>> {
        self.load_into(holder::global())
    }
}

//! Config providers: pick where the ordered source list comes from.
//!
//! - [`YamlProvider`] - an explicit file list, or `<environment>.yml` by default
//! - [`DirectoryProvider`] - every `*.yml` / `*.yaml` file directly inside the
//!   working directory, merged in lexical file-name order
//!
//! Providers only decide the file list; resolution itself is done by the
//! [`Resolver`] they hand out.

use crate::error::{KonfigError, Result};
use crate::holder::{self, SettingsHolder};
use crate::resolver::Resolver;
use crate::settings::Settings;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// How the source list is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderMode {
    /// Explicit YAML file list (default).
    #[default]
    Yaml,
    /// All YAML files in the working directory.
    Directory,
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderMode::Yaml => write!(f, "yaml"),
            ProviderMode::Directory => write!(f, "directory"),
        }
    }
}

impl FromStr for ProviderMode {
    type Err = KonfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ProviderMode::Yaml),
            "directory" | "dir" => Ok(ProviderMode::Directory),
            other => Err(KonfigError::invalid_argument(format!(
                "unknown provider mode '{other}' (expected yaml or directory)"
            ))),
        }
    }
}

/// A source of configuration for one working directory.
pub trait ConfigProvider: fmt::Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn workdir(&self) -> &Path;

    /// Resolver primed with this provider's file list.
    fn resolver(&self) -> Result<Resolver>;

    /// Resolve without publishing.
    fn resolve(&self) -> Result<Settings> {
        self.resolver()?.resolve()
    }

    /// Resolve and publish into `holder`.
    fn load_into(&self, holder: &SettingsHolder) -> Result<Arc<Settings>> {
        debug!(provider = self.name(), workdir = %self.workdir().display(), "Loading settings");
        self.resolver()?.load_into(holder)
    }

    /// Resolve and publish into the process-wide holder.
    fn load(&self) -> Result<Arc<Settings>> {
        self.load_into(holder::global())
    }
}

/// Build the provider for `mode` over `workdir`.
///
/// A missing `workdir` argument is an argument error; a `workdir` that does
/// not exist on disk is `FileNotFound`.
pub fn provider(mode: ProviderMode, workdir: Option<&Path>) -> Result<Box<dyn ConfigProvider>> {
    let workdir =
        workdir.ok_or_else(|| KonfigError::invalid_argument("a working directory is required"))?;
    Ok(match mode {
        ProviderMode::Yaml => Box::new(YamlProvider::new(workdir)?),
        ProviderMode::Directory => Box::new(DirectoryProvider::new(workdir)?),
    })
}

/// Like [`provider`], with the mode given as a string.
pub fn provider_for(mode: &str, workdir: Option<&Path>) -> Result<Box<dyn ConfigProvider>> {
    provider(mode.parse()?, workdir)
}

fn check_workdir(workdir: &Path) -> Result<PathBuf> {
    if workdir.is_dir() {
        Ok(workdir.to_path_buf())
    } else {
        Err(KonfigError::not_found(workdir))
    }
}

/// Provider over an ordered list of YAML files.
#[derive(Debug, Clone)]
pub struct YamlProvider {
    resolver: Resolver,
}

impl YamlProvider {
    /// Provider for the current environment's default file.
    ///
    /// The default file is not required to exist until the first load.
    pub fn new(workdir: impl AsRef<Path>) -> Result<Self> {
        let workdir = check_workdir(workdir.as_ref())?;
        Ok(Self {
            resolver: Resolver::new(workdir),
        })
    }

    /// Provider for a single explicit file, which must exist.
    pub fn with_file(workdir: impl AsRef<Path>, filename: impl Into<String>) -> Result<Self> {
        Self::with_files(workdir, [filename])
    }

    /// Provider for an ordered file list; at least one file must exist.
    pub fn with_files<I, S>(workdir: impl AsRef<Path>, filenames: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let workdir = check_workdir(workdir.as_ref())?;
        let filenames: Vec<String> = filenames.into_iter().map(Into::into).collect();

        if !filenames.iter().any(|name| workdir.join(name).is_file()) {
            let first = filenames.first().map(String::as_str).unwrap_or_default();
            return Err(KonfigError::not_found(workdir.join(first)));
        }

        Ok(Self {
            resolver: Resolver::new(workdir).with_files(filenames),
        })
    }

    /// Path of the first (lowest precedence) configured file.
    pub fn file(&self) -> PathBuf {
        let files = self.resolver.files();
        let first = files.first().map(String::as_str).unwrap_or_default();
        self.resolver.workdir().join(first)
    }

    /// All configured file paths in merge order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.resolver
            .files()
            .iter()
            .map(|name| self.resolver.workdir().join(name))
            .collect()
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_env_prefix(prefix);
        self
    }

    pub fn without_templates(mut self) -> Self {
        self.resolver = self.resolver.without_templates();
        self
    }

    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.resolver = self.resolver.with_environment(vars);
        self
    }
}

impl ConfigProvider for YamlProvider {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn workdir(&self) -> &Path {
        self.resolver.workdir()
    }

    fn resolver(&self) -> Result<Resolver> {
        Ok(self.resolver.clone())
    }
}

/// Provider over every YAML file in a directory.
///
/// The directory is re-listed on each load.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    resolver: Resolver,
}

impl DirectoryProvider {
    pub fn new(workdir: impl AsRef<Path>) -> Result<Self> {
        let workdir = check_workdir(workdir.as_ref())?;
        Ok(Self {
            resolver: Resolver::new(workdir),
        })
    }

    /// YAML file names in the directory, sorted lexically.
    ///
    /// An empty directory is `FileNotFound`, matching a multi-file load in
    /// which every file is missing.
    pub fn files(&self) -> Result<Vec<String>> {
        let workdir = self.resolver.workdir();
        let io_error = |source| KonfigError::Io {
            path: workdir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(workdir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            if !entry.path().is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string()
                && is_yaml_file(&name)
            {
                files.push(name);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(KonfigError::not_found(workdir));
        }
        Ok(files)
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_env_prefix(prefix);
        self
    }

    pub fn without_templates(mut self) -> Self {
        self.resolver = self.resolver.without_templates();
        self
    }

    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.resolver = self.resolver.with_environment(vars);
        self
    }
}

impl ConfigProvider for DirectoryProvider {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn workdir(&self) -> &Path {
        self.resolver.workdir()
    }

    fn resolver(&self) -> Result<Resolver> {
        let files = self.files()?;
        debug!(files = ?files, "Directory provider sources");
        Ok(self.resolver.clone().with_files(files))
    }
}

fn is_yaml_file(name: &str) -> bool {
    matches!(
        Path::new(name).extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

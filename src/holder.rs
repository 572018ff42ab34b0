//! Holder for the currently active settings tree.
//!
//! A holder starts out with an empty tree and is replaced wholesale on each
//! publish. The swap is a single `ArcSwap` store, so readers see either the
//! old tree or the new one, never a partially merged state. Trees handed out
//! by [`SettingsHolder::current`] stay valid after a later publish.
//!
//! Code that needs several independent configurations should create its own
//! holders (or keep `Settings` values directly); [`global`] is only the
//! process-wide slot used by the top-level convenience functions.

use crate::error::Result;
use crate::settings::Settings;
use arc_swap::ArcSwap;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::info;

/// Atomically swappable reference to a [`Settings`] tree.
#[derive(Debug)]
pub struct SettingsHolder {
    current: ArcSwap<Settings>,
}

impl Default for SettingsHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsHolder {
    /// A holder containing an empty tree.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Settings::empty()),
        }
    }

    /// A holder initialized with `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            current: ArcSwap::from_pointee(settings),
        }
    }

    /// Snapshot of the active tree.
    pub fn current(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    /// Make `settings` the active tree; returns the published handle.
    pub fn publish(&self, settings: Settings) -> Arc<Settings> {
        let settings = Arc::new(settings);
        self.current.store(Arc::clone(&settings));
        info!(
            keys = settings.as_mapping().len(),
            "Published new settings tree"
        );
        settings
    }

    /// Value at `path` in the active tree (cloned out of the snapshot).
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Result<Value> {
        self.current.load().get(path).cloned()
    }

    /// Value at a dotted path in the active tree.
    pub fn lookup(&self, dotted_path: &str) -> Result<Value> {
        self.current.load().lookup(dotted_path).cloned()
    }
}

static GLOBAL: LazyLock<SettingsHolder> = LazyLock::new(SettingsHolder::new);

/// The process-wide holder.
pub fn global() -> &'static SettingsHolder {
    &GLOBAL
}

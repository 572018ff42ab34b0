//! Environment variable overrides.
//!
//! Every variable named `<PREFIX>_<SEGMENTS>` is decoded into a settings path,
//! its value coerced with [`codec::coerce`], and deep-merged over the
//! file-derived mapping. This pass runs after all file merging, so overrides
//! always win.
//!
//! Entries are applied in the iteration order of the snapshot. The resolver
//! passes a `BTreeMap`, which applies `KONFIG_A_B` before `KONFIG_A_B_C`; that
//! ordering is an implementation detail and callers must not depend on it.

use crate::codec;
use crate::merge::merge_mappings;
use crate::source::Mapping;
use serde_json::Value;
use tracing::{debug, warn};

/// One decoded override.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideEntry {
    pub env_name: String,
    pub path: Vec<String>,
    pub value: Value,
}

impl OverrideEntry {
    /// Decode an environment entry; `None` if it is not an override under `prefix`.
    pub fn decode(env_name: &str, raw_value: &str, prefix: &str) -> Option<Self> {
        let path = codec::env_name_to_path(env_name, prefix)?;
        if path.is_empty() || path.iter().any(String::is_empty) {
            warn!(
                env = %env_name,
                "Ignoring override variable with an empty path segment"
            );
            return None;
        }
        Some(Self {
            env_name: env_name.to_string(),
            path,
            value: codec::coerce(raw_value),
        })
    }

    /// Nest the value under its path: `[a, b] = v` becomes `{a: {b: v}}`.
    pub fn into_mapping(self) -> Mapping {
        let mut segments = self.path.into_iter().rev();
        let mut value = self.value;
        let mut leaf_key = segments.next().unwrap_or_default();
        for segment in segments {
            let mut inner = Mapping::new();
            inner.insert(leaf_key, value);
            value = Value::Object(inner);
            leaf_key = segment;
        }
        let mut mapping = Mapping::new();
        mapping.insert(leaf_key, value);
        mapping
    }
}

/// Collect the override entries under `prefix`, in iteration order.
pub fn collect_overrides<'a, I>(env: I, prefix: &str) -> Vec<OverrideEntry>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    env.into_iter()
        .filter_map(|(name, value)| OverrideEntry::decode(name, value, prefix))
        .collect()
}

/// Apply environment overrides on top of `base`.
pub fn apply_overrides<'a, I>(base: Mapping, env: I, prefix: &str) -> Mapping
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    apply_entries(base, collect_overrides(env, prefix))
}

/// Merge already decoded entries over `base`, in order.
pub fn apply_entries(base: Mapping, entries: impl IntoIterator<Item = OverrideEntry>) -> Mapping {
    entries.into_iter().fold(base, |merged, entry| {
        debug!(env = %entry.env_name, path = ?entry.path, "Applying config override");
        merge_mappings(merged, entry.into_mapping())
    })
}

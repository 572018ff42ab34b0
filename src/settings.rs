//! Read-only, path-navigable view over resolved configuration.
//!
//! Lookups are strict: a missing key at any depth, or an attempt to descend
//! through a scalar or list with a non-index segment, fails with
//! [`KonfigError::KeyLookup`]. Present keys holding `null` are not misses.
//!
//! ```
//! use konfig::Settings;
//! use serde_json::json;
//!
//! let settings = Settings::from_value(json!({"foo": {"bar": {"number": 2}}})).unwrap();
//! assert_eq!(settings.get(&["foo", "bar", "number"]).unwrap(), &json!(2));
//! assert_eq!(settings.root().get("foo")?.get("bar")?.get("number")?.as_i64(), Some(2));
//! assert!(settings.lookup("foo.bar.bad_key").unwrap_err().is_key_lookup());
//! # Ok::<(), konfig::KonfigError>(())
//! ```

use crate::codec;
use crate::error::{KonfigError, Result};
use crate::source::Mapping;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// The final, immutable settings tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self::empty()
    }
}

impl Settings {
    /// Wrap a resolved mapping.
    pub fn new(mapping: Mapping) -> Self {
        Self {
            root: Value::Object(mapping),
        }
    }

    /// An empty tree; every lookup fails.
    pub fn empty() -> Self {
        Self::new(Mapping::new())
    }

    /// Build from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(mapping) => Ok(Self::new(mapping)),
            other => Err(KonfigError::invalid_argument(format!(
                "settings root must be a mapping, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Navigable handle on the root mapping.
    pub fn root(&self) -> Node<'_> {
        Node {
            path: Vec::new(),
            value: &self.root,
        }
    }

    /// Navigate `path` and return a handle on the node found there.
    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Result<Node<'_>> {
        path.iter()
            .try_fold(self.root(), |node, segment| node.get(segment.as_ref()))
    }

    /// Value at `path`, returned unchanged.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Result<&Value> {
        self.node(path).map(|node| node.value)
    }

    /// Value at a dotted path such as `foo.bar.0.name`.
    pub fn lookup(&self, dotted_path: &str) -> Result<&Value> {
        self.get(&split_dotted(dotted_path))
    }

    /// Decode the value at `path` into `T`.
    pub fn get_as<T: DeserializeOwned, S: AsRef<str>>(&self, path: &[S]) -> Result<T> {
        self.node(path)?.deserialize()
    }

    /// Whether `path` resolves.
    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.node(path).is_ok()
    }

    /// The resolved mapping.
    pub fn as_mapping(&self) -> &Mapping {
        match &self.root {
            Value::Object(mapping) => mapping,
            _ => unreachable!("settings root is always a mapping"),
        }
    }

    /// The resolved tree as a JSON value.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Every leaf path (scalars, lists and empty mappings), sorted.
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        collect_leaves(&self.root, &mut Vec::new(), &mut paths);
        paths.sort();
        paths
    }

    /// Every leaf paired with the environment variable that would override it.
    pub fn env_names(&self, prefix: &str) -> Vec<(String, &Value)> {
        self.leaf_paths()
            .into_iter()
            .filter_map(|path| {
                let value = self.get(&path).ok()?;
                Some((codec::path_to_env_name(&path, prefix), value))
            })
            .collect()
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

/// A position inside a [`Settings`] tree.
///
/// Mappings descend with [`Node::get`], lists with [`Node::at`]; both keep
/// track of the path taken so errors name the full key.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    path: Vec<String>,
    value: &'a Value,
}

impl<'a> Node<'a> {
    /// Descend into a child.
    ///
    /// On a mapping `key` names an entry; on a list it must be an index.
    pub fn get(&self, key: &str) -> Result<Node<'a>> {
        let mut path = self.path.clone();
        path.push(key.to_string());

        let child = match self.value {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };

        match child {
            Some(value) => Ok(Node { path, value }),
            None => Err(KonfigError::KeyLookup {
                path: path.join("."),
            }),
        }
    }

    /// Descend into a list element.
    pub fn at(&self, index: usize) -> Result<Node<'a>> {
        let mut path = self.path.clone();
        path.push(index.to_string());

        match self.value {
            Value::Array(items) if index < items.len() => Ok(Node {
                path,
                value: &items[index],
            }),
            _ => Err(KonfigError::KeyLookup {
                path: path.join("."),
            }),
        }
    }

    /// The underlying value.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Path segments from the root to this node.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn is_mapping(&self) -> bool {
        self.value.is_object()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    /// Child keys, if this node is a mapping.
    pub fn keys(&self) -> Vec<&'a str> {
        match self.value {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Decode this node into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(self.value).map_err(|source| KonfigError::Decode {
            path: self.path.join("."),
            source,
        })
    }
}

/// Split `a.b.c` into segments; an empty string is the root.
pub fn split_dotted(dotted_path: &str) -> Vec<&str> {
    if dotted_path.is_empty() {
        Vec::new()
    } else {
        dotted_path.split('.').collect()
    }
}

fn collect_leaves(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_leaves(child, prefix, out);
                prefix.pop();
            }
        }
        _ if prefix.is_empty() => {}
        _ => out.push(prefix.clone()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

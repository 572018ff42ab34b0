//! Reading YAML sources from a working directory.
//!
//! A source goes through three steps: read, optional template expansion, and
//! YAML parsing. The parsed document is normalized into a [`Mapping`] of
//! `serde_json` values, which is what the merge and override passes work on.

use crate::error::{KonfigError, Result};
use crate::template;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed configuration mapping with string keys.
pub type Mapping = Map<String, Value>;

/// Options for loading a single source.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions<'a> {
    /// Evaluate `<%= %>` tags before parsing.
    pub expand_templates: bool,
    /// Environment snapshot visible to template expressions.
    pub env: &'a BTreeMap<String, String>,
}

/// A successfully loaded source file.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub mapping: Mapping,
}

/// Load `workdir/filename` into a mapping.
pub fn load_file(workdir: &Path, filename: &str, options: LoadOptions<'_>) -> Result<LoadedSource> {
    let path = workdir.join(filename);
    if !path.is_file() {
        return Err(KonfigError::not_found(&path));
    }

    debug!("Loading config source {}", path.display());
    let content = std::fs::read_to_string(&path).map_err(|source| KonfigError::Io {
        path: path.clone(),
        source,
    })?;

    let mapping = parse_source(&path, &content, options)?;
    Ok(LoadedSource { path, mapping })
}

/// Load an ordered list of files, skipping missing ones.
///
/// Missing files are tolerated as long as at least one file loads; if every
/// file is missing, the `FileNotFound` of the first one is returned. Any other
/// failure (unreadable, empty, invalid YAML) aborts immediately. An empty list
/// resolves to no sources.
pub fn load_files<S: AsRef<str>>(
    workdir: &Path,
    filenames: &[S],
    options: LoadOptions<'_>,
) -> Result<Vec<LoadedSource>> {
    let mut loaded = Vec::with_capacity(filenames.len());
    let mut first_missing = None;

    for filename in filenames {
        match load_file(workdir, filename.as_ref(), options) {
            Ok(source) => loaded.push(source),
            Err(err) if err.is_not_found() => {
                debug!("Skipping missing config source: {}", err);
                first_missing.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }

    match first_missing {
        Some(err) if loaded.is_empty() => Err(err),
        _ => Ok(loaded),
    }
}

/// Expand and parse already-read source text. `path` is only used for errors.
pub fn parse_source(path: &Path, content: &str, options: LoadOptions<'_>) -> Result<Mapping> {
    let text = if options.expand_templates {
        template::expand(content, options.env).map_err(|err| KonfigError::Template {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
    } else {
        content.to_string()
    };

    if text.trim().is_empty() {
        return Err(KonfigError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let parse_error = |source| KonfigError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let mut document: serde_yaml::Value = serde_yaml::from_str(&text).map_err(parse_error)?;
    // resolve `<<: *anchor` merge keys
    document.apply_merge().map_err(parse_error)?;

    match yaml_to_json(document) {
        Value::Object(map) => Ok(map),
        _ => Err(KonfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Normalize a YAML value into a JSON value.
///
/// Non-string keys are rendered as strings, tags are dropped, and non-finite
/// floats (which JSON cannot carry) keep their YAML spelling as strings.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn options(env: &BTreeMap<String, String>, expand_templates: bool) -> LoadOptions<'_> {
        LoadOptions {
            expand_templates,
            env,
        }
    }

    #[test]
    fn test_load_file_parses_mapping() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("test.yml"),
            "foo:\n  bar:\n    string: hello\n    number: 2\n    bool: true\n    nil: ~\n",
        )
        .unwrap();

        let env = BTreeMap::new();
        let source = load_file(temp.path(), "test.yml", options(&env, true)).unwrap();
        assert_eq!(
            Value::Object(source.mapping),
            json!({"foo": {"bar": {"string": "hello", "number": 2, "bool": true, "nil": null}}})
        );
        assert!(source.path.ends_with("test.yml"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let env = BTreeMap::new();
        let err = load_file(temp.path(), "bad_file.yml", options(&env, true)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("dir.yml")).unwrap();
        let env = BTreeMap::new();
        let err = load_file(temp.path(), "dir.yml", options(&env, true)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_and_whitespace_files() {
        let env = BTreeMap::new();
        for content in ["", "   \n\t\n"] {
            let err = parse_source(Path::new("x.yml"), content, options(&env, true)).unwrap_err();
            assert!(matches!(err, KonfigError::EmptyFile { .. }), "{content:?}");
        }
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let env = BTreeMap::new();
        let err = parse_source(Path::new("x.yml"), "foo: [1, 2\nbar: }", options(&env, true))
            .unwrap_err();
        assert!(matches!(err, KonfigError::Parse { .. }));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let env = BTreeMap::new();
        for content in ["- a\n- b\n", "just a string", "~"] {
            let err = parse_source(Path::new("x.yml"), content, options(&env, true)).unwrap_err();
            assert!(matches!(err, KonfigError::NotAMapping { .. }), "{content:?}");
        }
    }

    #[test]
    fn test_template_toggle() {
        let env = BTreeMap::new();
        let content = "this:\n  contains:\n    erb: <%= 1 + 1 %>\n";

        let expanded = parse_source(Path::new("x.yml"), content, options(&env, true)).unwrap();
        assert_eq!(expanded["this"]["contains"]["erb"], json!(2));

        let raw = parse_source(Path::new("x.yml"), content, options(&env, false)).unwrap();
        assert_eq!(raw["this"]["contains"]["erb"], json!("<%= 1 + 1 %>"));
    }

    #[test]
    fn test_template_error_carries_path() {
        let env = BTreeMap::new();
        let err = parse_source(Path::new("bad.yml"), "a: <%= nope %>", options(&env, true))
            .unwrap_err();
        assert!(matches!(err, KonfigError::Template { .. }));
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn test_quoted_numbers_stay_strings() {
        let env = BTreeMap::new();
        let mapping =
            parse_source(Path::new("x.yml"), "a: \"42\"\nb: 42\n", options(&env, true)).unwrap();
        assert_eq!(mapping["a"], json!("42"));
        assert_eq!(mapping["b"], json!(42));
    }

    #[test]
    fn test_merge_keys_are_resolved() {
        let env = BTreeMap::new();
        let content = "\
default: &default
  pool: 5
  host: localhost
production:
  <<: *default
  host: db.prod
";
        let mapping = parse_source(Path::new("app.yml"), content, options(&env, true)).unwrap();
        assert_eq!(
            mapping["production"],
            json!({"pool": 5, "host": "db.prod"})
        );
        assert!(mapping["production"].get("<<").is_none());
        assert_eq!(mapping["default"], json!({"pool": 5, "host": "localhost"}));
    }

    #[test]
    fn test_merge_key_on_scalar_is_parse_error() {
        let env = BTreeMap::new();
        let err = parse_source(Path::new("x.yml"), "a:\n  <<: 1\n", options(&env, true))
            .unwrap_err();
        assert!(matches!(err, KonfigError::Parse { .. }));
    }

    // YAML 1.2 scalars: `yes`/`no`/`on`/`off` stay strings
    #[test]
    fn test_keys_normalized_to_strings() {
        let env = BTreeMap::new();
        let content = "1: one\ntrue: yes\n\"quoted\": q\nplain: p\n";
        let mapping = parse_source(Path::new("x.yml"), content, options(&env, true)).unwrap();
        assert_eq!(mapping["1"], json!("one"));
        assert_eq!(mapping["true"], json!("yes"));
        assert_eq!(mapping["quoted"], json!("q"));
        assert_eq!(mapping["plain"], json!("p"));
    }

    #[test]
    fn test_load_files_partial_success() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("real.yml"), "a: 1\n").unwrap();
        let env = BTreeMap::new();

        let loaded =
            load_files(temp.path(), &["real.yml", "missing.yml"], options(&env, true)).unwrap();
        assert_eq!(loaded.len(), 1);

        let err = load_files(
            temp.path(),
            &["missing1.yml", "missing2.yml"],
            options(&env, true),
        )
        .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing1.yml"));
    }

    #[test]
    fn test_load_files_stops_on_broken_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("real.yml"), "a: 1\n").unwrap();
        std::fs::write(temp.path().join("empty.yml"), "").unwrap();
        let env = BTreeMap::new();

        let err = load_files(temp.path(), &["real.yml", "empty.yml"], options(&env, true))
            .unwrap_err();
        assert!(matches!(err, KonfigError::EmptyFile { .. }));
    }
}

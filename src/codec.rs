//! Mapping between settings paths and environment variable names, and
//! coercion of raw override strings into typed values.
//!
//! A path `foo.bar.baz` under prefix `KONFIG` corresponds to the variable
//! `KONFIG_FOO_BAR_BAZ`. Decoding splits on every underscore, so a segment
//! that itself contains an underscore (`max_size`) comes back as two segments
//! (`max`, `size`). That ambiguity is inherent to the naming scheme and is not
//! corrected here.

use serde_json::{Number, Value};

/// Separator between the prefix and each path segment.
pub const SEPARATOR: char = '_';

/// Build the override variable name for a settings path.
pub fn path_to_env_name<S: AsRef<str>>(path: &[S], prefix: &str) -> String {
    let mut name = String::from(prefix);
    for segment in path {
        name.push(SEPARATOR);
        name.push_str(&segment.as_ref().to_uppercase());
    }
    name
}

/// Decode an override variable name back into path segments.
///
/// Returns `None` when `env_name` does not start with `prefix` followed by the
/// separator. A name consisting of just the prefix and separator decodes to an
/// empty path.
pub fn env_name_to_path(env_name: &str, prefix: &str) -> Option<Vec<String>> {
    let rest = env_name
        .strip_prefix(prefix)?
        .strip_prefix(SEPARATOR)?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    Some(
        rest.to_lowercase()
            .split(SEPARATOR)
            .map(str::to_string)
            .collect(),
    )
}

/// Coerce a raw override string into a value.
///
/// This is a heuristic, tried in order with the first success winning:
/// 1. JSON, only when the string starts with `[` or `{`
/// 2. signed 64-bit integer
/// 3. finite float
/// 4. the literals `true` / `false`
/// 5. the string itself
///
/// Values that YAML already typed never pass through here.
pub fn coerce(raw: &str) -> Value {
    if (raw.starts_with('[') || raw.starts_with('{'))
        && let Ok(value) = serde_json::from_str::<Value>(raw)
    {
        return value;
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }

    if let Ok(float) = raw.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }

    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_to_env_name() {
        assert_eq!(
            path_to_env_name(&["foo", "bar", "baz"], "KONFIG"),
            "KONFIG_FOO_BAR_BAZ"
        );
        assert_eq!(path_to_env_name(&["db"], "APP"), "APP_DB");
    }

    #[test]
    fn test_env_name_to_path() {
        assert_eq!(
            env_name_to_path("KONFIG_FOO_BAR_BAZ", "KONFIG"),
            Some(vec!["foo".to_string(), "bar".to_string(), "baz".to_string()])
        );
    }

    #[test]
    fn test_env_name_requires_separator_after_prefix() {
        assert_eq!(env_name_to_path("KONFIGURE_X", "KONFIG"), None);
        assert_eq!(env_name_to_path("OTHER_FOO", "KONFIG"), None);
        assert_eq!(env_name_to_path("KONFIG", "KONFIG"), None);
        assert_eq!(env_name_to_path("KONFIG_", "KONFIG"), Some(vec![]));
    }

    #[test]
    fn test_round_trip_for_simple_segments() {
        let path = ["server", "port2"];
        let name = path_to_env_name(&path, "KONFIG");
        assert_eq!(env_name_to_path(&name, "KONFIG").unwrap(), path);
    }

    #[test]
    fn test_underscore_segments_are_split_on_decode() {
        let name = path_to_env_name(&["cache", "max_size"], "KONFIG");
        assert_eq!(name, "KONFIG_CACHE_MAX_SIZE");
        assert_eq!(
            env_name_to_path(&name, "KONFIG").unwrap(),
            vec!["cache", "max", "size"]
        );
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce("999"), json!(999));
        assert_eq!(coerce("-12"), json!(-12));
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce("1.5"), json!(1.5));
        // Non-finite floats have no JSON representation; they stay strings.
        assert_eq!(coerce("NaN"), json!("NaN"));
        assert_eq!(coerce("inf"), json!("inf"));
    }

    #[test]
    fn test_coerce_bool_and_string() {
        assert_eq!(coerce("true"), json!(true));
        assert_eq!(coerce("false"), json!(false));
        assert_eq!(coerce("True"), json!("True"));
        assert_eq!(coerce("hello"), json!("hello"));
        assert_eq!(coerce(""), json!(""));
    }

    #[test]
    fn test_coerce_json_collections() {
        assert_eq!(
            coerce(r#"[{"some":2,"value":true}]"#),
            json!([{"some": 2, "value": true}])
        );
        assert_eq!(coerce(r#"{"a":"b"}"#), json!({"a": "b"}));
    }

    #[test]
    fn test_coerce_broken_json_falls_through_to_string() {
        assert_eq!(coerce("[not json"), json!("[not json"));
        assert_eq!(coerce("{1}"), json!("{1}"));
    }
}

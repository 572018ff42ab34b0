//! Process-wide state: the override prefix and the global settings holder.
//!
//! Kept in one test so nothing else in this binary races on the globals.

use konfig::{DEFAULT_ENV_PREFIX, Resolver};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_global_prefix_and_holder() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.yml"), "foo: file\nbar: file\n").unwrap();

    let resolver = Resolver::new(temp.path())
        .with_file("app.yml")
        .with_environment([("KONFIG_FOO", "from_default"), ("CUSTOM_FOO", "from_custom")]);

    assert_eq!(konfig::env_prefix(), DEFAULT_ENV_PREFIX);
    assert_eq!(resolver.resolve().unwrap().lookup("foo").unwrap(), "from_default");

    konfig::set_env_prefix("CUSTOM");
    assert_eq!(resolver.env_prefix(), "CUSTOM");
    assert_eq!(resolver.resolve().unwrap().lookup("foo").unwrap(), "from_custom");

    // an explicit prefix is not affected by the global one
    let pinned = resolver.clone().with_env_prefix("KONFIG");
    assert_eq!(pinned.resolve().unwrap().lookup("foo").unwrap(), "from_default");

    konfig::reset_env_prefix();
    assert_eq!(konfig::env_prefix(), "KONFIG");

    // nothing published yet
    assert!(konfig::settings().lookup("foo").unwrap_err().is_key_lookup());

    let loaded = resolver.load().unwrap();
    assert_eq!(loaded.lookup("foo").unwrap(), "from_default");
    assert_eq!(konfig::settings().lookup("bar").unwrap(), &json!("file"));
    assert_eq!(
        konfig::holder::global().lookup("foo").unwrap(),
        json!("from_default")
    );
}

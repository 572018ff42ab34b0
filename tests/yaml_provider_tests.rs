//! Integration tests for the YAML file-list provider.
//!
//! Fixtures are written into a temp directory per test.

use konfig::{ConfigProvider, ErrorKind, SettingsHolder, YamlProvider};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const TEST_YML: &str = r#"
foo:
  bar:
    string: hello
    number: 2
    bool: true
    nil: ~
"#;

const WITH_ERB_YML: &str = r#"
this:
  contains:
    erb: <%= 1 + 1 %>
"#;

/// Temp dir with the standard fixture files.
fn fixtures() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    write(temp.path(), "test.yml", TEST_YML);
    write(temp.path(), "with_erb.yml", WITH_ERB_YML);
    write(temp.path(), "development.yml", "env_name: development\n");
    temp
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("write fixture");
}

fn no_env() -> [(&'static str, &'static str); 0] {
    []
}

#[test]
fn test_reads_the_yaml_file() {
    let temp = fixtures();
    assert!(YamlProvider::with_file(temp.path(), "test.yml").is_ok());
}

#[test]
fn test_fails_with_bad_file() {
    let temp = fixtures();
    let err = YamlProvider::with_file(temp.path(), "bad_file.yml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_reads_development_file_by_default() {
    let temp = fixtures();
    let provider = YamlProvider::new(temp.path())
        .unwrap()
        .with_environment(no_env());
    assert!(provider.file().ends_with("development.yml"));

    let settings = provider.resolve().unwrap();
    assert_eq!(settings.lookup("env_name").unwrap(), "development");
}

#[test]
fn test_default_file_follows_environment_name() {
    let temp = fixtures();
    write(temp.path(), "production.yml", "env_name: production\n");

    let provider = YamlProvider::new(temp.path())
        .unwrap()
        .with_environment([("APP_ENV", "production")]);
    assert!(provider.file().ends_with("production.yml"));
    assert_eq!(
        provider.resolve().unwrap().lookup("env_name").unwrap(),
        "production"
    );

    let provider = YamlProvider::new(temp.path())
        .unwrap()
        .with_environment([("APP_ENV", "production"), ("RAILS_ENV", "development")]);
    assert!(provider.file().ends_with("production.yml"));

    let provider = YamlProvider::new(temp.path())
        .unwrap()
        .with_environment([("RAILS_ENV", "production")]);
    assert!(provider.file().ends_with("production.yml"));
}

#[test]
fn test_fetches_keys() {
    let temp = fixtures();
    let holder = SettingsHolder::new();
    let provider = YamlProvider::with_file(temp.path(), "test.yml")
        .unwrap()
        .with_environment(no_env());
    let settings = provider.load_into(&holder).unwrap();

    assert_eq!(settings.lookup("foo.bar.string").unwrap(), "hello");
    assert_eq!(settings.lookup("foo.bar.number").unwrap(), &json!(2));
    assert_eq!(settings.lookup("foo.bar.bool").unwrap(), &json!(true));
    assert!(settings.lookup("foo.bar.nil").unwrap().is_null());

    // Node-style navigation over the published tree
    let current = holder.current();
    let bar = current.root().get("foo").unwrap().get("bar").unwrap();
    assert_eq!(bar.get("string").unwrap().as_str(), Some("hello"));
    assert_eq!(bar.get("number").unwrap().as_i64(), Some(2));
    assert_eq!(bar.get("bool").unwrap().as_bool(), Some(true));
}

#[test]
fn test_expands_templates() {
    let temp = fixtures();
    let settings = YamlProvider::with_file(temp.path(), "with_erb.yml")
        .unwrap()
        .with_environment(no_env())
        .resolve()
        .unwrap();
    assert_eq!(settings.lookup("this.contains.erb").unwrap(), &json!(2));
}

#[test]
fn test_templates_can_be_disabled() {
    let temp = fixtures();
    let settings = YamlProvider::with_file(temp.path(), "with_erb.yml")
        .unwrap()
        .without_templates()
        .with_environment(no_env())
        .resolve()
        .unwrap();
    assert_eq!(
        settings.lookup("this.contains.erb").unwrap(),
        "<%= 1 + 1 %>"
    );
}

#[test]
fn test_handles_bad_keys() {
    let temp = fixtures();
    let settings = YamlProvider::with_file(temp.path(), "test.yml")
        .unwrap()
        .with_environment(no_env())
        .resolve()
        .unwrap();

    let err = settings.get(&["foo", "bar", "bad_key"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyLookup);
    let err = settings.get(&["no_available"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyLookup);
    let err = settings.lookup("foo.missing.string").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyLookup);
    // descending through a scalar
    let err = settings.lookup("foo.bar.string.deeper").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyLookup);
}

#[test]
fn test_partial_file_list_tolerated() {
    let temp = fixtures();
    let settings = YamlProvider::with_files(temp.path(), ["test.yml", "missing.yml"])
        .unwrap()
        .with_environment(no_env())
        .resolve()
        .unwrap();
    assert_eq!(settings.lookup("foo.bar.string").unwrap(), "hello");
}

#[test]
fn test_all_missing_files_not_found() {
    let temp = fixtures();
    let err = YamlProvider::with_files(temp.path(), ["missing1.yml", "missing2.yml"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_empty_file_rejected() {
    let temp = fixtures();
    write(temp.path(), "empty.yml", "");
    write(temp.path(), "blank.yml", "  \n\n");

    for name in ["empty.yml", "blank.yml"] {
        let err = YamlProvider::with_file(temp.path(), name)
            .unwrap()
            .with_environment(no_env())
            .resolve()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyOrUnparseableSource, "{name}");
    }
}

#[test]
fn test_missing_default_file_reported_on_load() {
    let temp = TempDir::new().unwrap();
    let provider = YamlProvider::new(temp.path()).unwrap();
    let err = provider.resolve().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

//! Tests for tiered configuration loading.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use todo_client::config::{Config, ConfigLoader, ConfigPaths};

fn write_config(dir: &Path, yaml: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join("config.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn defaults_when_no_files_exist() {
    let temp = TempDir::new().unwrap();
    let paths = ConfigPaths::with_dirs(
        Some(temp.path().join("project")),
        Some(temp.path().join("user")),
    );

    let loader = ConfigLoader::load_with_paths(paths).unwrap();

    assert!(loader.sources().is_empty());
    assert!(loader.config_path().is_none());
    let config = loader.config();
    assert_eq!(config.api.token_path, "token/");
    assert_eq!(config.api.refresh_path, "token/refresh/");
    assert_eq!(config.api.timeout_secs, 30);
}

#[test]
fn user_tier_overrides_project_field_by_field() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    let user = temp.path().join("user");

    let project_file = write_config(
        &project,
        r#"
api:
  base_url: "https://project.example/api/"
  tasks_path: "tasks/"
  timeout_secs: 5
"#,
    );
    let user_file = write_config(
        &user,
        r#"
api:
  base_url: "https://user.example/api/"
"#,
    );

    let loader = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), Some(user)))
        .unwrap();
    let config = loader.config();

    assert_eq!(config.api.base_url, "https://user.example/api/");
    // Untouched by the user tier, so the project value survives.
    assert_eq!(config.api.tasks_path, "tasks/");
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.api.token_path, "token/");

    assert_eq!(loader.sources(), &[project_file, user_file.clone()]);
    assert_eq!(loader.config_path(), Some(user_file.as_path()));
}

#[test]
fn unreadable_tier_is_skipped() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    let user = temp.path().join("user");
    write_config(&project, "api:\n  tasks_path: \"tasks/\"\n");
    write_config(&user, "api: [this is: not valid");

    let loader = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), Some(user)))
        .unwrap();

    assert_eq!(loader.config().api.tasks_path, "tasks/");
    assert_eq!(loader.sources().len(), 1);
}

#[test]
fn explicit_file_replaces_tier_search() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    write_config(&project, "api:\n  tasks_path: \"from-project/\"\n");
    let explicit = write_config(
        &temp.path().join("explicit"),
        r#"
api:
  base_url: "https://explicit.example/api/"
storage:
  path: "/var/tmp/todo-storage.json"
"#,
    );

    let paths = ConfigPaths::with_dirs(Some(project), None).with_explicit_file(&explicit);
    let loader = ConfigLoader::load_with_paths(paths).unwrap();
    let config = loader.config();

    assert_eq!(config.api.base_url, "https://explicit.example/api/");
    assert_eq!(config.api.tasks_path, "");
    assert_eq!(
        config.storage.path,
        PathBuf::from("/var/tmp/todo-storage.json")
    );
    assert_eq!(loader.config_path(), Some(explicit.as_path()));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let paths = ConfigPaths::default().with_explicit_file(temp.path().join("nope.yaml"));

    let err = ConfigLoader::load_with_paths(paths).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.yaml"));
}

#[test]
fn validate_rejects_non_http_base_url() {
    let mut config = Config::default();
    config.api.base_url = "ftp://example.com/".to_string();
    assert!(config.validate().is_err());

    config.api.base_url = "https://example.com/api/".to_string();
    assert!(config.validate().is_ok());
}

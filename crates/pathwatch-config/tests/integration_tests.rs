use pathwatch_config::{Config, ConfigError, ConfigFormat, ConfigLoader};
use std::fs;
use tempfile::TempDir;

const SAMPLE_YAML: &str = r#"
exporter:
  port: 2012
  endpoint: /metric
log_path: /var/log/pathwatch.log
watcher:
  - name: dir1
    path: /mnt/extra/dir1
    format: all
    labels:
      - path: test
      - name: test
  - name: dir2
    path: /mnt/extra/dir2
    format: "py, csv"
    labels:
      - project: myProj
      - app_name: app1
"#;

#[tokio::test]
async fn test_load_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, SAMPLE_YAML).unwrap();

    let config = ConfigLoader::new().load_file(&path).await.unwrap();
    assert_eq!(config.exporter.port, 2012);
    assert_eq!(config.exporter.endpoint, "/metric");
    assert_eq!(config.log_path, "/var/log/pathwatch.log");
    assert_eq!(config.watcher.len(), 2);
    assert_eq!(config.watcher[1].labels[0]["project"], "myProj");
}

#[tokio::test]
async fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::new()
        .load_file(temp_dir.path().join("absent.yaml"))
        .await;
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[tokio::test]
async fn test_any_extension_loads_as_yaml() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["pathwatch.conf", "pathwatch_conf"] {
        let path = temp_dir.path().join(name);
        fs::write(&path, SAMPLE_YAML).unwrap();

        let config = ConfigLoader::new().load_file(&path).await.unwrap();
        assert_eq!(config.exporter.endpoint, "/metric");
    }
}

#[tokio::test]
async fn test_config_without_exporter_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "log_path: \"\"\nwatcher: []\n").unwrap();

    let result = ConfigLoader::new().load_file(&path).await;
    assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
}

#[tokio::test]
async fn test_env_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yml");
    fs::write(&path, SAMPLE_YAML).unwrap();

    std::env::set_var("PATHWATCH_EXPORTER_PORT", "9300");
    std::env::set_var("PATHWATCH_LOG_LEVEL", "debug");
    let config = ConfigLoader::new().load_with_overrides(&path).await;
    std::env::set_var("PATHWATCH_EXPORTER_PORT", "not-a-port");
    let bad = ConfigLoader::new().load_with_overrides(&path).await;
    std::env::remove_var("PATHWATCH_EXPORTER_PORT");
    std::env::remove_var("PATHWATCH_LOG_LEVEL");

    let config = config.unwrap();
    assert_eq!(config.exporter.port, 9300);
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert!(matches!(bad, Err(ConfigError::EnvVarParsingError { .. })));
}

#[test]
fn test_sample_round_trips_through_yaml() {
    let sample = Config::sample();
    let yaml = sample.to_yaml().unwrap();
    let parsed = ConfigLoader::new()
        .load_from_string(&yaml, ConfigFormat::Yaml)
        .unwrap();
    assert_eq!(parsed, sample);
}

#[test]
fn test_invalid_label_name_rejected() {
    let yaml = r#"
exporter: { port: 2012, endpoint: /metrics }
watcher:
  - name: a
    path: /tmp
    format: csv
    labels:
      - "app-name": x
"#;
    let result = ConfigLoader::new().load_from_string(yaml, ConfigFormat::Yaml);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_watcher_list_may_be_empty() {
    let yaml = "exporter: { port: 2012, endpoint: /metrics }\nwatcher: []\n";
    let config = ConfigLoader::new()
        .load_from_string(yaml, ConfigFormat::Yaml)
        .unwrap();
    assert!(config.watcher.is_empty());
}

//! Layered configuration loading from TOML files and environment overrides

use std::io::Write;
use std::time::Duration;
use supervisor_core::config::SupervisorConfig;
use supervisor_core::error::SupervisorError;
use tempfile::NamedTempFile;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn test_file_overrides_defaults() {
    let file = toml_file(
        r#"
execution_order = ["triage", "data", "reporting"]
critical_agents = ["triage"]

[pacing]
enabled = true
min_agent_duration_ms = 250

[dependencies]
data = ["triage"]
reporting = ["data"]
"#,
    );

    let config = SupervisorConfig::load_from(Some(file.path())).unwrap();

    assert_eq!(config.execution_order, vec!["triage", "data", "reporting"]);
    assert!(config.is_critical("triage"));
    assert!(!config.is_critical("data"));
    assert_eq!(
        config.pacing.min_agent_duration(),
        Some(Duration::from_millis(250))
    );
    assert_eq!(
        config.dependency_table().dependencies_of("reporting"),
        &["data".to_string()]
    );
}

#[test]
fn test_dependencies_table_replaces_defaults() {
    let file = toml_file(
        r#"
[dependencies]
data = ["triage"]
"#,
    );

    let config = SupervisorConfig::load_from(Some(file.path())).unwrap();
    let table = config.dependency_table();

    assert_eq!(table.dependencies_of("data"), &["triage".to_string()]);
    assert!(table.dependencies_of("reporting").is_empty());
    assert_eq!(table.len(), 1);
}

#[test]
fn test_cyclic_file_is_rejected() {
    let file = toml_file(
        r#"
[dependencies]
triage = ["reporting"]
"#,
    );

    let error = SupervisorConfig::load_from(Some(file.path())).unwrap_err();
    match error {
        SupervisorError::CyclicDependency { cycle } => {
            assert!(cycle.contains(&"triage".to_string()));
            assert_eq!(cycle.first(), cycle.last());
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn test_critical_agent_outside_order_is_rejected() {
    let file = toml_file(
        r#"
execution_order = ["triage"]
critical_agents = ["triage", "data"]
"#,
    );

    assert!(matches!(
        SupervisorConfig::load_from(Some(file.path())),
        Err(SupervisorError::Configuration(_))
    ));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(SupervisorConfig::load_from(Some(&path)).is_err());
}

#[test]
fn test_environment_overrides() {
    std::env::set_var("SUPERVISOR__STREAM_UPDATES", "false");
    std::env::set_var("SUPERVISOR__EVENT_BUFFER_SIZE", "64");

    let config = SupervisorConfig::load().unwrap();

    std::env::remove_var("SUPERVISOR__STREAM_UPDATES");
    std::env::remove_var("SUPERVISOR__EVENT_BUFFER_SIZE");

    assert!(!config.stream_updates);
    assert_eq!(config.event_buffer_size, 64);
    assert_eq!(config.execution_order.len(), 5);
}

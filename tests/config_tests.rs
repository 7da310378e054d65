use ai_stack_monitor::config::{ServiceRegistry, Settings};
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn load_missing_settings_uses_defaults() {
    let settings = Settings::load("/path/that/does/not/exist/monitor.toml")
        .await
        .expect("fallback ok");
    assert_eq!(settings.monitoring.check_interval_seconds, 60);
    assert_eq!(settings.monitoring.probe_timeout_seconds, 5);
    assert_eq!(settings.nginx.reload_cooldown_seconds, 30);
    assert_eq!(settings.alerts.container_cpu_percent, 80.0);
}

#[tokio::test]
async fn load_custom_minimal_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("monitor.toml");
    let toml = r#"
        [monitoring]
        check_interval_seconds = 5
        probe_timeout_seconds = 2

        [alerts]
        response_time_ms = 1000.0
        container_cpu_percent = 70.0
        container_memory_percent = 80.0
        system_cpu_percent = 95.0
        system_memory_percent = 95.0

        [nginx]
        upstream_dir = "/tmp/upstreams"
        reload_cooldown_seconds = 10
    "#;
    fs::write(&path, toml).unwrap();
    let settings = Settings::load(&path).await.expect("parse custom");
    assert_eq!(settings.monitoring.check_interval_seconds, 5);
    assert_eq!(settings.monitoring.stats_budget_seconds, 5);
    assert_eq!(settings.monitoring.docker_socket, "/var/run/docker.sock");
    assert_eq!(settings.nginx.upstream_dir, "/tmp/upstreams");
    assert_eq!(settings.nginx.reload_cooldown_seconds, 10);
}

#[tokio::test]
async fn invalid_settings_toml_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "this = not = valid").unwrap();
    assert!(Settings::load(&path).await.is_err());
}

fn clear_registry_env() {
    std::env::remove_var("SERVICES_CONFIG");
    let mut index = 1;
    loop {
        let name = format!("SERVICE_{index}_NAME");
        let url = format!("SERVICE_{index}_URL");
        if std::env::var(&name).is_err() && std::env::var(&url).is_err() {
            break;
        }
        std::env::remove_var(&name);
        std::env::remove_var(&url);
        index += 1;
    }
}

#[test]
#[serial]
fn registry_prefers_json_config_file() {
    clear_registry_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("services.json");
    fs::write(
        &path,
        r#"{"qdrant": {"url": "http://qdrant:6333/health", "name": "Qdrant", "optional": true}}"#,
    )
    .unwrap();
    std::env::set_var("SERVICES_CONFIG", path.to_str().unwrap());
    std::env::set_var("SERVICE_1_NAME", "Ignored");
    std::env::set_var("SERVICE_1_URL", "http://ignored:1/health");

    let registry = ServiceRegistry::load();
    assert_eq!(registry.len(), 1);
    assert!(registry.get("qdrant").unwrap().optional);
    clear_registry_env();
}

#[test]
#[serial]
fn invalid_json_file_falls_through_to_env_pairs() {
    clear_registry_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("services.json");
    fs::write(&path, "{ this is not json").unwrap();
    std::env::set_var("SERVICES_CONFIG", path.to_str().unwrap());
    std::env::set_var("SERVICE_1_NAME", "First Service");
    std::env::set_var("SERVICE_1_URL", "http://first:8080/health");
    std::env::set_var("SERVICE_2_NAME", "Second Service");
    std::env::set_var("SERVICE_2_URL", "http://second:8080/health");

    let registry = ServiceRegistry::load();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("service_1").unwrap().name, "First Service");
    assert_eq!(registry.get("service_2").unwrap().url, "http://second:8080/health");
    clear_registry_env();
}

#[test]
#[serial]
fn env_pairs_stop_at_first_gap() {
    clear_registry_env();
    std::env::set_var("SERVICE_1_NAME", "Only Service");
    std::env::set_var("SERVICE_1_URL", "http://only:8080/health");
    // N=2 has a URL but no name, so enumeration stops before it.
    std::env::set_var("SERVICE_2_URL", "http://orphan:8080/health");

    let registry = ServiceRegistry::load();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("service_1").unwrap().key, "service_1");
    clear_registry_env();
}

#[test]
#[serial]
fn falls_back_to_compiled_defaults() {
    clear_registry_env();
    let registry = ServiceRegistry::load();
    assert_eq!(registry.len(), 10);
    assert_eq!(registry.get("dify-api").unwrap().name, "Dify API");
    assert_eq!(registry.get("ollama").unwrap().url, "http://ollama:11434/api/version");
}

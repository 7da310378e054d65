use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

use crate::models::ServiceDescriptor;

/// Tunables for the monitor itself, loaded from a TOML file with full
/// defaults when the file is missing. The *service registry* is resolved
/// separately, see [`ServiceRegistry::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringSettings,
    pub alerts: AlertSettings,
    pub nginx: NginxSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Collection tick interval T.
    pub check_interval_seconds: u64,
    /// Hard probe timeout (connect + read).
    pub probe_timeout_seconds: u64,
    /// Ceiling for one container stats call so a slow runtime socket
    /// cannot push the scheduler more than one tick behind.
    #[serde(default = "default_stats_budget")]
    pub stats_budget_seconds: u64,
    #[serde(default = "default_docker_socket")]
    pub docker_socket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    pub response_time_ms: f64,
    pub container_cpu_percent: f64,
    pub container_memory_percent: f64,
    pub system_cpu_percent: f64,
    pub system_memory_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxSettings {
    /// Directory the reverse proxy includes upstream fragments from.
    pub upstream_dir: String,
    /// Minimum seconds between reload signals C.
    pub reload_cooldown_seconds: u64,
}

fn default_stats_budget() -> u64 {
    5
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

impl Settings {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let settings: Settings = toml::from_str(&content)?;
                Ok(settings)
            }
            Err(_) => {
                tracing::warn!("settings file not found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitoring: MonitoringSettings {
                check_interval_seconds: 60,
                probe_timeout_seconds: 5,
                stats_budget_seconds: default_stats_budget(),
                docker_socket: default_docker_socket(),
            },
            alerts: AlertSettings {
                response_time_ms: 5000.0,
                container_cpu_percent: 80.0,
                container_memory_percent: 85.0,
                system_cpu_percent: 90.0,
                system_memory_percent: 90.0,
            },
            nginx: NginxSettings {
                upstream_dir: "/etc/nginx/upstreams".to_string(),
                reload_cooldown_seconds: 30,
            },
        }
    }
}

/// The set of monitored services in deterministic iteration order.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: Vec<ServiceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RegistryEntry {
    url: String,
    name: String,
    #[serde(default)]
    optional: bool,
}

impl ServiceRegistry {
    /// Resolve descriptors from the first source that yields a non-empty
    /// result: the JSON file named by `SERVICES_CONFIG`, then paired
    /// `SERVICE_<N>_NAME` / `SERVICE_<N>_URL` variables, then the compiled
    /// default stack. Loaded once at startup.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("SERVICES_CONFIG") {
            if Path::new(&path).exists() {
                match Self::from_json_file(&path) {
                    Ok(registry) if !registry.services.is_empty() => {
                        tracing::info!(path, count = registry.services.len(), "loaded services from config file");
                        return registry;
                    }
                    Ok(_) => tracing::warn!(path, "services config file is empty"),
                    Err(e) => tracing::warn!(path, error = %e, "failed to load services config file"),
                }
            }
        }

        let from_env = Self::from_env_pairs();
        if !from_env.services.is_empty() {
            tracing::info!(count = from_env.services.len(), "loaded services from environment variables");
            return from_env;
        }

        tracing::info!("using default services configuration");
        Self::defaults()
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let parsed: BTreeMap<String, RegistryEntry> = serde_json::from_str(content)?;
        let services = parsed
            .into_iter()
            .map(|(key, entry)| ServiceDescriptor {
                key,
                name: entry.name,
                url: entry.url,
                optional: entry.optional,
            })
            .collect();
        Ok(Self { services })
    }

    pub fn from_env_pairs() -> Self {
        let mut services = Vec::new();
        let mut index = 1usize;
        loop {
            let name = std::env::var(format!("SERVICE_{index}_NAME"));
            let url = std::env::var(format!("SERVICE_{index}_URL"));
            match (name, url) {
                (Ok(name), Ok(url)) => {
                    services.push(ServiceDescriptor {
                        key: format!("service_{index}"),
                        name,
                        url,
                        optional: false,
                    });
                    index += 1;
                }
                _ => break,
            }
        }
        Self { services }
    }

    pub fn defaults() -> Self {
        let entries = [
            ("dify-api", "http://dify-api:8080/health", "Dify API"),
            ("dify-web", "http://dify-web:3000/health", "Dify Web"),
            ("dify-worker", "http://dify-worker:8080/health", "Dify Worker"),
            ("ollama", "http://ollama:11434/api/version", "Ollama"),
            ("litellm", "http://litellm:4000/health", "LiteLLM"),
            ("mem0", "http://mem0:8000/health", "Mem0"),
            ("n8n", "http://n8n:5678/healthz", "N8N"),
            ("flowise", "http://flowise:3000/api/v1/health", "Flowise"),
            ("openwebui", "http://openwebui:8080/health", "OpenWebUI"),
            ("qdrant", "http://qdrant:6333/health", "Qdrant"),
        ];
        Self {
            services: entries
                .iter()
                .map(|(key, url, name)| ServiceDescriptor {
                    key: key.to_string(),
                    name: name.to_string(),
                    url: url.to_string(),
                    optional: false,
                })
                .collect(),
        }
    }

    pub fn from_descriptors(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn get(&self, key: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.key == key)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Resolve a credential from the environment, falling back to the matching
/// `/run/secrets/<lowercase_name>` file.
pub fn credential(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => read_secret_file(&format!("/run/secrets/{}", name.to_lowercase())),
    }
}

/// Read a secret file, trimming trailing whitespace.
pub fn read_secret_file(path: &str) -> Option<String> {
    std::fs::read_to_string(path).ok().map(|s| s.trim_end().to_string())
}

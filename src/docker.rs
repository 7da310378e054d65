use async_trait::async_trait;
use bollard::container::{
    KillContainerOptions, ListContainersOptions, LogOutput, LogsOptions, Stats, StatsOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Docker socket not available")]
    Unavailable,
    #[error("container '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Api(#[from] bollard::errors::Error),
}

/// Minimal container listing entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContainerBrief {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
}

impl ContainerBrief {
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }
}

/// One raw stats sample as reported by the runtime, carrying its built-in
/// pre/cur CPU pair. Delta math lives in the stats collector.
#[derive(Debug, Clone, Default)]
pub struct RawStatsSample {
    pub cpu_total_usage: u64,
    pub precpu_total_usage: u64,
    pub system_cpu_usage: Option<u64>,
    pub presystem_cpu_usage: Option<u64>,
    pub online_cpus: Option<u64>,
    pub percpu_count: Option<u64>,
    pub memory_usage: Option<u64>,
    pub memory_limit: Option<u64>,
    /// Interface -> (rx_bytes, tx_bytes).
    pub networks: HashMap<String, (u64, u64)>,
    /// Blkio entries as (op, value).
    pub blkio: Vec<(String, u64)>,
    pub container_status: String,
    pub container_id: String,
}

/// Abstraction over the local container engine. Name matching is substring
/// on container name so project-prefixed names (`ai-stack-nginx-1`) match
/// short logical names (`nginx`). Unit tests inject a fake implementation.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List containers, optionally filtered by name substring.
    async fn list_containers(&self, name_filter: Option<&str>) -> Result<Vec<ContainerBrief>, RuntimeError>;
    /// Fetch the last `tail` log lines of the container matching `name`.
    async fn fetch_logs(&self, name: &str, tail: usize, since: Option<i64>) -> Result<Vec<String>, RuntimeError>;
    /// Take one raw stats sample for the container matching `name`.
    async fn sample_stats(&self, name: &str) -> Result<RawStatsSample, RuntimeError>;
    /// Send a signal (e.g. SIGHUP) to the container matching `name`.
    async fn send_signal(&self, name: &str, signal: &str) -> Result<(), RuntimeError>;
    /// Restart the container matching `name`.
    async fn restart(&self, name: &str) -> Result<(), RuntimeError>;
    /// Run a command inside the container matching `name`, returning output.
    async fn exec(&self, name: &str, argv: &[String]) -> Result<String, RuntimeError>;
}

/// Docker Engine adapter over the local unix socket. When the socket is
/// absent or the connection fails every operation reports
/// [`RuntimeError::Unavailable`] instead of crashing the process.
pub struct DockerRuntime {
    client: Option<Docker>,
}

impl DockerRuntime {
    pub fn connect(socket: &str) -> Self {
        if !Path::new(socket).exists() {
            warn!(socket, "Docker socket not found, container features disabled");
            return Self { client: None };
        }
        match Docker::connect_with_socket(socket, 120, bollard::API_DEFAULT_VERSION) {
            Ok(client) => Self { client: Some(client) },
            Err(e) => {
                warn!(socket, error = %e, "failed to connect to Docker");
                Self { client: None }
            }
        }
    }

    fn client(&self) -> Result<&Docker, RuntimeError> {
        self.client.as_ref().ok_or(RuntimeError::Unavailable)
    }

    /// Find the first container whose name contains `name`.
    async fn find_container(&self, name: &str) -> Result<ContainerBrief, RuntimeError> {
        let all = self.list_containers(Some(name)).await?;
        all.into_iter().next().ok_or_else(|| RuntimeError::NotFound(name.to_string()))
    }
}

fn summary_to_brief(summary: bollard::service::ContainerSummary) -> ContainerBrief {
    let name = summary
        .names
        .and_then(|names| names.first().cloned())
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();
    ContainerBrief {
        id: summary.id.unwrap_or_default(),
        name,
        image: summary.image.unwrap_or_default(),
        state: summary.state.unwrap_or_default(),
        status: summary.status.unwrap_or_default(),
    }
}

fn sample_from_stats(stats: &Stats, state: &str, id: &str) -> RawStatsSample {
    let networks = stats
        .networks
        .as_ref()
        .map(|nets| {
            nets.iter()
                .map(|(iface, net)| (iface.clone(), (net.rx_bytes, net.tx_bytes)))
                .collect()
        })
        .unwrap_or_default();

    let blkio = stats
        .blkio_stats
        .io_service_bytes_recursive
        .as_ref()
        .map(|entries| entries.iter().map(|e| (e.op.clone(), e.value)).collect())
        .unwrap_or_default();

    RawStatsSample {
        cpu_total_usage: stats.cpu_stats.cpu_usage.total_usage,
        precpu_total_usage: stats.precpu_stats.cpu_usage.total_usage,
        system_cpu_usage: stats.cpu_stats.system_cpu_usage,
        presystem_cpu_usage: stats.precpu_stats.system_cpu_usage,
        online_cpus: stats.cpu_stats.online_cpus,
        percpu_count: stats.cpu_stats.cpu_usage.percpu_usage.as_ref().map(|v| v.len() as u64),
        memory_usage: stats.memory_stats.usage,
        memory_limit: stats.memory_stats.limit,
        networks,
        blkio,
        container_status: state.to_string(),
        container_id: id.chars().take(12).collect(),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self, name_filter: Option<&str>) -> Result<Vec<ContainerBrief>, RuntimeError> {
        let client = self.client()?;
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let containers = client.list_containers(Some(options)).await?;
        let mut result: Vec<ContainerBrief> = containers.into_iter().map(summary_to_brief).collect();
        if let Some(filter) = name_filter {
            result.retain(|c| c.name.contains(filter));
        }
        Ok(result)
    }

    async fn fetch_logs(&self, name: &str, tail: usize, since: Option<i64>) -> Result<Vec<String>, RuntimeError> {
        let target = self.find_container(name).await?;
        let client = self.client()?;
        let options = LogsOptions::<String> {
            follow: false,
            stdout: true,
            stderr: true,
            timestamps: true,
            since: since.unwrap_or(0),
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = client.logs(&target.name, Some(options));
        let mut lines = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                    for line in String::from_utf8_lossy(&message).lines() {
                        if !line.trim().is_empty() {
                            lines.push(line.to_string());
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(container = %target.name, error = %e, "log stream error");
                    break;
                }
            }
        }
        let skip = lines.len().saturating_sub(tail);
        Ok(lines.split_off(skip))
    }

    async fn sample_stats(&self, name: &str) -> Result<RawStatsSample, RuntimeError> {
        let target = self.find_container(name).await?;
        let client = self.client()?;
        let options = StatsOptions {
            stream: true,
            one_shot: false,
        };
        let mut stream = client.stats(&target.name, Some(options));
        // The first streamed frame has a zeroed pre-CPU pair; the second
        // carries the previous frame as its pre side.
        let _ = stream
            .next()
            .await
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))??;
        let stats = stream
            .next()
            .await
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))??;
        Ok(sample_from_stats(&stats, &target.state, &target.id))
    }

    async fn send_signal(&self, name: &str, signal: &str) -> Result<(), RuntimeError> {
        let target = self.find_container(name).await?;
        let client = self.client()?;
        client
            .kill_container(&target.name, Some(KillContainerOptions { signal }))
            .await?;
        Ok(())
    }

    async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        let target = self.find_container(name).await?;
        let client = self.client()?;
        client.restart_container(&target.name, None).await?;
        Ok(())
    }

    async fn exec(&self, name: &str, argv: &[String]) -> Result<String, RuntimeError> {
        let target = self.find_container(name).await?;
        let client = self.client()?;
        let options = CreateExecOptions {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(argv.to_vec()),
            ..Default::default()
        };
        let exec = client.create_exec(&target.name, options).await?;
        let mut collected = String::new();
        if let StartExecResults::Attached { mut output, .. } = client.start_exec(&exec.id, None).await? {
            while let Some(chunk) = output.next().await {
                match chunk {
                    Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                        collected.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(container = %target.name, error = %e, "exec stream error");
                        break;
                    }
                }
            }
        }
        Ok(collected)
    }
}

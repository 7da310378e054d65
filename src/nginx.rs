use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::docker::ContainerRuntime;
use crate::models::ProbeStatus;

/// Static service key -> (upstream name, backend address) table.
const UPSTREAM_MAP: &[(&str, &str, &str)] = &[
    ("dify-api", "dify", "dify-api:8080"),
    ("dify-web", "dify", "dify-web:3000"),
    ("n8n", "n8n", "n8n:5678"),
    ("flowise", "flowise", "flowise:3000"),
    ("openwebui", "openwebui", "openwebui:8080"),
    ("litellm", "litellm", "litellm:4000"),
    ("openmemory", "openmemory", "openmemory:8765"),
    ("ollama", "ollama", "ollama:11434"),
    ("ollama-webui", "ollama-webui", "ollama-webui:8080"),
    ("adminer", "adminer", "adminer:8080"),
];

/// The monitor's own upstream, seeded with its real address so the dashboard
/// is reachable even when every backend starts down.
const MONITORING_UPSTREAM: (&str, &str) = ("monitoring", "monitoring:8080");

/// Unreachable placeholder for seeded backend upstreams.
const PLACEHOLDER_ADDR: &str = "127.0.0.1:1";

pub fn upstream_for(service_key: &str) -> Option<(&'static str, &'static str)> {
    UPSTREAM_MAP
        .iter()
        .find(|(key, _, _)| *key == service_key)
        .map(|(_, name, addr)| (*name, *addr))
}

/// Reacts to service state transitions by rewriting nginx upstream fragments
/// and asking the proxy to reload, at most once per cooldown window.
pub struct Reconciler {
    runtime: Arc<dyn ContainerRuntime>,
    upstream_dir: PathBuf,
    cooldown: Duration,
    last_reload: Mutex<Option<Instant>>,
}

impl Reconciler {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, upstream_dir: impl Into<PathBuf>, cooldown: Duration) -> Self {
        Self {
            runtime,
            upstream_dir: upstream_dir.into(),
            cooldown,
            last_reload: Mutex::new(None),
        }
    }

    /// Seed every known upstream with an unreachable placeholder so nginx can
    /// start before any backend is up. Run once, before the scheduler.
    pub fn seed_default_upstreams(&self) {
        let mut names: Vec<&str> = UPSTREAM_MAP.iter().map(|(_, name, _)| *name).collect();
        names.dedup();
        for name in names {
            if let Err(e) = self.write_upstream(name, PLACEHOLDER_ADDR) {
                warn!(upstream = name, error = %e, "failed to seed upstream config");
            }
        }
        let (name, addr) = MONITORING_UPSTREAM;
        if let Err(e) = self.write_upstream(name, addr) {
            warn!(upstream = name, error = %e, "failed to seed monitoring upstream");
        }
    }

    /// Apply the transition policy for one observation. Acts only on a
    /// down/unknown -> up transition.
    pub async fn on_observation(&self, service_key: &str, previous: Option<ProbeStatus>, current: ProbeStatus) {
        let recovered = current == ProbeStatus::Up && !matches!(previous, Some(ProbeStatus::Up));
        if !recovered {
            return;
        }
        let prev_label = previous.map(|s| s.as_str()).unwrap_or("unknown");
        info!(service = service_key, from = prev_label, "service transitioned to up, updating nginx upstream");

        let Some((upstream, addr)) = upstream_for(service_key) else {
            info!(service = service_key, "no upstream mapping for service");
            return;
        };
        if let Err(e) = self.write_upstream(upstream, addr) {
            // A reload with a stale fragment would accomplish nothing.
            warn!(service = service_key, upstream, error = %e, "failed to write upstream config");
            return;
        }
        self.maybe_reload().await;
    }

    /// Rewrite one upstream fragment. The write goes through a temp file and
    /// rename so the proxy never reads a half-written fragment.
    pub fn write_upstream(&self, upstream: &str, addr: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upstream_dir)?;
        let body = format!("upstream {upstream} {{\n    server {addr};\n}}\n");
        let path = self.fragment_path(upstream);
        let tmp = self.upstream_dir.join(format!(".{upstream}.conf.tmp"));
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;
        info!(upstream, addr, path = %path.display(), "updated nginx upstream config");
        Ok(())
    }

    pub fn fragment_path(&self, upstream: &str) -> PathBuf {
        self.upstream_dir.join(format!("{upstream}.conf"))
    }

    /// Send SIGHUP to the nginx container unless a reload happened within the
    /// cooldown window. Returns whether a signal was dispatched. The cooldown
    /// clock only advances on a successful signal so failures retry on the
    /// next transition.
    pub async fn maybe_reload(&self) -> bool {
        {
            let last = self.last_reload.lock().expect("reload lock poisoned");
            if let Some(at) = *last {
                if at.elapsed() < self.cooldown {
                    info!("nginx reload skipped, cooldown active");
                    return false;
                }
            }
        }

        let nginx = match self.runtime.list_containers(Some("nginx")).await {
            Ok(containers) => containers.into_iter().find(|c| c.is_running()),
            Err(e) => {
                warn!(error = %e, "cannot reload nginx");
                return false;
            }
        };
        let Some(nginx) = nginx else {
            warn!("nginx container not found");
            return false;
        };

        match self.runtime.send_signal(&nginx.name, "SIGHUP").await {
            Ok(()) => {
                *self.last_reload.lock().expect("reload lock poisoned") = Some(Instant::now());
                info!(container = %nginx.name, "nginx reload signal sent");
                true
            }
            Err(e) => {
                warn!(container = %nginx.name, error = %e, "failed to signal nginx");
                false
            }
        }
    }

    pub fn upstream_dir(&self) -> &Path {
        &self.upstream_dir
    }
}

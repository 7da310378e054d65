use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{AlertSettings, ServiceRegistry, Settings};
use crate::docker::ContainerRuntime;
use crate::health::Prober;
use crate::history::HistoryStore;
use crate::metrics;
use crate::models::{Alert, ContainerStats, ProbeOutcome, ProbeStatus, ServiceDescriptor, Snapshot, SystemStats};
use crate::nginx::Reconciler;
use crate::stats::container_stats_from_sample;
use crate::system::SystemSampler;

/// Owns the collection scheduler: the single periodic worker that drives
/// probes, the state table, history, metrics and the nginx reconciler.
pub struct ServiceMonitor {
    settings: Arc<Settings>,
    registry: Arc<ServiceRegistry>,
    prober: Prober,
    runtime: Arc<dyn ContainerRuntime>,
    system: Arc<SystemSampler>,
    history: Arc<HistoryStore>,
    reconciler: Arc<Reconciler>,
    service_states: DashMap<String, ProbeStatus>,
}

/// Read-side view injected into HTTP handlers.
#[derive(Clone)]
pub struct MonitorHandle {
    settings: Arc<Settings>,
    registry: Arc<ServiceRegistry>,
    prober: Prober,
    runtime: Arc<dyn ContainerRuntime>,
    system: Arc<SystemSampler>,
    history: Arc<HistoryStore>,
}

impl ServiceMonitor {
    pub fn new(settings: Settings, registry: ServiceRegistry, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let prober = Prober::new(Duration::from_secs(settings.monitoring.probe_timeout_seconds));
        let reconciler = Arc::new(Reconciler::new(
            runtime.clone(),
            settings.nginx.upstream_dir.clone(),
            Duration::from_secs(settings.nginx.reload_cooldown_seconds),
        ));
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(registry),
            prober,
            runtime,
            system: Arc::new(SystemSampler::new()),
            history: Arc::new(HistoryStore::new()),
            reconciler,
            service_states: DashMap::new(),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            settings: self.settings.clone(),
            registry: self.registry.clone(),
            prober: self.prober.clone(),
            runtime: self.runtime.clone(),
            system: self.system.clone(),
            history: self.history.clone(),
        }
    }

    /// Last status recorded for a service, if it has been probed.
    pub fn service_state(&self, key: &str) -> Option<ProbeStatus> {
        self.service_states.get(key).map(|entry| *entry.value())
    }

    /// Spawn the collection loop and hand back the read-side view.
    pub fn start(self) -> MonitorHandle {
        let handle = self.handle();
        let monitor = Arc::new(self);
        tokio::spawn(async move {
            monitor.monitoring_loop().await;
        });
        handle
    }

    async fn monitoring_loop(self: Arc<Self>) {
        let period = Duration::from_secs(self.settings.monitoring.check_interval_seconds.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(services = self.registry.len(), interval = ?period, "starting collection loop");
        loop {
            ticker.tick().await;
            debug!("running collection pass for {} services", self.registry.len());
            self.collection_pass().await;
        }
    }

    /// One tick: probe every service in registry order, feed transitions to
    /// the reconciler, sample container and system stats, append one
    /// snapshot, refresh the gauges. Every failure mode is recovered here so
    /// the loop runs indefinitely.
    pub async fn collection_pass(&self) {
        let stats_budget = Duration::from_secs(self.settings.monitoring.stats_budget_seconds);
        let mut service_entries = BTreeMap::new();
        let mut container_entries = BTreeMap::new();

        for service in self.registry.services() {
            if optional_without_container(self.runtime.as_ref(), service).await {
                debug!(service = %service.key, "optional service has no container, skipping");
                continue;
            }

            let outcome = self.prober.probe(&service.url).await;
            let status = outcome.status();
            let previous = self.service_states.insert(service.key.clone(), status);
            self.reconciler.on_observation(&service.key, previous, status).await;
            metrics::record_probe_outcome(&service.key, &outcome);

            match tokio::time::timeout(stats_budget, self.runtime.sample_stats(&service.key)).await {
                Ok(Ok(sample)) => {
                    let stats = container_stats_from_sample(&sample);
                    metrics::update_container_metrics(&service.key, &stats);
                    container_entries.insert(service.key.clone(), stats);
                }
                Ok(Err(e)) => debug!(service = %service.key, error = %e, "container stats unavailable"),
                Err(_) => warn!(service = %service.key, "container stats call exceeded budget"),
            }

            service_entries.insert(service.key.clone(), outcome);
        }

        let system = self.system.sample();
        metrics::update_system_metrics(&system);

        self.history.append(Snapshot {
            timestamp: Utc::now(),
            services: service_entries,
            system,
            containers: container_entries,
        });
    }
}

/// An optional descriptor with no matching container is silently skipped.
/// A runtime failure falls through to probing so a broken socket never
/// hides a reachable service.
async fn optional_without_container(runtime: &dyn ContainerRuntime, service: &ServiceDescriptor) -> bool {
    if !service.optional {
        return false;
    }
    match runtime.list_containers(Some(&service.key)).await {
        Ok(containers) => containers.is_empty(),
        Err(_) => false,
    }
}

impl MonitorHandle {
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Probe every service right now, concurrently. Optional services with
    /// no matching container report as disabled instead of being probed.
    pub async fn current_statuses(&self) -> Vec<(ServiceDescriptor, ProbeOutcome)> {
        let probes = self.registry.services().iter().map(|service| async move {
            if optional_without_container(self.runtime.as_ref(), service).await {
                return (service.clone(), ProbeOutcome::Disabled);
            }
            let outcome = self.prober.probe(&service.url).await;
            (service.clone(), outcome)
        });
        join_all(probes).await
    }

    /// Current container stats for every service whose container answers.
    pub async fn resources(&self) -> Vec<(ServiceDescriptor, ContainerStats)> {
        let budget = Duration::from_secs(self.settings.monitoring.stats_budget_seconds);
        let samples = self.registry.services().iter().map(|service| async move {
            match tokio::time::timeout(budget, self.runtime.sample_stats(&service.key)).await {
                Ok(Ok(sample)) => Some((service.clone(), container_stats_from_sample(&sample))),
                Ok(Err(e)) => {
                    debug!(service = %service.key, error = %e, "container stats unavailable");
                    None
                }
                Err(_) => {
                    warn!(service = %service.key, "container stats call exceeded budget");
                    None
                }
            }
        });
        join_all(samples).await.into_iter().flatten().collect()
    }

    /// Evaluate the alert rules against fresh observations.
    pub async fn alerts(&self) -> Vec<Alert> {
        let statuses = self.current_statuses().await;
        let resources = self.resources().await;
        let system = self.system.sample();
        alerts_from_observations(&statuses, &resources, &system, &self.settings.alerts)
    }

    /// Refresh system and container gauges inline before a scrape.
    pub async fn refresh_scrape_metrics(&self) {
        let system = self.system.sample();
        metrics::update_system_metrics(&system);
        for (service, stats) in self.resources().await {
            metrics::update_container_metrics(&service.key, &stats);
        }
    }

    /// Chart-ready series derived from the retained history.
    pub fn trends(&self) -> serde_json::Value {
        let snapshots = self.history.snapshot_view();
        let time_labels: Vec<String> = snapshots
            .iter()
            .map(|s| s.timestamp.format("%H:%M").to_string())
            .collect();
        let system_cpu: Vec<f64> = snapshots.iter().map(|s| s.system.cpu_percent).collect();
        let system_memory: Vec<f64> = snapshots.iter().map(|s| s.system.memory_percent).collect();

        let mut service_response_times = serde_json::Map::new();
        for service in self.registry.services() {
            let series: Vec<f64> = snapshots
                .iter()
                .map(|s| {
                    s.services
                        .get(&service.key)
                        .and_then(|outcome| outcome.response_time_ms())
                        .unwrap_or(0.0)
                })
                .collect();
            service_response_times.insert(service.key.clone(), serde_json::json!(series));
        }

        serde_json::json!({
            "count": snapshots.len(),
            "time_labels": time_labels,
            "system_cpu": system_cpu,
            "system_memory": system_memory,
            "service_response_times": service_response_times,
        })
    }
}

/// Pure alert evaluation so the rules are testable without live probes.
pub fn alerts_from_observations(
    statuses: &[(ServiceDescriptor, ProbeOutcome)],
    resources: &[(ServiceDescriptor, ContainerStats)],
    system: &SystemStats,
    thresholds: &AlertSettings,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for (service, outcome) in statuses {
        match outcome {
            ProbeOutcome::Disabled => continue,
            ProbeOutcome::Down { error } => alerts.push(Alert::new(
                "error",
                &service.name,
                format!("Service is down: {error}"),
                "critical",
            )),
            ProbeOutcome::Up { response_time_ms } => {
                if *response_time_ms > thresholds.response_time_ms {
                    alerts.push(Alert::new(
                        "warning",
                        &service.name,
                        format!("High response time: {response_time_ms}ms"),
                        "warning",
                    ));
                }
            }
        }
    }

    for (service, stats) in resources {
        if stats.cpu_percent > thresholds.container_cpu_percent {
            alerts.push(Alert::new(
                "warning",
                &service.name,
                format!("High CPU usage: {}%", stats.cpu_percent),
                "warning",
            ));
        }
        if stats.memory_percent > thresholds.container_memory_percent {
            alerts.push(Alert::new(
                "error",
                &service.name,
                format!("High memory usage: {}%", stats.memory_percent),
                "critical",
            ));
        }
    }

    if system.cpu_percent > thresholds.system_cpu_percent {
        alerts.push(Alert::new(
            "error",
            "System",
            format!("High system CPU usage: {}%", system.cpu_percent),
            "critical",
        ));
    }
    if system.memory_percent > thresholds.system_memory_percent {
        alerts.push(Alert::new(
            "error",
            "System",
            format!("High system memory usage: {}%", system.memory_percent),
            "critical",
        ));
    }

    alerts.sort_by(|a, b| {
        a.severity_rank()
            .cmp(&b.severity_rank())
            .then(b.timestamp.cmp(&a.timestamp))
    });
    alerts
}

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// One monitored service. Immutable after the registry is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Stable key used in URLs, upstream lookups and metric labels.
    #[serde(skip)]
    pub key: String,
    pub name: String,
    pub url: String,
    /// Skip probing when no matching container exists.
    #[serde(default)]
    pub optional: bool,
}

/// Coarse probe status, tracked per service across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Up,
    Down,
    Disabled,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Disabled => "disabled",
        }
    }
}

/// Result of one health probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Up { response_time_ms: f64 },
    Down { error: String },
    Disabled,
}

impl ProbeOutcome {
    pub fn status(&self) -> ProbeStatus {
        match self {
            Self::Up { .. } => ProbeStatus::Up,
            Self::Down { .. } => ProbeStatus::Down,
            Self::Disabled => ProbeStatus::Disabled,
        }
    }

    pub fn response_time_ms(&self) -> Option<f64> {
        match self {
            Self::Up { response_time_ms } => Some(*response_time_ms),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Down { error } => Some(error),
            Self::Disabled => Some("Service not enabled"),
            Self::Up { .. } => None,
        }
    }
}

// Wire form: {"status": "up", "response_time": 12.3, "error": null}.
impl Serialize for ProbeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("status", self.status().as_str())?;
        map.serialize_entry("response_time", &self.response_time_ms())?;
        map.serialize_entry("error", &self.error())?;
        map.end()
    }
}

/// Per-container resource figures derived from one raw stats sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub memory_percent: f64,
    pub network_rx: u64,
    pub network_tx: u64,
    pub disk_read: u64,
    pub disk_write: u64,
    pub container_status: String,
    pub container_id: String,
}

/// Host-wide resource figures sampled once per tick and at scrape time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Mountpoint -> used percent.
    pub disks: BTreeMap<String, f64>,
}

/// Everything observed in one collection pass. Append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, ProbeOutcome>,
    pub system: SystemStats,
    pub containers: BTreeMap<String, ContainerStats>,
}

/// One alert entry as rendered by the alerts view.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub service: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub severity: &'static str,
    pub formatted_time: String,
}

impl Alert {
    pub fn new(kind: &'static str, service: &str, message: String, severity: &'static str) -> Self {
        let timestamp = Utc::now();
        Self {
            kind,
            service: service.to_string(),
            message,
            timestamp,
            severity,
            formatted_time: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn severity_rank(&self) -> u8 {
        match self.severity {
            "critical" => 0,
            "warning" => 1,
            "info" => 2,
            _ => 3,
        }
    }
}

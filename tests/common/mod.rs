#![allow(dead_code)]

use ai_stack_monitor::docker::{ContainerBrief, ContainerRuntime, RawStatsSample, RuntimeError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory container runtime for tests: configurable container set and
/// stats samples, recorded signals/restarts/execs.
pub struct FakeRuntime {
    pub available: AtomicBool,
    pub containers: Mutex<Vec<ContainerBrief>>,
    pub stats: Mutex<HashMap<String, RawStatsSample>>,
    pub logs: Mutex<Vec<String>>,
    pub signals: Mutex<Vec<(String, String)>>,
    pub restarts: Mutex<Vec<String>>,
    pub execs: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            containers: Mutex::new(Vec::new()),
            stats: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            restarts: Mutex::new(Vec::new()),
            execs: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        let runtime = Self::new();
        runtime.available.store(false, Ordering::SeqCst);
        runtime
    }

    pub fn add_container(&self, name: &str) {
        self.containers.lock().unwrap().push(ContainerBrief {
            id: format!("{name:0<12.12}"),
            name: name.to_string(),
            image: format!("{name}:latest"),
            state: "running".to_string(),
            status: "Up 5 minutes".to_string(),
        });
    }

    pub fn set_stats(&self, key: &str, sample: RawStatsSample) {
        self.stats.lock().unwrap().insert(key.to_string(), sample);
    }

    pub fn signal_count(&self) -> usize {
        self.signals.lock().unwrap().len()
    }

    fn check_available(&self) -> Result<(), RuntimeError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RuntimeError::Unavailable)
        }
    }

    fn find(&self, name: &str) -> Option<ContainerBrief> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name.contains(name))
            .cloned()
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self, name_filter: Option<&str>) -> Result<Vec<ContainerBrief>, RuntimeError> {
        self.check_available()?;
        let mut containers = self.containers.lock().unwrap().clone();
        if let Some(filter) = name_filter {
            containers.retain(|c| c.name.contains(filter));
        }
        Ok(containers)
    }

    async fn fetch_logs(&self, name: &str, tail: usize, _since: Option<i64>) -> Result<Vec<String>, RuntimeError> {
        self.check_available()?;
        self.find(name).ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        let logs = self.logs.lock().unwrap();
        let skip = logs.len().saturating_sub(tail);
        Ok(logs[skip..].to_vec())
    }

    async fn sample_stats(&self, name: &str) -> Result<RawStatsSample, RuntimeError> {
        self.check_available()?;
        self.stats
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))
    }

    async fn send_signal(&self, name: &str, signal: &str) -> Result<(), RuntimeError> {
        self.check_available()?;
        let target = self.find(name).ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        self.signals.lock().unwrap().push((target.name, signal.to_string()));
        Ok(())
    }

    async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        self.check_available()?;
        let target = self.find(name).ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        self.restarts.lock().unwrap().push(target.name);
        Ok(())
    }

    async fn exec(&self, name: &str, argv: &[String]) -> Result<String, RuntimeError> {
        self.check_available()?;
        let target = self.find(name).ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        self.execs.lock().unwrap().push((target.name, argv.to_vec()));
        Ok(String::new())
    }
}

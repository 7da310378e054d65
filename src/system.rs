use std::collections::BTreeMap;
use std::sync::Mutex;
use sysinfo::{Disks, System};

use crate::models::SystemStats;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Samples host-wide CPU, memory and per-mountpoint disk usage. The sysinfo
/// state is kept between samples so CPU usage is computed over the interval
/// since the previous refresh; the very first sample reports 0 CPU.
pub struct SystemSampler {
    sys: Mutex<System>,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self { sys: Mutex::new(sys) }
    }

    pub fn sample(&self) -> SystemStats {
        let (cpu_percent, memory_percent) = {
            let mut sys = self.sys.lock().expect("system sampler lock poisoned");
            sys.refresh_cpu_usage();
            sys.refresh_memory();
            let cpu = round2(sys.global_cpu_usage() as f64);
            let total = sys.total_memory();
            let memory = if total > 0 {
                round2(sys.used_memory() as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            (cpu, memory)
        };

        let mut disks = BTreeMap::new();
        for disk in Disks::new_with_refreshed_list().list() {
            let total = disk.total_space();
            if total == 0 {
                continue;
            }
            let used = total.saturating_sub(disk.available_space());
            disks.insert(
                disk.mount_point().to_string_lossy().to_string(),
                round2(used as f64 / total as f64 * 100.0),
            );
        }

        SystemStats {
            cpu_percent,
            memory_percent,
            disks,
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

use crate::docker::RawStatsSample;
use crate::models::ContainerStats;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derive per-container figures from one raw sample. CPU% uses the sample's
/// built-in pre/cur pair; a non-positive system delta yields 0 rather than a
/// division by zero.
pub fn container_stats_from_sample(sample: &RawStatsSample) -> ContainerStats {
    let cpu_delta = sample.cpu_total_usage.saturating_sub(sample.precpu_total_usage) as f64;
    let system_delta = match (sample.system_cpu_usage, sample.presystem_cpu_usage) {
        (Some(cur), Some(pre)) if cur > pre => (cur - pre) as f64,
        _ => 0.0,
    };
    let online_cpus = sample.online_cpus.or(sample.percpu_count).unwrap_or(1).max(1);
    let cpu_percent = if system_delta > 0.0 {
        round2((cpu_delta / system_delta) * online_cpus as f64 * 100.0)
    } else {
        0.0
    };

    let memory_usage = sample.memory_usage.unwrap_or(0);
    let memory_limit = sample.memory_limit.unwrap_or(0);
    let memory_percent = if memory_limit > 0 {
        round2(memory_usage as f64 / memory_limit as f64 * 100.0)
    } else {
        0.0
    };

    let (network_rx, network_tx) = sample
        .networks
        .values()
        .fold((0u64, 0u64), |(rx, tx), (net_rx, net_tx)| (rx + net_rx, tx + net_tx));

    let (disk_read, disk_write) = sample.blkio.iter().fold((0u64, 0u64), |(read, write), (op, value)| {
        if op.eq_ignore_ascii_case("read") {
            (read + value, write)
        } else if op.eq_ignore_ascii_case("write") {
            (read, write + value)
        } else {
            (read, write)
        }
    });

    ContainerStats {
        cpu_percent,
        memory_usage,
        memory_limit,
        memory_percent,
        network_rx,
        network_tx,
        disk_read,
        disk_write,
        container_status: sample.container_status.clone(),
        container_id: sample.container_id.clone(),
    }
}

use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::ProbeOutcome;

/// Performs one HTTP health check against a service URL. Every failure mode
/// is captured in the outcome; this never returns an error.
#[derive(Clone)]
pub struct Prober {
    client: Client,
}

impl Prober {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) => {
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                // Only an exact 200 counts as up; any other status, 2xx
                // included, is reported as down with the code.
                if response.status().as_u16() == 200 {
                    let response_time_ms = (elapsed_ms * 100.0).round() / 100.0;
                    debug!(url, response_time_ms, "probe ok");
                    ProbeOutcome::Up { response_time_ms }
                } else {
                    let error = format!("HTTP {}", response.status().as_u16());
                    debug!(url, %error, "probe failed");
                    ProbeOutcome::Down { error }
                }
            }
            Err(err) => {
                debug!(url, error = %err, "probe error");
                ProbeOutcome::Down { error: err.to_string() }
            }
        }
    }
}

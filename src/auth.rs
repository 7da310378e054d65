use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::config::credential;

/// Dashboard credentials resolved from the environment with a
/// `/run/secrets` fallback. `None` leaves the views open.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn resolve() -> Option<Self> {
        let username = credential("MONITORING_USERNAME")?;
        let password = credential("MONITORING_PASSWORD")?;
        Some(Self { username, password })
    }

    /// Check an `Authorization: Basic <b64>` header value.
    pub fn check_header(&self, header: Option<&str>) -> bool {
        let Some(header) = header else { return false };
        let Some(encoded) = header.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = BASE64.decode(encoded.trim()) else {
            return false;
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return false;
        };
        let Some((username, password)) = pair.split_once(':') else {
            return false;
        };
        constant_time_eq(username, &self.username) & constant_time_eq(password, &self.password)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

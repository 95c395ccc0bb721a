use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub device_model: String,
    pub token: Option<String>,
}

impl AppConfig {
    /// Config pointing at `api_url` with every other setting at its
    /// default. Does not read the environment.
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            device_model: default_device_model(),
            token: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_url =
            env::var("STABLEPUSH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_secs = match env::var("STABLEPUSH_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "Ignoring invalid STABLEPUSH_TIMEOUT_SECS={:?}, using {}s",
                    raw,
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let device_model = env::var("STABLEPUSH_DEVICE_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(default_device_model);
        let token = env::var("STABLEPUSH_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Self {
            api_url,
            timeout_secs,
            device_model,
            token,
        }
    }
}

// A zero timeout would make every request fail immediately
fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

/// Closest thing a terminal has to the "<manufacturer> <model>" string
/// a phone reports.
pub fn default_device_model() -> String {
    format!("{} {}", env::consts::OS, env::consts::ARCH)
}

use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REFRESH_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub refresh_interval: Duration,
    pub request_timeout: Option<Duration>,
}

impl MonitorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("MONITOR_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token = std::env::var("MONITOR_TOKEN").ok();
        let refresh_ms = match std::env::var("MONITOR_REFRESH_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("MONITOR_REFRESH_MS must be a whole number of milliseconds")?,
            Err(_) => DEFAULT_REFRESH_MS,
        };
        let request_timeout = match std::env::var("MONITOR_REQUEST_TIMEOUT_MS") {
            Ok(raw) => Some(Duration::from_millis(
                raw.parse::<u64>()
                    .context("MONITOR_REQUEST_TIMEOUT_MS must be a whole number of milliseconds")?,
            )),
            Err(_) => None,
        };

        Ok(Self {
            api_url: normalize_api_url(&api_url),
            token,
            refresh_interval: Duration::from_millis(refresh_ms.max(1)),
            request_timeout,
        })
    }

    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        token: Option<String>,
        refresh_ms: Option<u64>,
    ) -> Self {
        if let Some(url) = api_url {
            self.api_url = normalize_api_url(&url);
        }
        if token.is_some() {
            self.token = token;
        }
        if let Some(ms) = refresh_ms {
            self.refresh_interval = Duration::from_millis(ms.max(1));
        }
        self
    }
}

/// Ensures the base URL ends with `/api`, without a trailing slash.
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

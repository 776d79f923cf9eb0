//! Driver configuration, loaded from the environment

use questlog_core::{Error, Result};
use questlog_networking::ClientConfig;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL
    pub api_url: String,
    /// Bearer token of the signed-in player
    pub token: String,
    pub timeout: Duration,
    /// Answer every confirmation with yes
    pub assume_yes: bool,
}

impl AppConfig {
    /// Load from process environment. A `.env` file is read first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("QUESTLOG_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::ValidationError("QUESTLOG_TOKEN is required".to_string()))?;

        let timeout_secs = match lookup("QUESTLOG_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::ValidationError(format!("QUESTLOG_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let assume_yes = lookup("QUESTLOG_ASSUME_YES")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            api_url: lookup("QUESTLOG_API_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token,
            timeout: Duration::from_secs(timeout_secs),
            assume_yes,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url.clone()).with_timeout(self.timeout)
    }
}

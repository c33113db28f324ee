//! HTTP client configuration.
//!
//! Layered the usual way: [`HttpConfig::default`], then a serialized config
//! (all fields optional), then `STREAMLET_*` environment variables, then
//! explicit `with_*` overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_BASE_URL: &str = "STREAMLET_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "STREAMLET_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "STREAMLET_USER_AGENT";

const DEFAULT_BASE_URL: &str = "http://localhost:9000";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Scheme, host and optional port; paths are appended to it.
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: concat!("streamlet/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Defaults overridden by `STREAMLET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_lookup(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup` (an environment-like source), then
    /// validate.
    pub fn with_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw.trim().parse().map_err(|err: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: ENV_TIMEOUT_MS,
                    message: err.to_string(),
                }
            })?;
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            self.user_agent = user_agent;
        }
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message,
        };
        let url = reqwest::Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = HttpConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.user_agent.starts_with("streamlet/"));
    }

    #[test]
    fn env_overrides_apply() {
        let config = HttpConfig::default()
            .with_lookup(lookup(&[
                (ENV_BASE_URL, "https://courses.example.com/"),
                (ENV_TIMEOUT_MS, " 2500 "),
            ]))
            .expect("valid overrides");
        assert_eq!(config.base_url, "https://courses.example.com/");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(
            config.url("/api/courses"),
            "https://courses.example.com/api/courses"
        );
    }

    #[test]
    fn bad_timeout_is_reported() {
        let err = HttpConfig::default()
            .with_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: ENV_TIMEOUT_MS,
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(matches!(
            HttpConfig::default().with_base_url("ftp://x").validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            HttpConfig::default().with_base_url("not a url").validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            HttpConfig::default().with_timeout_ms(0).validate(),
            Err(ConfigError::ZeroTimeout)
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: HttpConfig =
            serde_json::from_str(r#"{"base_url":"http://127.0.0.1:8080"}"#).expect("parse");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}

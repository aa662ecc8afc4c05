//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the backend base URL.
pub const BASE_URL_ENV: &str = "LOGIGO_BASE_URL";

/// Environment variable holding the per-request timeout, in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "LOGIGO_REQUEST_TIMEOUT_SECS";

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the backend, e.g. `https://api.logigo.example`.
    /// Endpoint paths (`/api/...`) are appended to it.
    pub base_url: String,

    /// Upper bound for a single request, connect included.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl GatewayConfig {
    /// Creates a config for `base_url` with the default timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Builds a config from `LOGIGO_BASE_URL` and
    /// `LOGIGO_REQUEST_TIMEOUT_SECS`, keeping defaults for anything unset
    /// or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    config.request_timeout = Duration::from_secs(secs);
                }
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {REQUEST_TIMEOUT_ENV}"
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_lookup_reads_both_variables() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            (BASE_URL_ENV, "https://api.logigo.example"),
            (REQUEST_TIMEOUT_ENV, "30"),
        ]));
        assert_eq!(config.base_url, "https://api.logigo.example");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_ignores_invalid_timeout() {
        let config = GatewayConfig::from_lookup(lookup_from(&[(
            REQUEST_TIMEOUT_ENV,
            "soon",
        )]));
        assert_eq!(config.request_timeout, Duration::from_secs(15));

        let zero =
            GatewayConfig::from_lookup(lookup_from(&[(REQUEST_TIMEOUT_ENV, "0")]));
        assert_eq!(zero.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_lookup_ignores_blank_url() {
        let config =
            GatewayConfig::from_lookup(lookup_from(&[(BASE_URL_ENV, "  ")]));
        assert_eq!(config.base_url, GatewayConfig::default().base_url);
    }
}

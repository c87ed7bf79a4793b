//! Explicit configuration injected into the orchestrator at construction.

use std::env;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/search/repositories";

/// Optional capabilities of the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Send the saved personal access token with search requests.
    pub credentials: bool,
    /// Allow saving and re-applying queries.
    pub saved_queries: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            credentials: true,
            saved_queries: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Repository search endpoint.
    pub endpoint: String,
    /// How long the search term must be stable before it is searched.
    pub debounce: Duration,
    /// Pages shown on each side of the current page.
    pub page_radius: u32,
    pub features: Features,
    pub user_agent: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debounce: Duration::from_millis(400),
            page_radius: 2,
            features: Features::default(),
            user_agent: concat!("github-repo-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.trim().to_lowercase() != "false")
        .unwrap_or(default)
}

impl OrchestratorConfig {
    /// Defaults overlaid with `GRS_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("GRS_ENDPOINT").unwrap_or(defaults.endpoint),
            debounce: env::var("GRS_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            page_radius: env::var("GRS_PAGE_RADIUS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.page_radius),
            features: Features {
                credentials: env_flag("GRS_FEATURE_TOKEN", defaults.features.credentials),
                saved_queries: env_flag("GRS_FEATURE_SAVED", defaults.features.saved_queries),
            },
            user_agent: defaults.user_agent,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("Search endpoint must not be empty".to_string());
        }
        if self.debounce.is_zero() {
            return Err("Debounce delay must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.page_radius, 2);
        assert!(config.features.credentials);
        assert!(config.user_agent.starts_with("github-repo-search/"));
    }

    #[test]
    fn rejects_zero_debounce_and_empty_endpoint() {
        let config = OrchestratorConfig {
            debounce: Duration::ZERO,
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OrchestratorConfig {
            endpoint: "  ".to_string(),
            ..OrchestratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

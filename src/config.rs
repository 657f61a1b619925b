//! # Router Configuration
//!
//! Settings that shape how the routing table behaves at runtime and how
//! absolute URLs are built when no request host is known.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `ROUTEKIT_DEFAULT_SCHEME` | `default_scheme` | `http` |
//! | `ROUTEKIT_DEFAULT_HOST` | `default_host` | unset |
//! | `ROUTEKIT_SLOW_MATCH_US` | `slow_match_us` | `1000` |
//! | `ROUTEKIT_LOG_ROUTES` | `log_route_table` | `false` |
//!
//! The same fields can be read from TOML:
//!
//! ```rust
//! use routekit::config::RouterConfig;
//!
//! let config = RouterConfig::from_toml_str(r#"
//!     default_scheme = "https"
//!     default_host = "example.com"
//! "#)?;
//! assert_eq!(config.default_scheme, "https");
//! assert_eq!(config.slow_match_us, 1000);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Router runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Scheme used for absolute URLs
    pub default_scheme: String,
    /// Host used when the request context carries none
    pub default_host: Option<String>,
    /// Matches slower than this (microseconds) are logged at `warn`
    pub slow_match_us: u64,
    /// Log every route when the table is sealed
    pub log_route_table: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_scheme: "http".to_string(),
            default_host: None,
            slow_match_us: DEFAULT_SLOW_MATCH_US,
            log_route_table: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_scheme: env::var("ROUTEKIT_DEFAULT_SCHEME")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(defaults.default_scheme),
            default_host: env::var("ROUTEKIT_DEFAULT_HOST")
                .ok()
                .filter(|h| !h.is_empty()),
            slow_match_us: env::var("ROUTEKIT_SLOW_MATCH_US")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.slow_match_us),
            log_route_table: env::var("ROUTEKIT_LOG_ROUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.log_route_table),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse router config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    #[must_use]
    pub fn slow_match_threshold(&self) -> Duration {
        Duration::from_micros(self.slow_match_us)
    }
}

//! Crawl tunables, loaded from an optional YAML file.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```yaml
//! output_dir: ./data
//! request_timeout_secs: 15
//! politeness_delay_ms: [100, 300]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ConfigError;

/// Browser identities rotated across requests.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the per-domain CSV files are written to.
    pub output_dir: PathBuf,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Retries for connect/timeout errors and 429/5xx responses.
    pub max_transient_retries: u32,
    /// First backoff delay; doubles on each retry.
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff delay.
    pub backoff_max_ms: u64,
    /// Pause before the single retry that follows a 403.
    pub forbidden_retry_delay_ms: u64,
    /// Inclusive `[min, max]` random pause before every fetch.
    pub politeness_delay_ms: [u64; 2],
    /// Discovered links kept per page.
    pub links_per_page: usize,
    /// Dispatch window is `window_multiplier × max_workers` queued entries.
    pub window_multiplier: usize,
    pub user_agents: Vec<String>,
    /// Wall-clock ceiling for a crawl; `None` runs until quota or exhaustion.
    pub job_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            request_timeout_secs: 10,
            max_transient_retries: 3,
            backoff_base_ms: 300,
            backoff_max_ms: 10_000,
            forbidden_retry_delay_ms: 500,
            politeness_delay_ms: [200, 600],
            links_per_page: 25,
            window_multiplier: 3,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            job_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Read settings from a YAML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when the file cannot be read, does not parse, or
    /// fails [`Settings::validate`].
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!("Loaded configuration");
        Ok(settings)
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the crawler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agents.is_empty() {
            return Err(ConfigError::Invalid("user_agents must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".into(),
            ));
        }
        let [min, max] = self.politeness_delay_ms;
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "politeness_delay_ms min {min} exceeds max {max}"
            )));
        }
        if self.links_per_page == 0 || self.window_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "links_per_page and window_multiplier must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.links_per_page, 25);
        assert_eq!(settings.user_agents.len(), DEFAULT_USER_AGENTS.len());
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let settings = Settings::from_yaml(
            "output_dir: /tmp/bylines\npoliteness_delay_ms: [0, 0]\njob_timeout_secs: 60\n",
        )
        .unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/bylines"));
        assert_eq!(settings.politeness_delay_ms, [0, 0]);
        assert_eq!(settings.job_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(settings.max_transient_retries, 3);
    }

    #[test]
    fn test_invalid_delay_range_is_rejected() {
        let err = Settings::from_yaml("politeness_delay_ms: [500, 100]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_user_agents_rejected() {
        let err = Settings::from_yaml("user_agents: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Settings::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

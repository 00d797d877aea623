use crate::utils::get_env_parsed;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings for the admission layer.
///
/// The policy table itself is fixed (see [`super::PolicyRegistry`]); only
/// housekeeping is configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Seconds between background sweeps of expired entries.
    /// Set to 0 to disable the background janitor; requests still sweep
    /// opportunistically.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl RateLimitConfig {
    /// Create a new RateLimitConfig builder
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::new()
    }

    /// Load rate limit configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(interval) = get_env_parsed("RATE_LIMIT_CLEANUP_INTERVAL_SECONDS") {
            config.cleanup_interval_seconds = interval;
        }

        config
    }

    /// Janitor period, or `None` when the janitor is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_seconds > 0)
            .then(|| Duration::from_secs(self.cleanup_interval_seconds))
    }
}

/// Builder for RateLimitConfig
#[must_use = "builder does nothing until you call build()"]
pub struct RateLimitConfigBuilder {
    config: RateLimitConfig,
}

impl RateLimitConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RateLimitConfig::default(),
        }
    }

    pub fn cleanup_interval_seconds(mut self, seconds: u64) -> Self {
        self.config.cleanup_interval_seconds = seconds;
        self
    }

    pub fn without_janitor(mut self) -> Self {
        self.config.cleanup_interval_seconds = 0;
        self
    }

    pub fn build(self) -> RateLimitConfig {
        self.config
    }
}

impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_cleanup_interval_seconds() -> u64 {
    300 // 5 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert_eq!(config.cleanup_interval(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_builder_disables_janitor() {
        let config = RateLimitConfig::builder().without_janitor().build();
        assert_eq!(config.cleanup_interval(), None);

        let config = RateLimitConfig::builder().cleanup_interval_seconds(30).build();
        assert_eq!(config.cleanup_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("GATEHOUSE_RATE_LIMIT_CLEANUP_INTERVAL_SECONDS", "45");
        }
        assert_eq!(RateLimitConfig::from_env().cleanup_interval_seconds, 45);
        unsafe {
            std::env::remove_var("GATEHOUSE_RATE_LIMIT_CLEANUP_INTERVAL_SECONDS");
        }
    }
}

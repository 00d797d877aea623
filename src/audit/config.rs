use super::store::DEFAULT_MAX_LOGS;
use crate::utils::get_env_parsed;
use serde::{Deserialize, Serialize};

/// Audit trail configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Maximum number of entries retained in memory
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,

    /// Whether entries are written to the console sink
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_logs: default_max_logs(),
            console: default_console(),
        }
    }
}

impl AuditConfig {
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::new()
    }

    /// Load audit configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(max_logs) = get_env_parsed("AUDIT_MAX_LOGS") {
            config.max_logs = max_logs;
        }

        if let Some(console) = get_env_parsed("AUDIT_CONSOLE") {
            config.console = console;
        }

        config
    }
}

/// Builder for AuditConfig
#[must_use = "builder does nothing until you call build()"]
pub struct AuditConfigBuilder {
    config: AuditConfig,
}

impl AuditConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AuditConfig::default(),
        }
    }

    pub fn max_logs(mut self, max_logs: usize) -> Self {
        self.config.max_logs = max_logs;
        self
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    pub fn build(self) -> AuditConfig {
        self.config
    }
}

impl Default for AuditConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_max_logs() -> usize {
    DEFAULT_MAX_LOGS
}

fn default_console() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert_eq!(config.max_logs, 1000);
        assert!(config.console);
    }

    #[test]
    fn test_builder() {
        let config = AuditConfig::builder().max_logs(10).console(false).build();
        assert_eq!(config.max_logs, 10);
        assert!(!config.console);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AuditConfig = serde_json::from_str(r#"{"console": false}"#).unwrap();
        assert_eq!(config.max_logs, 1000);
        assert!(!config.console);
    }
}

use crate::utils::{get_env_csv, get_env_parsed, get_env_with_prefix};
use serde::{Deserialize, Serialize};

/// CORS negotiation settings shared by every governed handler
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Origins echoed back verbatim when they appear in a request's `Origin`
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Origin returned when the caller's origin is missing or not allowed
    #[serde(default = "default_origin")]
    pub default_origin: String,

    /// Allowed HTTP methods (e.g., ["GET", "POST", "PUT", "DELETE"])
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed request headers
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,

    /// Whether to allow credentials (cookies, authorization headers)
    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,

    /// Maximum age for preflight request caching (in seconds)
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            default_origin: default_origin(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
            allow_credentials: default_allow_credentials(),
            max_age_seconds: default_max_age(),
        }
    }
}

impl CorsConfig {
    /// Create a new CorsConfig builder
    pub fn builder() -> CorsConfigBuilder {
        CorsConfigBuilder::new()
    }

    /// Load CORS configuration from environment variables
    ///
    /// `CORS_ALLOWED_ORIGINS` is a comma-separated allow-list. Checks
    /// GATEHOUSE_ prefixed vars first, falls back to unprefixed.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(origins) = get_env_csv("CORS_ALLOWED_ORIGINS") {
            config.allowed_origins = origins;
        }

        if let Some(origin) = get_env_with_prefix("CORS_DEFAULT_ORIGIN") {
            config.default_origin = origin.trim().to_string();
        }

        if let Some(methods) = get_env_csv("CORS_ALLOWED_METHODS") {
            config.allowed_methods = methods;
        }

        if let Some(headers) = get_env_csv("CORS_ALLOWED_HEADERS") {
            config.allowed_headers = headers;
        }

        if let Some(credentials) = get_env_parsed("CORS_ALLOW_CREDENTIALS") {
            config.allow_credentials = credentials;
        }

        if let Some(max_age) = get_env_parsed("CORS_MAX_AGE") {
            config.max_age_seconds = max_age;
        }

        config
    }

    /// Whether `origin` is on the allow-list or is the default origin.
    pub fn is_allowed(&self, origin: &str) -> bool {
        origin == self.default_origin || self.allowed_origins.iter().any(|o| o == origin)
    }
}

/// Builder for CorsConfig
#[must_use = "builder does nothing until you call build()"]
pub struct CorsConfigBuilder {
    config: CorsConfig,
}

impl CorsConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CorsConfig::default(),
        }
    }

    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.allowed_origins.push(origin.into());
        self
    }

    pub fn allow_origins(mut self, origins: Vec<String>) -> Self {
        self.config.allowed_origins = origins;
        self
    }

    pub fn default_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.default_origin = origin.into();
        self
    }

    pub fn allow_methods(mut self, methods: Vec<String>) -> Self {
        self.config.allowed_methods = methods;
        self
    }

    pub fn allow_headers(mut self, headers: Vec<String>) -> Self {
        self.config.allowed_headers = headers;
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    pub fn max_age(mut self, seconds: u64) -> Self {
        self.config.max_age_seconds = seconds;
        self
    }

    pub fn build(self) -> CorsConfig {
        self.config
    }
}

impl Default for CorsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_allowed_methods() -> Vec<String> {
    vec![
        "GET".to_string(),
        "POST".to_string(),
        "PUT".to_string(),
        "DELETE".to_string(),
        "OPTIONS".to_string(),
    ]
}

fn default_allowed_headers() -> Vec<String> {
    vec![
        "content-type".to_string(),
        "authorization".to_string(),
        "x-request-id".to_string(),
    ]
}

fn default_allow_credentials() -> bool {
    true
}

fn default_max_age() -> u64 {
    86400 // 24 hours
}

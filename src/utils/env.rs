/// Get environment variable with GATEHOUSE_ prefix, falling back to unprefixed version
///
/// This helper function checks for `GATEHOUSE_{key}` first, then falls back to `{key}`
/// for compatibility with standard environment variable naming.
///
/// # Examples
///
/// ```rust
/// use gatehouse::utils::get_env_with_prefix;
///
/// // Checks GATEHOUSE_AUDIT_MAX_LOGS first, then AUDIT_MAX_LOGS
/// let max_logs = get_env_with_prefix("AUDIT_MAX_LOGS");
///
/// // Checks GATEHOUSE_CORS_DEFAULT_ORIGIN first, then CORS_DEFAULT_ORIGIN
/// let origin = get_env_with_prefix("CORS_DEFAULT_ORIGIN");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("GATEHOUSE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a comma-separated environment variable into trimmed, non-empty items.
pub fn get_env_csv(key: &str) -> Option<Vec<String>> {
    get_env_with_prefix(key).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Parse an environment variable into any `FromStr` type, ignoring malformed values.
pub fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    get_env_with_prefix(key).and_then(|raw| raw.trim().parse().ok())
}

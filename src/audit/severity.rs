use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Classification of an audited request.
///
/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Info, Self::Warn, Self::Error, Self::Critical];

    /// Base severity implied by an HTTP status code.
    ///
    /// Every 4xx maps to `Error`, including 404 with no error message
    /// attached. Only 3xx statuses start at `Warn`.
    pub fn from_status(status: u16) -> Self {
        match status {
            500.. => Self::Critical,
            400..=499 => Self::Error,
            300..=399 => Self::Warn,
            _ => Self::Info,
        }
    }

    /// Raise by one step along `info -> warn -> error`.
    ///
    /// `error` and `critical` are unchanged: only a 5xx status reaches
    /// `critical`.
    pub fn escalate(self) -> Self {
        match self {
            Self::Info => Self::Warn,
            Self::Warn => Self::Error,
            other => other,
        }
    }

    /// Severity of an entry with `status`, escalated once when an error
    /// message is attached.
    pub fn classify(status: u16, has_error: bool) -> Self {
        let base = Self::from_status(status);
        if has_error { base.escalate() } else { base }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown severity name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_severity_from_status() {
        assert_eq!(Severity::from_status(200), Severity::Info);
        assert_eq!(Severity::from_status(204), Severity::Info);
        assert_eq!(Severity::from_status(301), Severity::Warn);
        assert_eq!(Severity::from_status(404), Severity::Error);
        assert_eq!(Severity::from_status(429), Severity::Error);
        assert_eq!(Severity::from_status(500), Severity::Critical);
        assert_eq!(Severity::from_status(503), Severity::Critical);
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(Severity::classify(200, false), Severity::Info);
        assert_eq!(Severity::classify(200, true), Severity::Warn);
        assert_eq!(Severity::classify(302, true), Severity::Error);
        assert_eq!(Severity::classify(404, false), Severity::Error);
        assert_eq!(Severity::classify(404, true), Severity::Error);
        assert_eq!(Severity::classify(500, false), Severity::Critical);
        assert_eq!(Severity::classify(500, true), Severity::Critical);
    }

    #[test]
    fn test_escalation_never_reaches_critical() {
        for severity in Severity::ALL {
            let escalated = severity.escalate();
            assert!(escalated >= severity);
            if severity != Severity::Critical {
                assert_ne!(escalated, Severity::Critical);
            }
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("CRITICAL".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!(Severity::Warn.to_string(), "warn");
        assert!("fatal".parse::<Severity>().is_err());
    }
}

// ⚙️ Configuration - Built once at process start, passed by reference
// No ambient global lookups inside engine or rule logic

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid mode '{0}' (expected 'assistant' or 'auto')")]
    InvalidMode(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

// ============================================================================
// OPERATING MODE
// ============================================================================

/// Assistant mode only reports; autonomous mode would additionally trigger
/// write-back elsewhere (not part of this engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Assistant,
    Autonomous,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Assistant => "assistant",
            Mode::Autonomous => "auto",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "assistant" => Ok(Mode::Assistant),
            "auto" | "autonomous" => Ok(Mode::Autonomous),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

/// Application configuration, loaded from the environment once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,

    /// Interval for periodic checks in watch mode
    pub check_interval_hours: u64,

    /// Rules to activate; `None` means the full built-in set
    pub enabled_rules: Option<Vec<String>>,

    /// Tolerance for the invoice/receipt mismatch check
    pub invoice_tolerance: Decimal,

    pub reports_dir: PathBuf,

    /// Directory holding the ERP export files; required to run
    pub export_dir: Option<PathBuf>,

    /// Elapsed-time budget per record-kind fetch
    pub fetch_timeout: Duration,

    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_getter(|key| env::var(key).ok())
    }

    fn from_getter(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match get("APP_MODE") {
            Some(v) => Mode::parse(&v)?,
            None => Mode::Assistant,
        };

        let check_interval_hours = parse_number(&get, "CHECK_INTERVAL_HOURS", 24)?;
        let fetch_timeout_secs: u64 = parse_number(&get, "FETCH_TIMEOUT_SECS", 30)?;

        let invoice_tolerance = match get("INVOICE_TOLERANCE") {
            Some(v) => v.parse::<Decimal>().map_err(|_| ConfigError::InvalidValue {
                key: "INVOICE_TOLERANCE".to_string(),
                value: v,
            })?,
            None => dec!(0.01),
        };

        let enabled_rules = get("ENABLED_RULES").map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(AppConfig {
            mode,
            check_interval_hours,
            enabled_rules,
            invoice_tolerance,
            reports_dir: get("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("reports")),
            export_dir: get("EXPORT_DIR").map(PathBuf::from),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_number(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match get(key) {
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: v,
        }),
        None => Ok(default),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn getter<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_getter(getter(&[])).unwrap();

        assert_eq!(config.mode, Mode::Assistant);
        assert_eq!(config.check_interval_hours, 24);
        assert_eq!(config.enabled_rules, None);
        assert_eq!(config.invoice_tolerance, dec!(0.01));
        assert_eq!(config.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.export_dir, None);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_full_configuration() {
        let config = AppConfig::from_getter(getter(&[
            ("APP_MODE", "auto"),
            ("CHECK_INTERVAL_HOURS", "6"),
            ("ENABLED_RULES", "unbalanced_journal, zero_cost_item"),
            ("INVOICE_TOLERANCE", "0.05"),
            ("REPORTS_DIR", "/var/reports"),
            ("EXPORT_DIR", "/var/export"),
            ("FETCH_TIMEOUT_SECS", "10"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.mode, Mode::Autonomous);
        assert_eq!(config.check_interval_hours, 6);
        assert_eq!(
            config.enabled_rules,
            Some(vec![
                "unbalanced_journal".to_string(),
                "zero_cost_item".to_string()
            ])
        );
        assert_eq!(config.invoice_tolerance, dec!(0.05));
        assert_eq!(config.export_dir, Some(PathBuf::from("/var/export")));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let err = AppConfig::from_getter(getter(&[("APP_MODE", "yolo")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMode(m) if m == "yolo"));
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let err =
            AppConfig::from_getter(getter(&[("CHECK_INTERVAL_HOURS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "CHECK_INTERVAL_HOURS"));
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let err = AppConfig::from_getter(getter(&[("INVOICE_TOLERANCE", "cheap")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "INVOICE_TOLERANCE"));
    }
}

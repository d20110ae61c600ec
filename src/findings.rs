// 🚨 Findings - Severity-classified issues emitted by rules
// Value objects: created by rules, never mutated after creation

use crate::records::RecordKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity levels for findings. ERROR outranks WARNING outranks INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed immediately
    Error,
    /// Should be reviewed
    Warning,
    /// Informational
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Sort rank: lower comes first in a report.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    /// Console symbol per severity group.
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Error => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "ℹ️",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// FINDING
// ============================================================================

/// One detected issue: which rule fired, on which record, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    /// Stable identifier of the originating rule
    pub rule_id: String,

    pub message: String,

    pub record_type: RecordKind,

    /// Identifier of the offending record. Diagnostic findings that cover a
    /// whole record type (fetch failure, failing rule) use "*".
    pub record_id: String,

    /// Optional numeric context, e.g. the signed imbalance amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Decimal>,
}

impl Finding {
    pub fn new(
        severity: Severity,
        rule_id: &str,
        message: impl Into<String>,
        record_type: RecordKind,
        record_id: impl Into<String>,
    ) -> Self {
        Finding {
            severity,
            rule_id: rule_id.to_string(),
            message: message.into(),
            record_type,
            record_id: record_id.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Decimal) -> Self {
        self.context = Some(context);
        self
    }

    /// Idempotency fingerprint over the identifying fields.
    ///
    /// Two findings with the same rule, record, and message are the same
    /// issue - a record re-fetched across a retried batch must not show up
    /// twice in a report.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.rule_id.as_bytes());
        hasher.update(b"|");
        hasher.update(self.record_id.as_bytes());
        hasher.update(b"|");
        hasher.update(self.message.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Deterministic report ordering: severity, then rule, then record.
    pub fn sort_key(&self) -> (u8, &str, &str) {
        (self.severity.rank(), &self.rule_id, &self.record_id)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({} {})",
            self.severity, self.rule_id, self.message, self.record_type, self.record_id
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error.rank() < Severity::Warning.rank());
        assert!(Severity::Warning.rank() < Severity::Info.rank());
    }

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        let s: Severity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(s, Severity::Warning);
    }

    #[test]
    fn test_fingerprint_stable_for_equal_findings() {
        let a = Finding::new(
            Severity::Error,
            "unbalanced_journal",
            "Journal entry JE1 is unbalanced",
            RecordKind::JournalEntry,
            "JE1",
        );
        let b = a.clone();

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_differs_per_record() {
        let a = Finding::new(
            Severity::Warning,
            "zero_amount_entry",
            "zero amount",
            RecordKind::JournalEntry,
            "JE1",
        );
        let b = Finding::new(
            Severity::Warning,
            "zero_amount_entry",
            "zero amount",
            RecordKind::JournalEntry,
            "JE2",
        );

        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_context_serialized_as_string() {
        let finding = Finding::new(
            Severity::Error,
            "unbalanced_journal",
            "imbalance",
            RecordKind::JournalEntry,
            "JE1",
        )
        .with_context(dec!(10.00));

        let json = serde_json::to_string(&finding).unwrap();
        assert!(json.contains("\"context\":\"10.00\""));

        let clean = Finding::new(
            Severity::Info,
            "malformed_record",
            "no id",
            RecordKind::Invoice,
            "?",
        );
        assert!(!serde_json::to_string(&clean).unwrap().contains("context"));
    }
}

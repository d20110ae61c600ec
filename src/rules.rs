// 🔎 Control Rules - Rules as data + behavior
// Each rule is an independent predicate over the fetched record snapshot

use crate::findings::{Finding, Severity};
use crate::records::{RecordKind, RecordSet};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// RULE CONTRACT
// ============================================================================

#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule could not complete its evaluation. The engine converts this
    /// into a single INFO finding; it never aborts the run.
    #[error("rule '{rule}' failed: {reason}")]
    Evaluation { rule: String, reason: String },
}

impl RuleError {
    pub fn evaluation(rule: &str, reason: impl Into<String>) -> Self {
        RuleError::Evaluation {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single control check.
///
/// Rules are pure functions of the snapshot: no hidden state, no I/O.
/// `consumes` declares which record kinds the engine must fetch before
/// this rule can run.
pub trait Rule {
    /// Stable identifier, unique within a registry
    fn id(&self) -> &'static str;

    /// Default severity of findings this rule emits
    fn severity(&self) -> Severity;

    /// Record kinds this rule reads from the snapshot
    fn consumes(&self) -> &'static [RecordKind];

    fn evaluate(&self, records: &RecordSet) -> Result<Vec<Finding>, RuleError>;
}

// ============================================================================
// ZERO AMOUNT ENTRY
// ============================================================================

/// Flags journal entries where every line carries a zero amount.
pub struct ZeroAmountEntry;

impl Rule for ZeroAmountEntry {
    fn id(&self) -> &'static str {
        "zero_amount_entry"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn consumes(&self) -> &'static [RecordKind] {
        &[RecordKind::JournalEntry]
    }

    fn evaluate(&self, records: &RecordSet) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for entry in &records.journal_entries {
            // Amounts are non-negative magnitudes, so a zero total on both
            // sides means every line is zero.
            if entry.total_debit().is_zero() && entry.total_credit().is_zero() {
                findings.push(Finding::new(
                    self.severity(),
                    self.id(),
                    format!("Journal entry {} has zero amount (debit=0, credit=0)", entry.id),
                    RecordKind::JournalEntry,
                    &entry.id,
                ));
            }
        }

        debug!(rule = self.id(), count = findings.len(), "rule evaluated");
        Ok(findings)
    }
}

// ============================================================================
// UNBALANCED JOURNAL
// ============================================================================

/// Flags journal entries whose debits and credits do not sum equal.
///
/// Exact decimal comparison - monetary amounts are discrete cents, so any
/// difference is a real defect, not rounding noise.
pub struct UnbalancedJournal;

impl Rule for UnbalancedJournal {
    fn id(&self) -> &'static str {
        "unbalanced_journal"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn consumes(&self) -> &'static [RecordKind] {
        &[RecordKind::JournalEntry]
    }

    fn evaluate(&self, records: &RecordSet) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for entry in &records.journal_entries {
            if !entry.is_balanced() {
                let imbalance = entry.imbalance();
                findings.push(
                    Finding::new(
                        self.severity(),
                        self.id(),
                        format!(
                            "Journal entry {} is unbalanced: debit={}, credit={}, imbalance={}",
                            entry.id,
                            entry.total_debit(),
                            entry.total_credit(),
                            imbalance
                        ),
                        RecordKind::JournalEntry,
                        &entry.id,
                    )
                    .with_context(imbalance),
                );
            }
        }

        debug!(rule = self.id(), count = findings.len(), "rule evaluated");
        Ok(findings)
    }
}

// ============================================================================
// DEPRECATED ACCOUNT USAGE
// ============================================================================

/// Flags journal lines posted against a deprecated ("garbage") account.
pub struct DeprecatedAccountUsage;

impl Rule for DeprecatedAccountUsage {
    fn id(&self) -> &'static str {
        "deprecated_account_usage"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn consumes(&self) -> &'static [RecordKind] {
        &[RecordKind::JournalEntry, RecordKind::Account]
    }

    fn evaluate(&self, records: &RecordSet) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for entry in &records.journal_entries {
            for line in &entry.lines {
                let deprecated = records
                    .account(&line.account_code)
                    .map(|a| a.deprecated)
                    .unwrap_or(false);

                if deprecated {
                    findings.push(Finding::new(
                        self.severity(),
                        self.id(),
                        format!(
                            "Entry {} posts to deprecated account {}",
                            entry.id, line.account_code
                        ),
                        RecordKind::JournalEntry,
                        &entry.id,
                    ));
                }
            }
        }

        debug!(rule = self.id(), count = findings.len(), "rule evaluated");
        Ok(findings)
    }
}

// ============================================================================
// INVOICE / RECEIPT MISMATCH
// ============================================================================

/// Flags invoices whose residual is inconsistent with recorded payments.
///
/// Fires when the residual exceeds the total beyond the tolerance, or when
/// the residual went negative beyond the tolerance (payments over-applied).
/// The tolerance is configurable; the default is one cent.
pub struct InvoiceReceiptMismatch {
    tolerance: Decimal,
}

impl InvoiceReceiptMismatch {
    pub fn new() -> Self {
        InvoiceReceiptMismatch {
            tolerance: dec!(0.01),
        }
    }

    pub fn with_tolerance(tolerance: Decimal) -> Self {
        InvoiceReceiptMismatch { tolerance }
    }
}

impl Default for InvoiceReceiptMismatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for InvoiceReceiptMismatch {
    fn id(&self) -> &'static str {
        "invoice_receipt_mismatch"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn consumes(&self) -> &'static [RecordKind] {
        &[RecordKind::Invoice]
    }

    fn evaluate(&self, records: &RecordSet) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for invoice in &records.invoices {
            let overshoot = invoice.residual - invoice.total;
            let mismatch = overshoot > self.tolerance || invoice.residual < -self.tolerance;

            if mismatch {
                findings.push(
                    Finding::new(
                        self.severity(),
                        self.id(),
                        format!(
                            "Invoice {} has residual {} inconsistent with total {}",
                            invoice.id, invoice.residual, invoice.total
                        ),
                        RecordKind::Invoice,
                        &invoice.id,
                    )
                    .with_context(overshoot),
                );
            }
        }

        debug!(rule = self.id(), count = findings.len(), "rule evaluated");
        Ok(findings)
    }
}

// ============================================================================
// ZERO COST ITEM
// ============================================================================

/// Flags products sold at a price while carrying no standard cost -
/// margin reports on these are meaningless.
pub struct ZeroCostItem;

impl Rule for ZeroCostItem {
    fn id(&self) -> &'static str {
        "zero_cost_item"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn consumes(&self) -> &'static [RecordKind] {
        &[RecordKind::Product]
    }

    fn evaluate(&self, records: &RecordSet) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();

        for product in &records.products {
            if product.standard_cost.is_zero() && product.sale_price > Decimal::ZERO {
                findings.push(Finding::new(
                    self.severity(),
                    self.id(),
                    format!(
                        "Product {} has zero standard cost but sells at {}",
                        product.sku, product.sale_price
                    ),
                    RecordKind::Product,
                    &product.id,
                ));
            }
        }

        debug!(rule = self.id(), count = findings.len(), "rule evaluated");
        Ok(findings)
    }
}

// ============================================================================
// TESTS
// ============================================================================

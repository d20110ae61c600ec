// 📒 Financial Records - Immutable snapshots fetched from the ERP
// Journal entries, invoices, products, and chart-of-accounts entries

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// RECORD KIND
// ============================================================================

/// The record families the engine can fetch and rules can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    JournalEntry,
    Invoice,
    Product,
    Account,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::JournalEntry => "journal_entry",
            RecordKind::Invoice => "invoice",
            RecordKind::Product => "product",
            RecordKind::Account => "account",
        }
    }

    /// File name used by export-directory backends (`<kind>.json`).
    pub fn export_file_name(&self) -> &'static str {
        match self {
            RecordKind::JournalEntry => "journal_entries.json",
            RecordKind::Invoice => "invoices.json",
            RecordKind::Product => "products.json",
            RecordKind::Account => "accounts.json",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// JOURNAL ENTRIES
// ============================================================================

/// One debit-or-credit movement against an account within an entry.
///
/// Debit and credit are magnitudes - exactly one of them may be non-zero.
/// A line violating that is a malformed record, not a rule trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,

    #[serde(default)]
    pub debit: Decimal,

    #[serde(default)]
    pub credit: Decimal,

    /// ISO 4217 code (USD, EUR, ...)
    pub currency: String,
}

/// A double-entry accounting transaction composed of one or more lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,

    pub date: NaiveDate,

    /// Journal the entry was posted in (e.g. "BANK", "MISC")
    #[serde(default)]
    pub journal_ref: String,

    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Signed imbalance: positive when debits exceed credits.
    pub fn imbalance(&self) -> Decimal {
        self.total_debit() - self.total_credit()
    }

    /// Balanced means exact decimal equality. Amounts are discrete cents,
    /// so there is no epsilon here - a one-cent difference is a real defect.
    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }
}

// ============================================================================
// INVOICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Customer,
    Vendor,
}

impl InvoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::Customer => "customer",
            InvoiceKind::Vendor => "vendor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,

    pub kind: InvoiceKind,

    /// Invoice total amount
    pub total: Decimal,

    /// Remaining unpaid amount
    pub residual: Decimal,

    /// Lifecycle state as reported by the source (e.g. "posted", "draft")
    #[serde(default)]
    pub state: String,
}

// ============================================================================
// PRODUCTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    pub sku: String,

    pub standard_cost: Decimal,

    pub sale_price: Decimal,
}

// ============================================================================
// CHART OF ACCOUNTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Income => "income",
            AccountType::Expense => "expense",
            AccountType::Other => "other",
        }
    }
}

impl Default for AccountType {
    fn default() -> Self {
        AccountType::Other
    }
}

/// Chart-of-accounts entry. `deprecated` marks garbage accounts that must
/// not receive new entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub account_type: AccountType,
}

// ============================================================================
// POLYMORPHIC RECORD
// ============================================================================

/// Polymorphic financial record as returned by a Record Source.
///
/// Records are immutable snapshots - the engine never mutates source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum FinancialRecord {
    JournalEntry(JournalEntry),
    Invoice(Invoice),
    Product(Product),
    Account(Account),
}

impl FinancialRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            FinancialRecord::JournalEntry(_) => RecordKind::JournalEntry,
            FinancialRecord::Invoice(_) => RecordKind::Invoice,
            FinancialRecord::Product(_) => RecordKind::Product,
            FinancialRecord::Account(_) => RecordKind::Account,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            FinancialRecord::JournalEntry(e) => &e.id,
            FinancialRecord::Invoice(i) => &i.id,
            FinancialRecord::Product(p) => &p.id,
            FinancialRecord::Account(a) => &a.code,
        }
    }

    /// Check required fields and structural invariants.
    ///
    /// A failing record is "not applicable" to the rules - it is surfaced
    /// once as an INFO finding by the engine and skipped, never a crash.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            FinancialRecord::JournalEntry(entry) => {
                if entry.id.is_empty() {
                    return Err("journal entry has no id".to_string());
                }
                for (idx, line) in entry.lines.iter().enumerate() {
                    if line.account_code.is_empty() {
                        return Err(format!("line {} has no account code", idx + 1));
                    }
                    if !line.debit.is_zero() && !line.credit.is_zero() {
                        return Err(format!(
                            "line {} has both debit ({}) and credit ({}) set",
                            idx + 1,
                            line.debit,
                            line.credit
                        ));
                    }
                    if line.debit.is_sign_negative() || line.credit.is_sign_negative() {
                        return Err(format!("line {} has a negative amount", idx + 1));
                    }
                }
                Ok(())
            }
            FinancialRecord::Invoice(invoice) => {
                if invoice.id.is_empty() {
                    return Err("invoice has no id".to_string());
                }
                Ok(())
            }
            FinancialRecord::Product(product) => {
                if product.id.is_empty() {
                    return Err("product has no id".to_string());
                }
                if product.sku.is_empty() {
                    return Err(format!("product {} has no sku", product.id));
                }
                Ok(())
            }
            FinancialRecord::Account(account) => {
                if account.code.is_empty() {
                    return Err("account has no code".to_string());
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// RECORD SET
// ============================================================================

/// The validated, per-kind snapshot one evaluation run operates on.
///
/// Built once after the fetch step; rules see a complete, consistent
/// snapshot for the duration of the run.
#[derive(Debug, Default, Clone)]
pub struct RecordSet {
    pub journal_entries: Vec<JournalEntry>,
    pub invoices: Vec<Invoice>,
    pub products: Vec<Product>,
    pub accounts: Vec<Account>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: FinancialRecord) {
        match record {
            FinancialRecord::JournalEntry(e) => self.journal_entries.push(e),
            FinancialRecord::Invoice(i) => self.invoices.push(i),
            FinancialRecord::Product(p) => self.products.push(p),
            FinancialRecord::Account(a) => self.accounts.push(a),
        }
    }

    pub fn account(&self, code: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.code == code)
    }

    pub fn len(&self) -> usize {
        self.journal_entries.len() + self.invoices.len() + self.products.len() + self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(account: &str, debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            account_code: account.to_string(),
            debit,
            credit,
            currency: "EUR".to_string(),
        }
    }

    fn entry(id: &str, lines: Vec<JournalLine>) -> JournalEntry {
        JournalEntry {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            journal_ref: "MISC".to_string(),
            lines,
        }
    }

    #[test]
    fn test_entry_balance() {
        let e = entry(
            "JE1",
            vec![
                line("600", dec!(50.00), Decimal::ZERO),
                line("512", Decimal::ZERO, dec!(50.00)),
            ],
        );

        assert!(e.is_balanced());
        assert_eq!(e.total_debit(), dec!(50.00));
        assert_eq!(e.total_credit(), dec!(50.00));
        assert_eq!(e.imbalance(), Decimal::ZERO);
    }

    #[test]
    fn test_entry_imbalance_is_signed() {
        let e = entry(
            "JE2",
            vec![
                line("600", dec!(50.00), Decimal::ZERO),
                line("512", Decimal::ZERO, dec!(40.00)),
            ],
        );

        assert!(!e.is_balanced());
        assert_eq!(e.imbalance(), dec!(10.00));

        let e = entry(
            "JE3",
            vec![
                line("600", dec!(40.00), Decimal::ZERO),
                line("512", Decimal::ZERO, dec!(50.00)),
            ],
        );
        assert_eq!(e.imbalance(), dec!(-10.00));
    }

    #[test]
    fn test_exact_decimal_equality_no_rounding() {
        // Three cents split into sums that a float would not compare clean
        let e = entry(
            "JE4",
            vec![
                line("600", dec!(0.01), Decimal::ZERO),
                line("601", dec!(0.02), Decimal::ZERO),
                line("512", Decimal::ZERO, dec!(0.03)),
            ],
        );
        assert!(e.is_balanced());
    }

    #[test]
    fn test_mixed_debit_credit_line_is_malformed() {
        let e = entry("JE5", vec![line("600", dec!(10.00), dec!(10.00))]);
        let record = FinancialRecord::JournalEntry(e);

        let err = record.validate().unwrap_err();
        assert!(err.contains("both debit"));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let record = FinancialRecord::Invoice(Invoice {
            id: String::new(),
            kind: InvoiceKind::Vendor,
            total: dec!(100.00),
            residual: dec!(0.00),
            state: "posted".to_string(),
        });
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_record_set_lookup() {
        let mut set = RecordSet::new();
        set.insert(FinancialRecord::Account(Account {
            code: "600-GARBAGE".to_string(),
            name: "Old expense".to_string(),
            deprecated: true,
            account_type: AccountType::Expense,
        }));

        assert_eq!(set.len(), 1);
        assert!(set.account("600-GARBAGE").unwrap().deprecated);
        assert!(set.account("512").is_none());
    }

    #[test]
    fn test_record_json_round_trip_uses_string_amounts() {
        let record = FinancialRecord::Product(Product {
            id: "P1".to_string(),
            sku: "X1".to_string(),
            standard_cost: dec!(0.00),
            sale_price: dec!(25.00),
        });

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"record_type\":\"product\""));
        assert!(json.contains("\"25.00\""));

        let back: FinancialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}

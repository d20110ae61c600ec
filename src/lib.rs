// Ledger Watchdog - Core Library
// Exposes the control engine for the CLI, embedding, and tests

pub mod config;
pub mod engine;
pub mod findings;
pub mod records;
pub mod registry;
pub mod report;
pub mod rules;
pub mod source;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError, Mode};
pub use engine::{ControlEngine, FETCH_FAILED_RULE, MALFORMED_RECORD_RULE};
pub use findings::{Finding, Severity};
pub use records::{
    Account, AccountType, FinancialRecord, Invoice, InvoiceKind, JournalEntry, JournalLine,
    Product, RecordKind, RecordSet,
};
pub use registry::{RegistryError, RuleRegistry};
pub use report::{print_report, FileSink, ReportAssembler, TodoList};
pub use rules::{
    DeprecatedAccountUsage, InvoiceReceiptMismatch, Rule, RuleError, UnbalancedJournal,
    ZeroAmountEntry, ZeroCostItem,
};
pub use source::{ExportDirSource, FetchError, FetchFilter, MemorySource, RecordSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 🔌 Record Source - Capability boundary to the bookkeeping system
// One conforming backend per ERP export; pagination is backend-private

use crate::records::{Account, FinancialRecord, Invoice, JournalEntry, Product, RecordKind};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// FETCH CONTRACT
// ============================================================================

/// Filter applied by the source before returning records.
///
/// The original checks scanned entries from the first of the month; `since`
/// carries that window. Kinds without a date (accounts, products) ignore it.
#[derive(Debug, Clone, Default)]
pub struct FetchFilter {
    pub since: Option<NaiveDate>,
}

impl FetchFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn since(date: NaiveDate) -> Self {
        FetchFilter { since: Some(date) }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("record source unreachable for {kind}: {reason}")]
    Unreachable { kind: RecordKind, reason: String },

    #[error("malformed payload for {kind}: {reason}")]
    MalformedPayload { kind: RecordKind, reason: String },

    #[error("fetching {kind} exceeded the timeout of {timeout:?}")]
    Timeout { kind: RecordKind, timeout: Duration },
}

/// Supplies normalized financial records on demand.
///
/// Fetch failures must surface as a `FetchError`, never as records with
/// missing required fields. The engine turns a failed kind into a single
/// ERROR finding and keeps evaluating the remaining kinds.
pub trait RecordSource {
    fn fetch(&self, kind: RecordKind, filter: &FetchFilter)
        -> Result<Vec<FinancialRecord>, FetchError>;

    /// Backend name for logs and reports.
    fn name(&self) -> &str {
        "record-source"
    }
}

fn apply_filter(records: Vec<FinancialRecord>, filter: &FetchFilter) -> Vec<FinancialRecord> {
    match filter.since {
        None => records,
        Some(since) => records
            .into_iter()
            .filter(|r| match r {
                FinancialRecord::JournalEntry(e) => e.date >= since,
                _ => true,
            })
            .collect(),
    }
}

// ============================================================================
// MEMORY SOURCE
// ============================================================================

/// In-memory snapshot backend, used by tests and demo data.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: Vec<FinancialRecord>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<FinancialRecord>) -> Self {
        MemorySource { records }
    }

    pub fn push(&mut self, record: FinancialRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for MemorySource {
    fn fetch(
        &self,
        kind: RecordKind,
        filter: &FetchFilter,
    ) -> Result<Vec<FinancialRecord>, FetchError> {
        let matching: Vec<FinancialRecord> = self
            .records
            .iter()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect();

        debug!(kind = %kind, count = matching.len(), "memory fetch");
        Ok(apply_filter(matching, filter))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// EXPORT DIRECTORY SOURCE
// ============================================================================

/// Reads per-kind JSON export files (`journal_entries.json`, ...) from a
/// directory - the thin stand-in for a live ERP connector. The timeout is
/// an elapsed-time budget per fetch; exceeding it is reported the same way
/// an unreachable backend would be.
pub struct ExportDirSource {
    dir: PathBuf,
    timeout: Duration,
}

impl ExportDirSource {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        ExportDirSource {
            dir: dir.into(),
            timeout,
        }
    }

    fn read_kind(&self, kind: RecordKind, path: &Path) -> Result<Vec<FinancialRecord>, FetchError> {
        let payload = fs::read_to_string(path).map_err(|e| FetchError::Unreachable {
            kind,
            reason: format!("{}: {}", path.display(), e),
        })?;

        let decode = |reason: serde_json::Error| FetchError::MalformedPayload {
            kind,
            reason: reason.to_string(),
        };

        // Each export file holds a flat array of one record kind.
        let records = match kind {
            RecordKind::JournalEntry => serde_json::from_str::<Vec<JournalEntry>>(&payload)
                .map_err(decode)?
                .into_iter()
                .map(FinancialRecord::JournalEntry)
                .collect(),
            RecordKind::Invoice => serde_json::from_str::<Vec<Invoice>>(&payload)
                .map_err(decode)?
                .into_iter()
                .map(FinancialRecord::Invoice)
                .collect(),
            RecordKind::Product => serde_json::from_str::<Vec<Product>>(&payload)
                .map_err(decode)?
                .into_iter()
                .map(FinancialRecord::Product)
                .collect(),
            RecordKind::Account => serde_json::from_str::<Vec<Account>>(&payload)
                .map_err(decode)?
                .into_iter()
                .map(FinancialRecord::Account)
                .collect(),
        };

        Ok(records)
    }
}

impl RecordSource for ExportDirSource {
    fn fetch(
        &self,
        kind: RecordKind,
        filter: &FetchFilter,
    ) -> Result<Vec<FinancialRecord>, FetchError> {
        let started = Instant::now();
        let path = self.dir.join(kind.export_file_name());

        let records = self.read_kind(kind, &path)?;

        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            warn!(kind = %kind, ?elapsed, "export read exceeded fetch timeout");
            return Err(FetchError::Timeout {
                kind,
                timeout: self.timeout,
            });
        }

        debug!(kind = %kind, count = records.len(), path = %path.display(), "export fetch");
        Ok(apply_filter(records, filter))
    }

    fn name(&self) -> &str {
        "export-dir"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{InvoiceKind, JournalLine};
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn sample_entry(id: &str, date: NaiveDate) -> FinancialRecord {
        FinancialRecord::JournalEntry(JournalEntry {
            id: id.to_string(),
            date,
            journal_ref: "BANK".to_string(),
            lines: vec![JournalLine {
                account_code: "512".to_string(),
                debit: dec!(10.00),
                credit: dec!(0.00),
                currency: "EUR".to_string(),
            }],
        })
    }

    #[test]
    fn test_memory_source_filters_by_kind() {
        let source = MemorySource::from_records(vec![
            sample_entry("JE1", NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            FinancialRecord::Invoice(Invoice {
                id: "INV1".to_string(),
                kind: InvoiceKind::Customer,
                total: dec!(100.00),
                residual: dec!(0.00),
                state: "posted".to_string(),
            }),
        ]);

        let entries = source
            .fetch(RecordKind::JournalEntry, &FetchFilter::none())
            .unwrap();
        assert_eq!(entries.len(), 1);

        let products = source.fetch(RecordKind::Product, &FetchFilter::none()).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_since_filter_applies_to_entries_only() {
        let source = MemorySource::from_records(vec![
            sample_entry("JE_OLD", NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
            sample_entry("JE_NEW", NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()),
            FinancialRecord::Product(Product {
                id: "P1".to_string(),
                sku: "X1".to_string(),
                standard_cost: dec!(1.00),
                sale_price: dec!(2.00),
            }),
        ]);

        let filter = FetchFilter::since(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let entries = source.fetch(RecordKind::JournalEntry, &filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record_id(), "JE_NEW");

        // Dateless kinds are unaffected by the window
        let products = source.fetch(RecordKind::Product, &filter).unwrap();
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn test_export_dir_source_reads_kind_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoices.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"[{{"id": "INV1", "kind": "vendor", "total": "100.00", "residual": "150.00", "state": "posted"}}]"#
        )
        .unwrap();

        let source = ExportDirSource::new(dir.path(), Duration::from_secs(5));
        let records = source.fetch(RecordKind::Invoice, &FetchFilter::none()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id(), "INV1");
        match &records[0] {
            FinancialRecord::Invoice(inv) => assert_eq!(inv.residual, dec!(150.00)),
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_export_dir_missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let source = ExportDirSource::new(dir.path(), Duration::from_secs(5));

        let err = source
            .fetch(RecordKind::Account, &FetchFilter::none())
            .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable { kind, .. } if kind == RecordKind::Account));
    }

    #[test]
    fn test_export_dir_bad_json_is_malformed_payload() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("products.json"), "{not json").unwrap();

        let source = ExportDirSource::new(dir.path(), Duration::from_secs(5));
        let err = source
            .fetch(RecordKind::Product, &FetchFilter::none())
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload { .. }));
    }
}

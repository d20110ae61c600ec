// ⚙️ Evaluation Engine - Fetch, evaluate, deduplicate, sort
// One batch fetch per record kind; partial-failure isolation throughout

use crate::findings::{Finding, Severity};
use crate::records::{RecordKind, RecordSet};
use crate::registry::RuleRegistry;
use crate::report::{ReportAssembler, TodoList};
use crate::source::{FetchFilter, RecordSource};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Rule id attached to fetch-failure findings
pub const FETCH_FAILED_RULE: &str = "fetch_failed";

/// Rule id attached to malformed-record findings
pub const MALFORMED_RECORD_RULE: &str = "malformed_record";

/// Record id used by diagnostic findings that cover a whole record type
pub const WHOLE_TYPE_RECORD_ID: &str = "*";

// ============================================================================
// CONTROL ENGINE
// ============================================================================

/// Runs every active rule against a fetched record snapshot and produces
/// the severity-sorted Finance To-Do List.
///
/// `run` is total: fetch failures, failing rules, and malformed records all
/// degrade into diagnostic findings. The engine is stateless between runs
/// apart from the registry configured at startup.
pub struct ControlEngine {
    registry: RuleRegistry,
    filter: FetchFilter,
}

impl ControlEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        ControlEngine {
            registry,
            filter: FetchFilter::none(),
        }
    }

    /// Restrict fetches to a date window (e.g. first of the month).
    pub fn with_filter(mut self, filter: FetchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// One evaluation run: always returns a TodoList, possibly containing
    /// only diagnostic findings.
    pub fn run(&self, source: &dyn RecordSource) -> TodoList {
        info!(source = source.name(), rules = self.registry.active_count(), "control run started");

        let (snapshot, mut findings) = self.fetch_snapshot(source);

        for rule in self.registry.active() {
            match rule.evaluate(&snapshot) {
                Ok(mut rule_findings) => findings.append(&mut rule_findings),
                Err(e) => {
                    // A faulty rule must not abort the run.
                    warn!(rule = rule.id(), error = %e, "rule evaluation failed");
                    let kind = rule
                        .consumes()
                        .first()
                        .copied()
                        .unwrap_or(RecordKind::JournalEntry);
                    findings.push(Finding::new(
                        Severity::Info,
                        rule.id(),
                        format!("Check could not be evaluated: {}", e),
                        kind,
                        WHOLE_TYPE_RECORD_ID,
                    ));
                }
            }
        }

        // A record re-fetched across a retried batch must not produce
        // duplicate findings.
        let mut seen = HashSet::new();
        findings.retain(|f| seen.insert(f.fingerprint()));

        findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let todo = ReportAssembler::new().assemble(findings);
        info!(issues = todo.total(), "control run finished: {}", todo.summary());
        todo
    }

    /// Kinds needed by at least one active rule, in declaration order.
    fn consumed_kinds(&self) -> Vec<RecordKind> {
        let mut kinds = Vec::new();
        for rule in self.registry.active() {
            for kind in rule.consumes() {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
        }
        kinds
    }

    /// Batch fetch per kind, validate each record, collect diagnostics.
    ///
    /// A failed kind yields a single ERROR finding and an empty slot in the
    /// snapshot; a malformed record yields a single INFO finding and is
    /// skipped, leaving its siblings evaluated.
    fn fetch_snapshot(&self, source: &dyn RecordSource) -> (RecordSet, Vec<Finding>) {
        let mut snapshot = RecordSet::new();
        let mut findings = Vec::new();

        for kind in self.consumed_kinds() {
            let records = match source.fetch(kind, &self.filter) {
                Ok(records) => records,
                Err(e) => {
                    error!(kind = %kind, error = %e, "fetch failed");
                    findings.push(Finding::new(
                        Severity::Error,
                        FETCH_FAILED_RULE,
                        format!("Could not fetch {}: {}", kind, e),
                        kind,
                        WHOLE_TYPE_RECORD_ID,
                    ));
                    continue;
                }
            };

            for record in records {
                match record.validate() {
                    Ok(()) => snapshot.insert(record),
                    Err(reason) => {
                        let record_id = if record.record_id().is_empty() {
                            "?".to_string()
                        } else {
                            record.record_id().to_string()
                        };
                        findings.push(Finding::new(
                            Severity::Info,
                            MALFORMED_RECORD_RULE,
                            format!("Skipped malformed {}: {}", kind, reason),
                            kind,
                            record_id,
                        ));
                    }
                }
            }
        }

        (snapshot, findings)
    }
}

// ============================================================================
// TESTS
// ============================================================================

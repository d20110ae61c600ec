// 📋 Report Assembly - Severity-grouped Finance To-Do List
// Render-agnostic structure; sinks serialize it without re-deriving order

use crate::findings::{Finding, Severity};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// TODO LIST
// ============================================================================

/// The report of one evaluation run. Immutable after assembly.
///
/// Findings keep the engine's order: severity, then rule, then record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoList {
    pub run_id: Uuid,

    /// Creation timestamp, also used for report file naming
    pub generated_at: DateTime<Utc>,

    pub findings: Vec<Finding>,
}

impl TodoList {
    pub fn total(&self) -> usize {
        self.findings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect()
    }

    pub fn errors(&self) -> Vec<&Finding> {
        self.by_severity(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&Finding> {
        self.by_severity(Severity::Warning)
    }

    pub fn infos(&self) -> Vec<&Finding> {
        self.by_severity(Severity::Info)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} issues: {} errors, {} warnings, {} info",
            self.total(),
            self.errors().len(),
            self.warnings().len(),
            self.infos().len()
        )
    }

    /// Human-readable console form, grouped by severity with a symbol per
    /// group. Keeps the engine's ordering within each group.
    pub fn render_text(&self) -> String {
        if self.is_clean() {
            return "✓ No issues detected. All checks passed.".to_string();
        }

        let mut out = Vec::new();
        out.push("=".repeat(60));
        out.push("FINANCE TO-DO LIST".to_string());
        out.push(format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push(format!("Total Issues: {}", self.total()));
        out.push("=".repeat(60));
        out.push(String::new());

        let groups = [
            (Severity::Error, "ERRORS (Must Fix)"),
            (Severity::Warning, "WARNINGS (Should Review)"),
            (Severity::Info, "INFO"),
        ];

        for (severity, title) in groups {
            let findings = self.by_severity(severity);
            if findings.is_empty() {
                continue;
            }

            out.push(format!("{} {}", severity.symbol(), title));
            out.push("-".repeat(60));
            for (idx, finding) in findings.iter().enumerate() {
                out.push(format!("{}. [{}] {}", idx + 1, finding.rule_id, finding.message));
                out.push(format!(
                    "   Record: {} {}",
                    finding.record_type, finding.record_id
                ));
                out.push(String::new());
            }
        }

        out.join("\n")
    }

    /// Machine-readable form of the same structure.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize todo list")
    }
}

// ============================================================================
// REPORT ASSEMBLER
// ============================================================================

/// Groups sorted findings into a TodoList. Performs no I/O.
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn new() -> Self {
        ReportAssembler
    }

    /// The findings are expected in engine order (severity, rule, record);
    /// assembly stamps identity and time, it does not reorder.
    pub fn assemble(&self, findings: Vec<Finding>) -> TodoList {
        TodoList {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            findings,
        }
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FILE SINK
// ============================================================================

/// Persists a TodoList as a timestamped text artifact. No business logic -
/// just a serializer over the immutable structure.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSink { dir: dir.into() }
    }

    pub fn write(&self, todo: &TodoList) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create reports dir {:?}", self.dir))?;

        let path = self.report_path(todo);
        fs::write(&path, todo.render_text())
            .with_context(|| format!("Failed to write report {:?}", path))?;

        info!(path = %path.display(), "report written");
        Ok(path)
    }

    fn report_path(&self, todo: &TodoList) -> PathBuf {
        let name = format!("todo_{}.txt", todo.generated_at.format("%Y%m%d_%H%M%S"));
        self.dir.join(name)
    }
}

/// Console sink: renders the grouped report to stdout.
pub fn print_report(todo: &TodoList) {
    println!("{}", todo.render_text());
}

// ============================================================================
// TESTS
// ============================================================================

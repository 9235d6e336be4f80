//! JSONL audit logging for claude-reconcile
//!
//! Records each run's summary and every proposed change to a JSONL file
//! for later analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::report::{PlanRecord, ReconcileReport};

/// Kind of audit entry
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Summary,
    Proposal,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Timestamp of the run
    pub timestamp: DateTime<Utc>,

    /// Entry kind (SUMMARY, PROPOSAL)
    pub kind: EntryKind,

    /// Rule count seen this run (summary entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<usize>,

    /// Finding / conflict / candidate counts (summary entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<usize>,

    /// The proposed change (proposal entries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<PlanRecord>,
}

impl AuditEntry {
    /// Summary entry for one reconciliation run
    pub fn summary(rule_count: usize, report: &ReconcileReport) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: EntryKind::Summary,
            rules: Some(rule_count),
            findings: Some(report.findings.len()),
            conflicts: Some(report.conflicts.len()),
            candidates: Some(report.candidates.len()),
            proposal: None,
        }
    }

    /// One entry per plan record
    pub fn proposal(record: &PlanRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: EntryKind::Proposal,
            rules: None,
            findings: None,
            conflicts: None,
            candidates: None,
            proposal: Some(record.clone()),
        }
    }
}

/// Audit logger
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            // Ensure parent directory exists
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
                .map(BufWriter::new)
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Log one run: a summary entry plus an entry per plan record
    pub fn log_report(
        &mut self,
        rule_count: usize,
        report: &ReconcileReport,
    ) -> Result<(), std::io::Error> {
        self.log(&AuditEntry::summary(rule_count, report))?;
        for record in &report.plan {
            self.log(&AuditEntry::proposal(record))?;
        }
        Ok(())
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}

/// Create a disabled logger (for when audit logging is off)
impl Default for AuditLogger {
    fn default() -> Self {
        Self { writer: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Reconciler;
    use crate::input::ReconcileInput;
    use tempfile::NamedTempFile;

    fn test_report() -> ReconcileReport {
        let input = ReconcileInput::from_json(
            r#"{"project_shared": {"allow": ["Bash(git diff)", "Bash(git diff --stat)"]}}"#,
        )
        .unwrap();
        Reconciler::new(Config::default()).reconcile(&input)
    }

    #[test]
    fn test_summary_entry() {
        let report = test_report();
        let entry = AuditEntry::summary(2, &report);
        assert!(matches!(entry.kind, EntryKind::Summary));
        assert_eq!(entry.rules, Some(2));
        assert_eq!(entry.candidates, Some(1));
    }

    #[test]
    fn test_audit_logger_write() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path();

        let mut logger = AuditLogger::new(Some(path));
        assert!(logger.is_enabled());

        let report = test_report();
        logger.log_report(2, &report).unwrap();

        // Read back and verify
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("SUMMARY"));
        assert!(content.contains("PROPOSAL"));
        assert!(content.contains("Bash(git diff *)"));
    }

    #[test]
    fn test_audit_logger_disabled() {
        let mut logger = AuditLogger::default();
        assert!(!logger.is_enabled());

        let report = test_report();
        // Should not error even when disabled
        logger.log_report(2, &report).unwrap();
    }
}

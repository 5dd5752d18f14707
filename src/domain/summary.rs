//! Aggregate results of a run over a document tree.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::document::{DocumentReport, Outcome, RewriteStats};

/// Totals for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Root directory that was walked
    pub root: PathBuf,

    /// Whether writes were suppressed
    pub dry_run: bool,

    /// Documents updated
    pub updated: usize,

    /// Documents left untouched
    pub skipped: usize,

    /// Documents that failed (lenient runs)
    pub failed: usize,

    /// Rewrite counts across all documents
    pub stats: RewriteStats,

    /// Per-document reports, in walk order
    pub documents: Vec<DocumentReport>,
}

impl RunSummary {
    /// Start an empty summary for a root
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self {
            root,
            dry_run,
            ..Default::default()
        }
    }

    /// Record a document report
    pub fn record(&mut self, report: DocumentReport) {
        match report.outcome {
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
        self.stats.merge(&report.stats);
        self.documents.push(report);
    }

    /// Number of documents seen
    pub fn total(&self) -> usize {
        self.documents.len()
    }

    /// True when no document failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: Outcome, localized: usize) -> DocumentReport {
        DocumentReport {
            path: PathBuf::from("doc.md"),
            outcome,
            stats: RewriteStats {
                references: localized,
                localized,
                ..Default::default()
            },
            error: None,
        }
    }

    #[test]
    fn test_record_counts_outcomes() {
        let mut summary = RunSummary::new(PathBuf::from("/docs"), false);
        summary.record(report(Outcome::Updated, 2));
        summary.record(report(Outcome::Skipped, 0));
        summary.record(report(Outcome::Failed, 0));

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.stats.localized, 2);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_summary_serializes_outcomes_snake_case() {
        let mut summary = RunSummary::new(PathBuf::from("/docs"), true);
        summary.record(report(Outcome::Updated, 1));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["documents"][0]["outcome"], "updated");
        assert!(json["documents"][0].get("error").is_none());
    }
}

use crate::domain::model::{ImportOutcome, OutcomeKind};
use std::fmt;

/// A candidate that was rejected or failed to store, by 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    pub position: usize,
    pub kind: OutcomeKind,
    pub detail: String,
}

/// Outcome counts for one import pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    inserted: usize,
    skipped_duplicate: usize,
    rejected: usize,
    store_errors: usize,
    issues: Vec<ImportIssue>,
}

impl ImportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &ImportOutcome) {
        let position = self.total() + 1;
        match outcome {
            ImportOutcome::Inserted { .. } => self.inserted += 1,
            ImportOutcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            ImportOutcome::Rejected(reason) => {
                self.rejected += 1;
                self.issues.push(ImportIssue {
                    position,
                    kind: OutcomeKind::Rejected,
                    detail: reason.to_string(),
                });
            }
            ImportOutcome::StoreError(reason) => {
                self.store_errors += 1;
                self.issues.push(ImportIssue {
                    position,
                    kind: OutcomeKind::StoreError,
                    detail: reason.clone(),
                });
            }
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.skipped_duplicate + self.rejected + self.store_errors
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Inserted => self.inserted,
            OutcomeKind::SkippedDuplicate => self.skipped_duplicate,
            OutcomeKind::Rejected => self.rejected,
            OutcomeKind::StoreError => self.store_errors,
        }
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn skipped_duplicate(&self) -> usize {
        self.skipped_duplicate
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn store_errors(&self) -> usize {
        self.store_errors
    }

    pub fn issues(&self) -> &[ImportIssue] {
        &self.issues
    }

    /// Fixed labels in fixed order; zero counts are always shown.
    pub fn render(&self) -> String {
        let rows = [
            ("Total attempted:", self.total()),
            ("Inserted:", self.inserted),
            ("Skipped (duplicate):", self.skipped_duplicate),
            ("Rejected:", self.rejected),
            ("Store errors:", self.store_errors),
        ];

        let mut out = String::from("--- Import Summary ---\n");
        for (label, count) in rows {
            out.push_str(&format!("{:<22}{}\n", label, count));
        }
        out
    }

    pub fn render_issues(&self) -> String {
        if self.issues.is_empty() {
            return "No rejected or failed records.\n".to_string();
        }

        let mut out = String::from("--- Issues ---\n");
        for issue in &self.issues {
            let label = match issue.kind {
                OutcomeKind::Rejected => "rejected",
                _ => "store error",
            };
            out.push_str(&format!("#{:<5} {:<12} {}\n", issue.position, label, issue.detail));
        }
        out
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

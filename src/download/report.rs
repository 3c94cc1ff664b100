//! Download report types.
//!
//! A download is a best-effort sweep over a package's resources. Instead of
//! aborting on the first problem, every resource gets an outcome and the
//! caller inspects the resulting [`DownloadReport`].

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Result of a package download.
#[derive(Clone, Debug)]
pub enum DownloadStatus {
    /// The package has no resources; nothing was written.
    NoResources,
    /// Metadata was written and every resource was swept.
    Completed(DownloadReport),
}

/// Per-resource account of a package download.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DownloadReport {
    pub package: String,
    pub destination: PathBuf,
    /// Where the canonical metadata was written.
    pub metadata_path: PathBuf,
    pub resources: Vec<ResourceReport>,
}

impl DownloadReport {
    pub fn new(package: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, report: ResourceReport) {
        self.resources.push(report);
    }

    pub fn retrieved_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Retrieved { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Skipped))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Failed { .. }))
    }

    pub fn unhandled_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Unhandled))
    }

    /// Returns true if no selected resource failed or went unhandled.
    pub fn is_complete(&self) -> bool {
        self.failed_count() == 0 && self.unhandled_count() == 0
    }

    fn count(&self, predicate: impl Fn(&ResourceOutcome) -> bool) -> usize {
        self.resources
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Downloaded package '{}' to {}",
            self.package,
            self.destination.display()
        )?;
        writeln!(
            f,
            "  {} retrieved, {} skipped, {} failed, {} unhandled",
            self.retrieved_count(),
            self.skipped_count(),
            self.failed_count(),
            self.unhandled_count()
        )?;

        for report in &self.resources {
            writeln!(f, "  [{}] {}", report.ordinal, report)?;
        }

        Ok(())
    }
}

/// Outcome for one resource, keyed by its ordinal position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub ordinal: usize,
    pub url: String,
    pub outcome: ResourceOutcome,
}

impl fmt::Display for ResourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ResourceOutcome::Skipped => write!(f, "skipped {}", self.url),
            ResourceOutcome::Retrieved { strategy, path } => {
                write!(f, "retrieved {} -> {} ({strategy})", self.url, path.display())
            }
            ResourceOutcome::Failed { strategy, message } => {
                write!(f, "failed {} ({strategy}): {message}", self.url)
            }
            ResourceOutcome::Unhandled => write!(f, "unhandled {}", self.url),
        }
    }
}

/// What happened to a single resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceOutcome {
    /// Rejected by the filter.
    Skipped,
    /// Claimed by `strategy` and written to `path`.
    Retrieved { strategy: String, path: PathBuf },
    /// Claimed by `strategy`, whose transfer failed.
    Failed { strategy: String, message: String },
    /// Every strategy declined it.
    Unhandled,
}

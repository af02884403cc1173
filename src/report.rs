use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Not a regular file, or not a .png/.jpg/.jpeg.
    Unsupported,
    /// Could not be opened or decoded; carries the underlying error.
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub file: String,
    /// The unique image it matched.
    pub of: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub file: String,
    pub reason: SkipReason,
}

/// What happened to one directory entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Kept(String),
    Duplicate(DuplicateRecord),
    Skipped(SkippedRecord),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    pub timestamp: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub threshold: f64,
    pub dry_run: bool,
    pub kept: Vec<String>,
    pub duplicates: Vec<DuplicateRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl DedupReport {
    pub fn new(source: PathBuf, output: PathBuf, threshold: f64, dry_run: bool) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            source,
            output,
            threshold,
            dry_run,
            kept: Vec::new(),
            duplicates: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Kept(file) => self.kept.push(file),
            FileOutcome::Duplicate(record) => self.duplicates.push(record),
            FileOutcome::Skipped(record) => self.skipped.push(record),
        }
    }

    pub fn removed_count(&self) -> usize {
        self.duplicates.len()
    }

    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    /// The two closing lines printed after a run.
    pub fn summary(&self) -> [String; 2] {
        [
            format!("Removed {} duplicate image(s)", self.removed_count()),
            format!(
                "Kept {} unique image(s) in {}",
                self.kept_count(),
                self.output.display()
            ),
        ]
    }
}

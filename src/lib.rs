//! Folder-level image deduplication by change detection.
//!
//! Each image is resized to a common frame, turned into a masked grayscale
//! [`Frame`](crate::core::Frame), and compared against every image kept so
//! far. Images whose difference score stays at or below the threshold are
//! treated as duplicates; the rest are copied into an output folder.

pub mod core;
pub mod dedup;
pub mod report;
pub mod scanner;

pub use crate::core::{BorderSpec, Comparison, Frame, PreprocessSettings, compare_frames};
pub use crate::dedup::{DedupConfig, DedupError, Deduplicator};
pub use crate::report::DedupReport;

use crate::core::compare::{CompareError, compare_frames};
use crate::core::preprocess::{Frame, PreprocessError, PreprocessSettings, preprocess};
use crate::core::resize::resize_area;
use crate::report::{DedupReport, DuplicateRecord, FileOutcome, SkipReason, SkippedRecord};
use crate::scanner::{self, Entry};
use image::{DynamicImage, ImageReader};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_FRAME_SIZE: (u32, u32) = (640, 480);
pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 500.0;
pub const DEFAULT_OUTPUT_DIR: &str = "unique_images";

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory listing failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Comparison failed: {0}")]
    Compare(#[from] CompareError),
}

impl DedupError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        DedupError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// A candidate is a duplicate when its score against a kept image is at
    /// or below this value.
    pub threshold: f64,
    /// Every image is resized to this before preprocessing.
    pub frame_size: (u32, u32),
    pub min_contour_area: f64,
    pub preprocess: PreprocessSettings,
    /// Folder created inside the input folder for the unique copies.
    pub output_dir_name: String,
    /// Classify only; create and copy nothing.
    pub dry_run: bool,
}

impl DedupConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            frame_size: DEFAULT_FRAME_SIZE,
            min_contour_area: DEFAULT_MIN_CONTOUR_AREA,
            preprocess: PreprocessSettings::default(),
            output_dir_name: DEFAULT_OUTPUT_DIR.to_string(),
            dry_run: false,
        }
    }

    pub fn validate(&self) -> Result<(), DedupError> {
        self.preprocess.validate()?;
        if self.threshold.is_nan() {
            return Err(DedupError::Config("threshold must be a number".to_string()));
        }
        if self.min_contour_area.is_nan() || self.min_contour_area < 0.0 {
            return Err(DedupError::Config(format!(
                "minimum contour area must be non-negative, got {}",
                self.min_contour_area
            )));
        }
        if self.frame_size.0 == 0 || self.frame_size.1 == 0 {
            return Err(DedupError::Config(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_size.0, self.frame_size.1
            )));
        }
        let mut components = Path::new(&self.output_dir_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(DedupError::Config(format!(
                "output folder name must be a single path component, got {:?}",
                self.output_dir_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UniqueEntry {
    pub frame: Frame,
    pub file_name: String,
}

/// Frames accepted so far in one run, in acceptance order. Append-only.
#[derive(Debug, Default)]
pub struct UniqueSet {
    entries: Vec<UniqueEntry>,
}

impl UniqueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame, file_name: String) {
        self.entries.push(UniqueEntry { frame, file_name });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UniqueEntry> {
        self.entries.iter()
    }

    /// First entry, in insertion order, whose score against `frame` is at or
    /// below `threshold`, together with that score.
    pub fn find_match(
        &self,
        frame: &Frame,
        min_contour_area: f64,
        threshold: f64,
    ) -> Result<Option<(&UniqueEntry, f64)>, CompareError> {
        for entry in &self.entries {
            let comparison = compare_frames(&entry.frame, frame, min_contour_area)?;
            log::debug!(
                "score {:.1} against {} ({} contour(s))",
                comparison.score,
                entry.file_name,
                comparison.contours.len()
            );
            if comparison.score <= threshold {
                return Ok(Some((entry, comparison.score)));
            }
        }
        Ok(None)
    }
}

/// Open and decode an image, trusting its content over its extension.
pub fn load_image(path: &Path) -> Result<DynamicImage, image::ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Resize to the configured frame size and preprocess.
pub fn prepare_frame(
    image: &DynamicImage,
    config: &DedupConfig,
) -> Result<Frame, PreprocessError> {
    let (width, height) = config.frame_size;
    let resized = resize_area(&image.to_rgb8(), width, height);
    preprocess(&DynamicImage::ImageRgb8(resized), &config.preprocess)
}

/// Classify one candidate image against `unique`, appending it and copying it
/// into `output_dir` when nothing matches.
pub fn step(
    unique: &mut UniqueSet,
    path: &Path,
    config: &DedupConfig,
    output_dir: &Path,
) -> Result<FileOutcome, DedupError> {
    let file_name = display_name(path);

    let image = match load_image(path) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("Failed to decode {}: {}", file_name, e);
            return Ok(FileOutcome::Skipped(SkippedRecord {
                file: file_name,
                reason: SkipReason::Decode(e.to_string()),
            }));
        }
    };
    let frame = prepare_frame(&image, config)?;

    let matched = unique.find_match(&frame, config.min_contour_area, config.threshold)?;
    if let Some((entry, score)) = matched {
        log::info!("{} duplicates {} (score {:.1})", file_name, entry.file_name, score);
        return Ok(FileOutcome::Duplicate(DuplicateRecord {
            file: file_name,
            of: entry.file_name.clone(),
            score,
        }));
    }

    if !config.dry_run {
        let dest = output_dir.join(path.file_name().unwrap_or_default());
        fs::copy(path, &dest).map_err(|e| DedupError::io(&dest, e))?;
    }
    log::info!("Keeping {}", file_name);
    unique.push(frame, file_name.clone());
    Ok(FileOutcome::Kept(file_name))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

pub struct Deduplicator {
    config: DedupConfig,
    progress: ProgressBar,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Result<Self, DedupError> {
        config.validate()?;
        Ok(Self {
            config,
            progress: ProgressBar::hidden(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Run one pass over `folder`. Decode failures and unsupported entries are
    /// recorded and skipped; filesystem and comparison errors end the run, and
    /// copies made before that point stay where they are.
    pub fn run(&self, folder: &Path) -> Result<DedupReport, DedupError> {
        if !folder.is_dir() {
            return Err(DedupError::InvalidPath {
                path: format!("{} is not a directory", folder.display()),
            });
        }

        let output_dir: PathBuf = folder.join(&self.config.output_dir_name);
        if !self.config.dry_run {
            fs::create_dir_all(&output_dir).map_err(|e| DedupError::io(&output_dir, e))?;
        }

        let entries = scanner::list_entries(folder, Some(&output_dir))?;
        self.progress.set_length(entries.len() as u64);

        let mut report = DedupReport::new(
            folder.to_path_buf(),
            output_dir.clone(),
            self.config.threshold,
            self.config.dry_run,
        );
        let mut unique = UniqueSet::new();

        for entry in entries {
            let name = display_name(entry.path());
            self.progress.set_message(name.clone());

            let outcome = match entry {
                Entry::Unsupported(path) => {
                    log::info!("Skipping {}: not a supported image file", path.display());
                    FileOutcome::Skipped(SkippedRecord {
                        file: name,
                        reason: SkipReason::Unsupported,
                    })
                }
                Entry::Image(path) => step(&mut unique, &path, &self.config, &output_dir)?,
            };
            report.record(outcome);
            self.progress.inc(1);
        }
        self.progress.finish_with_message("Deduplication complete");

        for line in report.summary() {
            log::info!("{}", line);
        }
        Ok(report)
    }
}

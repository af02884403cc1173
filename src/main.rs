use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dedupr::core::{BorderSpec, PreprocessSettings, compare_frames};
use dedupr::dedup::{self, DEFAULT_MIN_CONTOUR_AREA, DEFAULT_OUTPUT_DIR, DedupConfig, Deduplicator};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "dedupr", version, about = "Copy visually unique images out of a folder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy every non-duplicate image into `<dir>/unique_images`
    Dedupe {
        /// Directory to deduplicate
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,
        /// Images scoring at or below this against a kept image are duplicates
        #[arg(short, long, allow_negative_numbers = true)]
        threshold: f64,
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Name of the output folder created inside `<dir>`
        #[arg(long, value_name = "NAME", default_value = DEFAULT_OUTPUT_DIR)]
        output_name: String,
        /// Only show what would be kept
        #[arg(long)]
        dry_run: bool,
        /// Write the run report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Score the difference between two images
    Compare {
        #[arg(long, value_name = "FILE")]
        left: PathBuf,
        #[arg(long, value_name = "FILE")]
        right: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Save the dilated change mask as an image
        #[arg(long, value_name = "FILE")]
        mask_out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Contours smaller than this (in pixels) are ignored
    #[arg(long, default_value_t = DEFAULT_MIN_CONTOUR_AREA)]
    min_area: f64,
    /// Comparison frame width
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Comparison frame height
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Odd Gaussian kernel size; repeat for several passes
    #[arg(long = "blur", value_name = "K")]
    blur_kernels: Vec<u32>,
    /// Border percentages to ignore: left,top,right,bottom
    #[arg(long, value_name = "L,T,R,B", default_value = "5,10,5,0")]
    border: BorderSpec,
}

impl PipelineArgs {
    fn into_config(self, threshold: f64) -> DedupConfig {
        let mut config = DedupConfig::new(threshold);
        config.min_contour_area = self.min_area;
        config.frame_size = (self.width, self.height);
        config.preprocess = PreprocessSettings {
            blur_kernels: self.blur_kernels,
            border: self.border,
        };
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Dedupe {
            path,
            threshold,
            pipeline,
            output_name,
            dry_run,
            report,
        } => {
            println!("▶ Deduplicating images in: {}", path.display());
            let mut config = pipeline.into_config(threshold);
            config.output_dir_name = output_name;
            config.dry_run = dry_run;

            let progress = ProgressBar::new(0);
            progress.set_style(ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?);
            progress.enable_steady_tick(Duration::from_millis(100));

            let deduplicator = Deduplicator::new(config)?.with_progress(progress);
            let result = benchmark("deduplication", || deduplicator.run(&path))
                .with_context(|| format!("Failed to deduplicate {}", path.display()))?;

            if dry_run {
                println!("\n⚠️  Dry-run only; no files were copied.");
            }
            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                fs::write(&report_path, json).with_context(|| {
                    format!("Failed to write report {}", report_path.display())
                })?;
                println!("✅ Wrote report to {}", report_path.display());
            }
        }

        Commands::Compare {
            left,
            right,
            pipeline,
            mask_out,
        } => {
            let config = pipeline.into_config(0.0);
            config.validate()?;

            let left_frame = load_frame(&left, &config)?;
            let right_frame = load_frame(&right, &config)?;
            let comparison = compare_frames(&left_frame, &right_frame, config.min_contour_area)?;

            println!("▶ {} vs {}", left.display(), right.display());
            println!("   score:    {:.1}", comparison.score);
            println!("   contours: {}", comparison.contours.len());
            for (i, contour) in comparison.contours.iter().enumerate() {
                println!(
                    "   [{}] area {:.1} ({} points)",
                    i,
                    contour.area,
                    contour.points.len()
                );
            }

            if let Some(mask_path) = mask_out {
                comparison
                    .mask
                    .save(&mask_path)
                    .with_context(|| format!("Failed to save mask {}", mask_path.display()))?;
                println!("✅ Saved change mask to {}", mask_path.display());
            }
        }
    }

    Ok(())
}

fn load_frame(path: &Path, config: &DedupConfig) -> Result<dedupr::Frame> {
    let image = dedup::load_image(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    let frame = dedup::prepare_frame(&image, config)
        .with_context(|| format!("Failed to preprocess {}", path.display()))?;
    Ok(frame)
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}

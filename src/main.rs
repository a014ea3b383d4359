use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use geo_backfill::{
    ExifGeotagWriter, ExifTagReader, GeotagConfig, Geotagger, GpsFilter, LogObserver, PhotoCatalog,
    ProgressEvent, ProgressObserver, RunState, RunSummary, DEFAULT_MAX_DIFF_DAYS,
};

#[derive(Parser)]
#[command(name = "geo-backfill")]
#[command(version)]
#[command(about = "Copy GPS EXIF tags onto untagged photos from the geotagged photo taken closest in time")]
#[command(long_about = "Two cameras, one with GPS and one without: geo-backfill gives every photo from the \
second camera the coordinates of the GPS-tagged photo taken nearest to it in time.

Capture times come from EXIF DateTimeOriginal and are compared as stored (no timezone handling).
A match is only accepted when the two photos are at most --max-diff-days whole days apart.
Only JPEG and PNG targets can be written.")]
struct Cli {
    /// Increase verbosity (-v=DEBUG, -vv=TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match untagged photos against geotagged ones and write the GPS tags
    Run {
        /// Glob selecting the geotagged reference photos (quote it)
        reference_glob: String,
        /// Glob selecting the photos to process (quote it)
        target_glob: String,
        /// Match and report, but don't modify any file
        #[arg(long, visible_alias = "dry")]
        dry_run: bool,
        /// Largest accepted gap between a photo and its match, in whole days
        #[arg(long, env = "GEO_BACKFILL_MAX_DIFF_DAYS", default_value_t = DEFAULT_MAX_DIFF_DAYS)]
        max_diff_days: u32,
        /// Also print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the photos a glob contributes as references (or, with --untagged, as targets)
    Scan {
        /// Glob selecting the photos (quote it)
        glob: String,
        /// List photos without GPS coordinates instead
        #[arg(long)]
        untagged: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            reference_glob,
            target_glob,
            dry_run,
            max_diff_days,
            json,
        } => {
            let config = GeotagConfig {
                max_diff_days,
                dry_run,
            };
            run(&reference_glob, &target_glob, config, json, cli.verbose == 0)
        }
        Commands::Scan { glob, untagged } => scan(&glob, untagged),
    }
}

fn setup_logging(verbosity: u8) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = default_level(verbosity, std::env::var_os("RUST_LOG").is_some()) {
        builder.filter_level(level);
    }
    builder.format_target(false).init();

    Ok(())
}

/// Level picked from `-v`, or `None` when `RUST_LOG` already decides.
/// An explicit `-v` still raises the level over `RUST_LOG`.
fn default_level(verbosity: u8, rust_log_set: bool) -> Option<log::LevelFilter> {
    match (verbosity, rust_log_set) {
        (0, true) => None,
        (0, false) => Some(log::LevelFilter::Info),
        (1, _) => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

/// Log stream plus a progress bar over the matching phase.
struct ConsoleObserver {
    log: LogObserver,
    show_bar: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new(show_bar: bool) -> Self {
        Self {
            log: LogObserver,
            show_bar,
            bar: None,
        }
    }

    fn start_bar(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message("Matching photos");
        self.bar = Some(bar);
    }
}

impl ProgressObserver for ConsoleObserver {
    fn on_progress(&mut self, event: &ProgressEvent<'_>) {
        match event {
            ProgressEvent::Processing { index: 0, total, .. } if self.show_bar => self.start_bar(*total),
            ProgressEvent::Matched { .. } | ProgressEvent::Unmatched { .. } | ProgressEvent::WriteFailed { .. } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
            }
            ProgressEvent::StateChanged(RunState::Done) => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_with_message("Matching complete");
                }
            }
            // Totals go to stdout through print_summary.
            ProgressEvent::Finished(_) => return,
            _ => {}
        }

        match &self.bar {
            Some(bar) => bar.suspend(|| self.log.on_progress(event)),
            None => self.log.on_progress(event),
        }
    }
}

fn run(reference_glob: &str, target_glob: &str, config: GeotagConfig, json: bool, show_bar: bool) -> Result<()> {
    info!(
        "Backfilling GPS from '{}' into '{}' (window {} days{})",
        reference_glob,
        target_glob,
        config.max_diff_days,
        if config.dry_run { ", dry run" } else { "" }
    );

    let reader = ExifTagReader::new();
    let writer = ExifGeotagWriter::new();
    let mut observer = ConsoleObserver::new(show_bar);

    let summary = Geotagger::new(&reader, &writer, config)
        .run(reference_glob, target_glob, &mut observer)
        .context("GPS backfill aborted")?;

    print_summary(&summary);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\nMatching complete{}", if summary.dry_run { " (dry run)" } else { "" });
    println!("Reference photos: {}", summary.reference_count);
    println!("Photos processed: {}", summary.target_count);
    println!("Matched: {}", summary.matched.len());
    println!("Unmatched: {}", summary.unmatched.len());
    println!("Failed: {}", summary.failed.len());

    if !summary.failed.is_empty() {
        println!("\nErrors:");
        for failure in &summary.failed {
            println!("  {}: {}", failure.target.display(), failure.error);
        }
    }
}

fn scan(glob: &str, untagged: bool) -> Result<()> {
    let filter = if untagged {
        GpsFilter::WithoutCoordinates
    } else {
        GpsFilter::WithCoordinates
    };

    let reader = ExifTagReader::new();
    let mut log = LogObserver;
    let mut records = PhotoCatalog::new(&reader)
        .scan(glob, filter, &mut log)
        .with_context(|| format!("Failed to scan '{}'", glob))?;
    records.sort_by(|a, b| a.capture_time().cmp(b.capture_time()).then_with(|| a.path().cmp(b.path())));

    for record in &records {
        println!("{}  {}  {}", record.capture_time(), record.geotag(), record.path().display());
    }
    println!("\n{} photos", records.len());

    Ok(())
}

/**
 * Progress events emitted while scanning and matching
 *
 * The geotagger reports through a [`ProgressObserver`] handed to it by the
 * caller. [`LogObserver`] renders the stream to the `log` facade.
 */

use log::{log, Level};
use std::path::Path;

use crate::catalog::GpsFilter;
use crate::error::GeotagError;
use crate::geotagger::{RunState, RunSummary};
use crate::photo::PhotoRecord;

#[derive(Debug)]
pub enum ProgressEvent<'a> {
    StateChanged(RunState),
    FileSkipped {
        path: &'a Path,
        error: &'a GeotagError,
    },
    ScanFinished {
        filter: GpsFilter,
        found: usize,
    },
    Processing {
        index: usize,
        total: usize,
        target: &'a PhotoRecord,
    },
    Matched {
        target: &'a PhotoRecord,
        reference: &'a PhotoRecord,
        written: bool,
    },
    Unmatched {
        target: &'a PhotoRecord,
        nearest: &'a PhotoRecord,
        elapsed_days: i64,
    },
    WriteFailed {
        target: &'a PhotoRecord,
        error: &'a GeotagError,
    },
    Finished(&'a RunSummary),
}

pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&mut self, _event: &ProgressEvent<'_>) {}
}

/// Writes the human-readable progress stream through `log`.
///
/// Per-photo outcomes are logged at info so they show at the default
/// verbosity; the per-file headers and state changes only at debug.
#[derive(Debug, Default)]
pub struct LogObserver;

impl LogObserver {
    /// The lines an event turns into, with the level each is logged at.
    pub fn render(event: &ProgressEvent<'_>) -> Vec<(Level, String)> {
        match event {
            ProgressEvent::StateChanged(state) => vec![(Level::Debug, format!("state: {:?}", state))],
            ProgressEvent::FileSkipped { path, error } => {
                vec![(Level::Warn, format!("Skipping {}: {}", path.display(), error))]
            }
            ProgressEvent::ScanFinished { filter, found } => match filter {
                GpsFilter::WithCoordinates => vec![(Level::Info, format!("images as base: {}", found))],
                GpsFilter::WithoutCoordinates => vec![(Level::Info, format!("images to process: {}", found))],
            },
            ProgressEvent::Processing { index, total, target } => vec![
                (Level::Debug, format!("# processing {}/{}", index + 1, total)),
                (Level::Debug, format!("  file:  {}", target.path().display())),
            ],
            ProgressEvent::Matched {
                target,
                reference,
                written,
            } => {
                let suffix = if *written { "" } else { " (dry run, not written)" };
                vec![(
                    Level::Info,
                    format!(
                        "{}: match {}{}",
                        target.path().display(),
                        reference.path().display(),
                        suffix
                    ),
                )]
            }
            ProgressEvent::Unmatched {
                target,
                nearest,
                elapsed_days,
            } => vec![(
                Level::Info,
                format!(
                    "{}: unmatched (nearest {} is {} days away)",
                    target.path().display(),
                    nearest.path().display(),
                    elapsed_days
                ),
            )],
            ProgressEvent::WriteFailed { target, error } => vec![(
                Level::Error,
                format!("Failed to add GPS data to {}: {}", target.path().display(), error),
            )],
            ProgressEvent::Finished(summary) => vec![
                (Level::Info, format!("matched images: {}", summary.matched.len())),
                (Level::Info, format!("unmatched images: {}", summary.unmatched.len())),
                (Level::Info, format!("failed images: {}", summary.failed.len())),
            ],
        }
    }
}

impl ProgressObserver for LogObserver {
    fn on_progress(&mut self, event: &ProgressEvent<'_>) {
        for (level, line) in Self::render(event) {
            log!(level, "{}", line);
        }
    }
}

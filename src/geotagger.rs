/**
 * Run orchestration: scan both collections, match every untagged photo
 * against the reference timeline and write the accepted matches
 */

use log::debug;
use serde::Serialize;
use std::path::PathBuf;

use crate::catalog::{GpsFilter, PhotoCatalog};
use crate::error::{GeotagError, Result};
use crate::exif::TagReader;
use crate::exif_writer::TagWriter;
use crate::photo::{GeoTag, PhotoRecord};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::timeline::ReferenceTimeline;
use crate::window::{ValidityWindow, DEFAULT_MAX_DIFF_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Initializing,
    ScanningReference,
    ScanningTargets,
    Matching,
    Done,
    Aborted,
}

impl RunState {
    /// Whether `next` is a legal step from this state. Any unfinished state
    /// may abort; a finished run only restarts through `Initializing`.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Initializing, ScanningReference)
                | (ScanningReference, ScanningTargets)
                | (ScanningTargets, Matching)
                | (Matching, Done)
                | (Initializing | ScanningReference | ScanningTargets | Matching, Aborted)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeotagConfig {
    pub max_diff_days: u32,
    pub dry_run: bool,
}

impl Default for GeotagConfig {
    fn default() -> Self {
        Self {
            max_diff_days: DEFAULT_MAX_DIFF_DAYS,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPhoto {
    pub target: PathBuf,
    pub reference: PathBuf,
    pub elapsed_days: i64,
    pub geotag: GeoTag,
    pub written: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedPhoto {
    pub target: PathBuf,
    pub nearest: PathBuf,
    pub elapsed_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedPhoto {
    pub target: PathBuf,
    pub reference: PathBuf,
    pub error: String,
}

/// Outcome of a run that reached the matching phase.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub reference_count: usize,
    pub target_count: usize,
    pub matched: Vec<MatchedPhoto>,
    pub unmatched: Vec<UnmatchedPhoto>,
    pub failed: Vec<FailedPhoto>,
}

pub struct Geotagger<'a, R: TagReader + ?Sized, W: TagWriter + ?Sized> {
    reader: &'a R,
    writer: &'a W,
    config: GeotagConfig,
    state: RunState,
}

impl<'a, R: TagReader + ?Sized, W: TagWriter + ?Sized> Geotagger<'a, R, W> {
    pub fn new(reader: &'a R, writer: &'a W, config: GeotagConfig) -> Self {
        Self {
            reader,
            writer,
            config,
            state: RunState::Initializing,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, state: RunState, observer: &mut dyn ProgressObserver) {
        debug!("{:?} -> {:?}", self.state, state);
        debug_assert!(
            self.state.can_advance_to(state),
            "illegal run state transition {:?} -> {:?}",
            self.state,
            state
        );
        self.state = state;
        observer.on_progress(&ProgressEvent::StateChanged(state));
    }

    fn abort(&mut self, message: &str, observer: &mut dyn ProgressObserver) -> GeotagError {
        self.transition(RunState::Aborted, observer);
        GeotagError::Precondition(message.to_string())
    }

    /// Runs the whole pipeline. Fails only on an invalid glob or when either
    /// collection comes up empty; per-photo write failures end up in
    /// [`RunSummary::failed`].
    pub fn run(
        &mut self,
        reference_pattern: &str,
        target_pattern: &str,
        observer: &mut dyn ProgressObserver,
    ) -> Result<RunSummary> {
        self.state = RunState::Initializing;
        let catalog = PhotoCatalog::new(self.reader);

        self.transition(RunState::ScanningReference, observer);
        let references = match catalog.scan(reference_pattern, GpsFilter::WithCoordinates, observer) {
            Ok(references) => references,
            Err(e) => {
                self.transition(RunState::Aborted, observer);
                return Err(e);
            }
        };
        if references.is_empty() {
            return Err(self.abort("No base images were found", observer));
        }
        let timeline = ReferenceTimeline::new(references)?;

        self.transition(RunState::ScanningTargets, observer);
        let targets = match catalog.scan(target_pattern, GpsFilter::WithoutCoordinates, observer) {
            Ok(targets) => targets,
            Err(e) => {
                self.transition(RunState::Aborted, observer);
                return Err(e);
            }
        };
        if targets.is_empty() {
            return Err(self.abort("No images to process were found", observer));
        }

        self.transition(RunState::Matching, observer);
        let summary = self.match_all(&timeline, &targets, observer);
        observer.on_progress(&ProgressEvent::Finished(&summary));

        self.transition(RunState::Done, observer);
        Ok(summary)
    }

    fn match_all(
        &self,
        timeline: &ReferenceTimeline,
        targets: &[PhotoRecord],
        observer: &mut dyn ProgressObserver,
    ) -> RunSummary {
        let window = ValidityWindow::new(self.config.max_diff_days);
        let mut summary = RunSummary {
            dry_run: self.config.dry_run,
            reference_count: timeline.len(),
            target_count: targets.len(),
            ..RunSummary::default()
        };

        // Scan order, not timeline order.
        for (index, target) in targets.iter().enumerate() {
            observer.on_progress(&ProgressEvent::Processing {
                index,
                total: targets.len(),
                target,
            });

            let nearest = timeline.find_nearest(target.capture_time());
            let elapsed_days = ValidityWindow::elapsed_days(target.capture_time(), nearest.capture_time());

            if !window.admits(target.capture_time(), nearest.capture_time()) {
                observer.on_progress(&ProgressEvent::Unmatched {
                    target,
                    nearest,
                    elapsed_days,
                });
                summary.unmatched.push(UnmatchedPhoto {
                    target: target.path().to_path_buf(),
                    nearest: nearest.path().to_path_buf(),
                    elapsed_days,
                });
                continue;
            }

            let written = if self.config.dry_run {
                false
            } else if let Err(error) = self.writer.write_geotag(target.path(), nearest.geotag()) {
                observer.on_progress(&ProgressEvent::WriteFailed {
                    target,
                    error: &error,
                });
                summary.failed.push(FailedPhoto {
                    target: target.path().to_path_buf(),
                    reference: nearest.path().to_path_buf(),
                    error: error.to_string(),
                });
                continue;
            } else {
                true
            };

            observer.on_progress(&ProgressEvent::Matched {
                target,
                reference: nearest,
                written,
            });
            summary.matched.push(MatchedPhoto {
                target: target.path().to_path_buf(),
                reference: nearest.path().to_path_buf(),
                elapsed_days,
                geotag: nearest.geotag().clone(),
                written,
            });
        }

        summary
    }
}

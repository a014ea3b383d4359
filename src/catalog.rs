/**
 * Photo catalog: expands a glob and classifies each photo by whether it
 * already carries GPS coordinates
 */

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{GeotagError, Result};
use crate::exif::{ExifTags, TagReader};
use crate::photo::{GeoTag, PhotoRecord};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::timestamp::CaptureTime;

/// Which side of the GPS split a scan keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsFilter {
    /// Both latitude and longitude present (altitude optional).
    WithCoordinates,
    /// Neither latitude nor longitude present.
    WithoutCoordinates,
}

/// What a file's GPS tags amount to.
#[derive(Debug)]
enum Coverage {
    Full(GeoTag),
    Partial,
    None,
}

fn coverage(tags: ExifTags) -> Coverage {
    match (tags.latitude, tags.longitude) {
        (Some(latitude), Some(longitude)) => {
            Coverage::Full(GeoTag::new(latitude, longitude, tags.altitude))
        }
        (None, None) => Coverage::None,
        _ => Coverage::Partial,
    }
}

pub struct PhotoCatalog<'r, R: TagReader + ?Sized> {
    reader: &'r R,
}

impl<'r, R: TagReader + ?Sized> PhotoCatalog<'r, R> {
    pub fn new(reader: &'r R) -> Self {
        Self { reader }
    }

    /// Photos matching `pattern` that fall on the `filter` side, in
    /// enumeration order (unsorted).
    ///
    /// Files whose metadata can't be read, or whose capture time is missing
    /// or malformed, are reported as skipped and left out. Only an invalid
    /// pattern fails the whole scan.
    pub fn scan(
        &self,
        pattern: &str,
        filter: GpsFilter,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<PhotoRecord>> {
        let paths = glob::glob(pattern).map_err(|e| GeotagError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut records = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    let error = GeotagError::metadata_read(e.path(), e.error());
                    observer.on_progress(&ProgressEvent::FileSkipped {
                        path: e.path(),
                        error: &error,
                    });
                    continue;
                }
            };

            if !path.is_file() {
                debug!("Not a file, ignoring: {}", path.display());
                continue;
            }

            match self.classify(&path, filter) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!("Wrong GPS side for this scan: {}", path.display()),
                Err(error) => observer.on_progress(&ProgressEvent::FileSkipped {
                    path: &path,
                    error: &error,
                }),
            }
        }

        observer.on_progress(&ProgressEvent::ScanFinished {
            filter,
            found: records.len(),
        });
        Ok(records)
    }

    fn classify(&self, path: &Path, filter: GpsFilter) -> Result<Option<PhotoRecord>> {
        let mut tags = self.reader.read_tags(path)?;
        let raw = tags.capture_time.take();

        let geotag = match (coverage(tags), filter) {
            (Coverage::Full(geotag), GpsFilter::WithCoordinates) => geotag,
            (Coverage::None, GpsFilter::WithoutCoordinates) => GeoTag::Absent,
            _ => return Ok(None),
        };

        // The capture time only matters for photos that are kept.
        let raw = raw.ok_or_else(|| GeotagError::metadata_read(path, "no DateTimeOriginal field"))?;
        let capture_time = CaptureTime::parse(&raw)?;
        Ok(Some(PhotoRecord::new(PathBuf::from(path), capture_time, geotag)))
    }
}

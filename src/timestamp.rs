/**
 * Capture-time parsing
 *
 * EXIF stores DateTimeOriginal as a fixed-width, zero-padded string
 * (`2024:01:15 10:30:45`). Because the width is fixed, ordering the raw
 * strings lexicographically is the same as ordering them chronologically,
 * which the timeline search relies on. The parser therefore rejects anything
 * that is not exactly that shape, even if chrono would be lenient about it.
 */

use chrono::{NaiveDateTime, TimeDelta};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{GeotagError, Result};

pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

static EXIF_DATETIME_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}:\d{2}:\d{2} \d{2}:\d{2}:\d{2}$").expect("static regex is valid")
});

/// A capture time as stored in the file, together with its parsed instant.
///
/// Both forms are kept: the raw string drives the binary search, the instant
/// is used whenever an actual duration is needed. They can't drift apart
/// because the only way to build one is [`CaptureTime::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureTime {
    raw: String,
    instant: NaiveDateTime,
}

impl CaptureTime {
    pub fn parse(raw: &str) -> Result<Self> {
        if !EXIF_DATETIME_SHAPE.is_match(raw) {
            return Err(GeotagError::MalformedTimestamp(raw.to_string()));
        }

        // Shape is right, chrono still rejects month 13, Feb 30, hour 25, ...
        let instant = NaiveDateTime::parse_from_str(raw, EXIF_DATETIME_FORMAT)
            .map_err(|_| GeotagError::MalformedTimestamp(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            instant,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> NaiveDateTime {
        self.instant
    }

    /// Absolute elapsed time between two capture times.
    pub fn distance(&self, other: &CaptureTime) -> TimeDelta {
        let delta = self.instant - other.instant;
        if delta < TimeDelta::zero() {
            -delta
        } else {
            delta
        }
    }
}

impl Ord for CaptureTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl PartialOrd for CaptureTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/**
 * Photo records and the GPS values carried between them
 */

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::timestamp::CaptureTime;

/// Unsigned EXIF rational, kept exactly as stored so coordinates are copied
/// without any float round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rational {
    pub num: u32,
    pub denom: u32,
}

impl Rational {
    pub fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

impl From<exif::Rational> for Rational {
    fn from(r: exif::Rational) -> Self {
        Self::new(r.num, r.denom)
    }
}

impl From<Rational> for exif::Rational {
    fn from(r: Rational) -> Self {
        exif::Rational {
            num: r.num,
            denom: r.denom,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

/// Latitude or longitude: degrees/minutes/seconds rationals plus the
/// hemisphere reference (`N`/`S`, `E`/`W`) if the file had one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpsCoordinate {
    pub components: Vec<Rational>,
    pub reference: Option<String>,
}

impl GpsCoordinate {
    pub fn new(components: Vec<Rational>, reference: Option<String>) -> Self {
        Self {
            components,
            reference,
        }
    }

    /// Signed decimal degrees, for display only.
    pub fn to_degrees(&self) -> Option<f64> {
        let mut parts = self.components.iter().map(|r| r.to_f64());
        let degrees = parts.next()?;
        let minutes = parts.next().unwrap_or(0.0);
        let seconds = parts.next().unwrap_or(0.0);
        let value = degrees + minutes / 60.0 + seconds / 3600.0;

        match self.reference.as_deref() {
            Some("S") | Some("W") => Some(-value),
            _ => Some(value),
        }
    }
}

impl fmt::Display for GpsCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(" "))?;
        if let Some(reference) = &self.reference {
            write!(f, " {}", reference)?;
        }
        Ok(())
    }
}

/// GPSAltitude with its GPSAltitudeRef byte (0 = above sea level,
/// 1 = below) if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GpsAltitude {
    pub value: Rational,
    pub reference: Option<u8>,
}

impl fmt::Display for GpsAltitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reference {
            Some(1) => write!(f, "{} below sea level", self.value),
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Where a photo was taken, as far as its metadata says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeoTag {
    Absent,
    Surface {
        latitude: GpsCoordinate,
        longitude: GpsCoordinate,
    },
    Elevated {
        latitude: GpsCoordinate,
        longitude: GpsCoordinate,
        altitude: GpsAltitude,
    },
}

impl GeoTag {
    pub fn new(latitude: GpsCoordinate, longitude: GpsCoordinate, altitude: Option<GpsAltitude>) -> Self {
        match altitude {
            Some(altitude) => GeoTag::Elevated {
                latitude,
                longitude,
                altitude,
            },
            None => GeoTag::Surface { latitude, longitude },
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, GeoTag::Absent)
    }

    pub fn latitude(&self) -> Option<&GpsCoordinate> {
        match self {
            GeoTag::Absent => None,
            GeoTag::Surface { latitude, .. } | GeoTag::Elevated { latitude, .. } => Some(latitude),
        }
    }

    pub fn longitude(&self) -> Option<&GpsCoordinate> {
        match self {
            GeoTag::Absent => None,
            GeoTag::Surface { longitude, .. } | GeoTag::Elevated { longitude, .. } => Some(longitude),
        }
    }

    pub fn altitude(&self) -> Option<&GpsAltitude> {
        match self {
            GeoTag::Elevated { altitude, .. } => Some(altitude),
            _ => None,
        }
    }
}

impl fmt::Display for GeoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoTag::Absent => f.write_str("no GPS"),
            GeoTag::Surface { latitude, longitude } => {
                write!(f, "lat {} / lon {}", latitude, longitude)
            }
            GeoTag::Elevated {
                latitude,
                longitude,
                altitude,
            } => write!(f, "lat {} / lon {} / alt {}", latitude, longitude, altitude),
        }
    }
}

/// One scanned image. Built once by the catalog and never changed; writing
/// GPS data to a target file does not touch the in-memory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    path: PathBuf,
    capture_time: CaptureTime,
    geotag: GeoTag,
}

impl PhotoRecord {
    pub fn new(path: impl Into<PathBuf>, capture_time: CaptureTime, geotag: GeoTag) -> Self {
        Self {
            path: path.into(),
            capture_time,
            geotag,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capture_time(&self) -> &CaptureTime {
        &self.capture_time
    }

    pub fn capture_time_raw(&self) -> &str {
        self.capture_time.raw()
    }

    pub fn geotag(&self) -> &GeoTag {
        &self.geotag
    }
}

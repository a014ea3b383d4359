/**
 * EXIF reading with kamadak-exif
 *
 * Only the fields needed for time matching are pulled out:
 * - DateTimeOriginal (capture time, kept as the raw EXIF string)
 * - GPSLatitude / GPSLatitudeRef
 * - GPSLongitude / GPSLongitudeRef
 * - GPSAltitude / GPSAltitudeRef
 */

use exif::{Exif, Field, In, Reader as ExifReader, Tag, Value};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{GeotagError, Result};
use crate::photo::{GpsAltitude, GpsCoordinate, Rational};

/// The subset of a file's metadata the catalog cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifTags {
    pub capture_time: Option<String>,
    pub latitude: Option<GpsCoordinate>,
    pub longitude: Option<GpsCoordinate>,
    pub altitude: Option<GpsAltitude>,
}

/// Source of per-file metadata for the catalog.
pub trait TagReader {
    fn read_tags(&self, path: &Path) -> Result<ExifTags>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExifTagReader;

impl ExifTagReader {
    pub fn new() -> Self {
        Self
    }

    fn read_exif(&self, path: &Path) -> Result<Exif> {
        // The handle lives only for this call and is dropped on every path.
        let file = File::open(path).map_err(|e| GeotagError::metadata_read(path, e))?;
        let mut bufreader = BufReader::new(&file);

        ExifReader::new()
            .read_from_container(&mut bufreader)
            .map_err(|e| GeotagError::metadata_read(path, e))
    }
}

impl TagReader for ExifTagReader {
    fn read_tags(&self, path: &Path) -> Result<ExifTags> {
        debug!("Reading EXIF from: {}", path.display());
        let exif = self.read_exif(path)?;
        Ok(extract_tags(&exif))
    }
}

pub(crate) fn extract_tags(exif: &Exif) -> ExifTags {
    ExifTags {
        capture_time: exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .and_then(ascii_value),
        latitude: coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        longitude: coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        altitude: altitude(exif),
    }
}

/// First ASCII string of a field, as stored (display_value would reformat
/// dates with dashes).
fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(strings) => strings.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string()
        }),
        _ => None,
    }
}

fn rationals(field: &Field) -> Option<Vec<Rational>> {
    match &field.value {
        Value::Rational(values) if !values.is_empty() => {
            Some(values.iter().map(|r| Rational::new(r.num, r.denom)).collect())
        }
        _ => None,
    }
}

fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<GpsCoordinate> {
    let components = rationals(exif.get_field(value_tag, In::PRIMARY)?)?;
    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(ascii_value)
        .filter(|r| !r.is_empty());

    Some(GpsCoordinate::new(components, reference))
}

fn altitude(exif: &Exif) -> Option<GpsAltitude> {
    let value = rationals(exif.get_field(Tag::GPSAltitude, In::PRIMARY)?)?
        .into_iter()
        .next()?;
    let reference = exif
        .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Byte(bytes) => bytes.first().copied(),
            _ => None,
        });

    Some(GpsAltitude { value, reference })
}

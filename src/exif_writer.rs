/**
 * EXIF Writer module - copies GPS tags into an existing image
 *
 * The existing EXIF block is read back with kamadak-exif, the GPS fields
 * being written are replaced, and the block is re-serialized with the
 * experimental kamadak-exif writer. img-parts swaps the new block into the
 * container without touching the image data.
 *
 * Supported containers: JPEG (.jpg, .jpeg), PNG (.png)
 */

use exif::experimental::Writer;
use exif::{Exif, Field, In, Reader as ExifReader, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::{Bytes, ImageEXIF};
use log::{debug, warn};
use std::fs;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::error::{GeotagError, Result};
use crate::photo::{GeoTag, GpsAltitude, GpsCoordinate};

/// GPS IFD version 2.3.0.0, added when the file has no GPSVersionID yet.
const GPS_VERSION: [u8; 4] = [2, 3, 0, 0];

/// Persists a geotag into an image file.
pub trait TagWriter {
    fn write_geotag(&self, path: &Path, geotag: &GeoTag) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Jpeg,
    Png,
}

impl Container {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| GeotagError::write(path, "file has no extension"))?;

        match extension.as_str() {
            "jpg" | "jpeg" => Ok(Container::Jpeg),
            "png" => Ok(Container::Png),
            other => Err(GeotagError::write(
                path,
                format!("writing EXIF to '.{}' files is not supported (only JPEG and PNG)", other),
            )),
        }
    }
}

/// Tags the writer owns. All of them are dropped from the existing block
/// before the new position goes in, so a ref left over from an earlier
/// position can't qualify the new value.
const GPS_POSITION_TAGS: [Tag; 6] = [
    Tag::GPSLatitude,
    Tag::GPSLatitudeRef,
    Tag::GPSLongitude,
    Tag::GPSLongitudeRef,
    Tag::GPSAltitude,
    Tag::GPSAltitudeRef,
];

/// Blocks are always re-encoded big-endian.
const LITTLE_ENDIAN: bool = false;

/// What survives from the file's current EXIF block.
#[derive(Debug, Default)]
struct ExistingExif {
    fields: Vec<Field>,
    thumbnail: Option<Vec<u8>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExifGeotagWriter;

impl ExifGeotagWriter {
    pub fn new() -> Self {
        Self
    }

    /// Fields already in the file, minus the GPS position, plus the
    /// embedded thumbnail if there is one.
    fn existing_exif(&self, path: &Path) -> Result<ExistingExif> {
        let file = fs::File::open(path).map_err(|e| GeotagError::write(path, e))?;
        let mut bufreader = BufReader::new(&file);

        match ExifReader::new().read_from_container(&mut bufreader) {
            Ok(exif) => Ok(ExistingExif {
                fields: exif
                    .fields()
                    .filter(|f| !(f.ifd_num == In::PRIMARY && GPS_POSITION_TAGS.contains(&f.tag)))
                    .map(|f| Field {
                        tag: f.tag,
                        ifd_num: f.ifd_num,
                        value: f.value.clone(),
                    })
                    .collect(),
                thumbnail: thumbnail(&exif),
            }),
            Err(exif::Error::NotFound(_)) => {
                debug!("No EXIF in {}, starting from an empty block", path.display());
                Ok(ExistingExif::default())
            }
            // Anything else means we can't round-trip the existing metadata.
            Err(e) => Err(GeotagError::write(path, format!("existing EXIF unreadable: {}", e))),
        }
    }

    fn encode(&self, path: &Path, fields: &[Field], thumbnail: Option<&[u8]>) -> Result<Bytes> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        // push_field skips the thumbnail offset/length, the bytes go in here.
        if let Some(jpeg) = thumbnail {
            writer.set_jpeg(jpeg, In::THUMBNAIL);
        }

        let mut buffer = Cursor::new(Vec::new());
        writer
            .write(&mut buffer, LITTLE_ENDIAN)
            .map_err(|e| GeotagError::write(path, format!("failed to encode EXIF: {}", e)))?;

        Ok(Bytes::from(buffer.into_inner()))
    }

    fn embed(&self, path: &Path, container: Container, exif_bytes: Bytes) -> Result<()> {
        let image_bytes = fs::read(path).map_err(|e| GeotagError::write(path, e))?;

        let output = match container {
            Container::Jpeg => {
                let mut jpeg = Jpeg::from_bytes(image_bytes.into())
                    .map_err(|e| GeotagError::write(path, format!("failed to parse JPEG: {}", e)))?;
                jpeg.set_exif(Some(exif_bytes));
                jpeg.encoder().bytes()
            }
            Container::Png => {
                let mut png = Png::from_bytes(image_bytes.into())
                    .map_err(|e| GeotagError::write(path, format!("failed to parse PNG: {}", e)))?;
                png.set_exif(Some(exif_bytes));
                png.encoder().bytes()
            }
        };

        fs::write(path, output).map_err(|e| GeotagError::write(path, e))
    }
}

impl TagWriter for ExifGeotagWriter {
    fn write_geotag(&self, path: &Path, geotag: &GeoTag) -> Result<()> {
        let (latitude, longitude) = match (geotag.latitude(), geotag.longitude()) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(GeotagError::write(path, "no coordinates to write")),
        };
        let container = Container::from_path(path)?;

        let mut gps_fields = Vec::new();
        push_coordinate(&mut gps_fields, Tag::GPSLatitude, Tag::GPSLatitudeRef, latitude);
        push_coordinate(&mut gps_fields, Tag::GPSLongitude, Tag::GPSLongitudeRef, longitude);
        if let Some(altitude) = geotag.altitude() {
            push_altitude(&mut gps_fields, altitude);
        }

        let existing = self.existing_exif(path)?;
        let mut fields = existing.fields;
        if !fields.iter().any(|f| f.tag == Tag::GPSVersionID) {
            fields.push(primary(Tag::GPSVersionID, Value::Byte(GPS_VERSION.to_vec())));
        }
        fields.extend(gps_fields);

        debug!("Writing {} EXIF fields to {}", fields.len(), path.display());
        let exif_bytes = self.encode(path, &fields, existing.thumbnail.as_deref())?;
        self.embed(path, container, exif_bytes)
    }
}

fn primary(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// JPEG thumbnail bytes referenced from IFD1. The offset is relative to the
/// start of the TIFF data, which is what `Exif::buf` holds.
fn thumbnail(exif: &Exif) -> Option<Vec<u8>> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;

    let bytes = exif.buf().get(offset..offset.checked_add(length)?);
    if bytes.is_none() {
        warn!("Thumbnail points outside the EXIF block, dropping it");
    }
    bytes.map(|b| b.to_vec())
}

fn push_coordinate(fields: &mut Vec<Field>, value_tag: Tag, ref_tag: Tag, coordinate: &GpsCoordinate) {
    let rationals = coordinate.components.iter().map(|r| exif::Rational::from(*r)).collect();
    fields.push(primary(value_tag, Value::Rational(rationals)));

    if let Some(reference) = &coordinate.reference {
        fields.push(primary(ref_tag, Value::Ascii(vec![reference.as_bytes().to_vec()])));
    }
}

fn push_altitude(fields: &mut Vec<Field>, altitude: &GpsAltitude) {
    fields.push(primary(
        Tag::GPSAltitude,
        Value::Rational(vec![exif::Rational::from(altitude.value)]),
    ));

    if let Some(reference) = altitude.reference {
        fields.push(primary(Tag::GPSAltitudeRef, Value::Byte(vec![reference])));
    }
}

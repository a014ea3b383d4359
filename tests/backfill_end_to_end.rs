use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use tempfile::TempDir;

use geo_backfill::{
    ExifGeotagWriter, ExifTagReader, GeotagConfig, GeotagError, Geotagger, NoopObserver, Rational, RunState,
    TagReader,
};

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn dms(degrees: u32, minutes: u32) -> Value {
    Value::Rational(vec![
        exif::Rational { num: degrees, denom: 1 },
        exif::Rational { num: minutes, denom: 1 },
        exif::Rational { num: 0, denom: 1 },
    ])
}

/// Writes an 8x8 JPEG carrying DateTimeOriginal and, optionally, a GPS position.
fn photo(path: &Path, date: &str, gps: Option<(u32, &str, u32, &str)>) {
    image::RgbImage::from_pixel(8, 8, image::Rgb([30, 60, 90]))
        .save(path)
        .unwrap();

    let mut fields = vec![
        field(Tag::Model, Value::Ascii(vec![b"Test Camera".to_vec()])),
        field(Tag::DateTimeOriginal, Value::Ascii(vec![date.as_bytes().to_vec()])),
    ];
    if let Some((lat, lat_ref, lon, lon_ref)) = gps {
        fields.push(field(Tag::GPSLatitude, dms(lat, 30)));
        fields.push(field(Tag::GPSLatitudeRef, Value::Ascii(vec![lat_ref.as_bytes().to_vec()])));
        fields.push(field(Tag::GPSLongitude, dms(lon, 15)));
        fields.push(field(Tag::GPSLongitudeRef, Value::Ascii(vec![lon_ref.as_bytes().to_vec()])));
    }

    let mut writer = Writer::new();
    for f in &fields {
        writer.push_field(f);
    }
    let mut buffer = Cursor::new(Vec::new());
    writer.write(&mut buffer, false).unwrap();

    let mut jpeg = Jpeg::from_bytes(fs::read(path).unwrap().into()).unwrap();
    jpeg.set_exif(Some(Bytes::from(buffer.into_inner())));
    fs::write(path, jpeg.encoder().bytes()).unwrap();
}

struct Collections {
    dir: TempDir,
}

impl Collections {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("phone")).unwrap();
        fs::create_dir(dir.path().join("camera")).unwrap();
        Self { dir }
    }

    fn phone(&self, name: &str) -> PathBuf {
        self.dir.path().join("phone").join(name)
    }

    fn camera(&self, name: &str) -> PathBuf {
        self.dir.path().join("camera").join(name)
    }

    fn globs(&self) -> (String, String) {
        (
            format!("{}/phone/*.jpg", self.dir.path().display()),
            format!("{}/camera/*.jpg", self.dir.path().display()),
        )
    }
}

#[test]
fn test_backfills_nearest_reference_within_window() {
    let c = Collections::new();
    photo(&c.phone("a.jpg"), "2024:01:01 10:00:00", Some((48, "N", 2, "E")));
    photo(&c.phone("b.jpg"), "2024:01:10 10:00:00", Some((33, "S", 151, "E")));
    photo(&c.camera("near.jpg"), "2024:01:05 10:00:00", None);
    photo(&c.camera("far.jpg"), "2024:02:01 10:00:00", None);
    let far_before = fs::read(c.camera("far.jpg")).unwrap();
    let (phone, camera) = c.globs();

    let reader = ExifTagReader::new();
    let writer = ExifGeotagWriter::new();
    let mut geotagger = Geotagger::new(&reader, &writer, GeotagConfig::default());
    let summary = geotagger.run(&phone, &camera, &mut NoopObserver).unwrap();

    assert_eq!(geotagger.state(), RunState::Done);
    assert_eq!(summary.reference_count, 2);
    assert_eq!(summary.target_count, 2);
    assert_eq!(summary.matched.len(), 1);
    assert_eq!(summary.unmatched.len(), 1);
    assert!(summary.failed.is_empty());

    let near = reader.read_tags(&c.camera("near.jpg")).unwrap();
    assert_eq!(near.capture_time.as_deref(), Some("2024:01:05 10:00:00"));
    let latitude = near.latitude.unwrap();
    assert_eq!(latitude.components[0], Rational::new(48, 1));
    assert_eq!(latitude.reference.as_deref(), Some("N"));
    assert_eq!(near.longitude.unwrap().components[1], Rational::new(15, 1));

    assert_eq!(fs::read(c.camera("far.jpg")).unwrap(), far_before);
}

#[test]
fn test_dry_run_leaves_files_untouched() {
    let c = Collections::new();
    photo(&c.phone("a.jpg"), "2024:01:01 10:00:00", Some((48, "N", 2, "E")));
    photo(&c.camera("near.jpg"), "2024:01:02 10:00:00", None);
    let before = fs::read(c.camera("near.jpg")).unwrap();
    let (phone, camera) = c.globs();

    let reader = ExifTagReader::new();
    let writer = ExifGeotagWriter::new();
    let config = GeotagConfig {
        dry_run: true,
        ..GeotagConfig::default()
    };
    let summary = Geotagger::new(&reader, &writer, config)
        .run(&phone, &camera, &mut NoopObserver)
        .unwrap();

    assert_eq!(summary.matched.len(), 1);
    assert!(!summary.matched[0].written);
    assert_eq!(fs::read(c.camera("near.jpg")).unwrap(), before);
}

#[test]
fn test_geotagged_camera_photos_are_not_targets() {
    let c = Collections::new();
    photo(&c.phone("a.jpg"), "2024:01:01 10:00:00", Some((48, "N", 2, "E")));
    photo(&c.camera("tagged.jpg"), "2024:01:02 10:00:00", Some((10, "N", 10, "E")));
    let (phone, camera) = c.globs();

    let reader = ExifTagReader::new();
    let writer = ExifGeotagWriter::new();
    let result = Geotagger::new(&reader, &writer, GeotagConfig::default()).run(&phone, &camera, &mut NoopObserver);

    assert!(matches!(result, Err(GeotagError::Precondition(_))));
}

#[test]
fn test_no_reference_photos_aborts() {
    let c = Collections::new();
    photo(&c.camera("near.jpg"), "2024:01:02 10:00:00", None);
    let (phone, camera) = c.globs();

    let reader = ExifTagReader::new();
    let writer = ExifGeotagWriter::new();
    let mut geotagger = Geotagger::new(&reader, &writer, GeotagConfig::default());
    let result = geotagger.run(&phone, &camera, &mut NoopObserver);

    assert!(matches!(result, Err(GeotagError::Precondition(_))));
    assert_eq!(geotagger.state(), RunState::Aborted);
}

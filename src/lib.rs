pub mod catalog;
pub mod error;
pub mod exif;
pub mod exif_writer;
pub mod geotagger;
pub mod photo;
pub mod progress;
pub mod timeline;
pub mod timestamp;
pub mod window;

pub use catalog::{GpsFilter, PhotoCatalog};
pub use error::{GeotagError, Result};
pub use crate::exif::{ExifTagReader, ExifTags, TagReader};
pub use exif_writer::{ExifGeotagWriter, TagWriter};
pub use geotagger::{GeotagConfig, Geotagger, RunState, RunSummary};
pub use photo::{GeoTag, GpsAltitude, GpsCoordinate, PhotoRecord, Rational};
pub use progress::{LogObserver, NoopObserver, ProgressEvent, ProgressObserver};
pub use timeline::ReferenceTimeline;
pub use timestamp::CaptureTime;
pub use window::{in_bounds, ValidityWindow, DEFAULT_MAX_DIFF_DAYS};

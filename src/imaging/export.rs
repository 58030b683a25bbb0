//! Encoding and saving finished images.
//!
//! | Format | Encoder | Notes |
//! |---|---|---|
//! | JPEG | `JpegEncoder::new_with_quality` | alpha is dropped first |
//! | PNG | `image::ImageFormat::Png` | lossless, quality ignored |
//! | GIF | `GifEncoder` | single frame, RGBA palette quantisation |
//!
//! Saved files are named `{filename}_{YYYYMMDD_HHMMSS}.{ext}` inside the
//! exporter's output directory. Existing files are never overwritten: a
//! later export in the same second gets `_002`, `_003`, ... before the
//! extension.

use super::error::ImagingError;
use super::params::{ExportFormat, ExportSpec, Quality};
use chrono::{DateTime, Local};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat};
use std::fs::OpenOptions;
use std::io::{Cursor, ErrorKind, Write};
use std::path::PathBuf;
use tracing::info;

/// Encode an image into an in-memory file of the given format.
pub fn encode(
    image: &DynamicImage,
    format: ExportFormat,
    quality: Quality,
) -> Result<Vec<u8>, ImagingError> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.value());
            rgb.write_with_encoder(encoder)?;
        }
        ExportFormat::Png => {
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        ExportFormat::Gif => {
            let rgba = image.to_rgba8();
            let mut encoder = GifEncoder::new(&mut bytes);
            encoder.encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(bytes)
}

/// Output file name for an export made at `at`.
///
/// `copy` numbers exports that share a timestamp; the first (1) has no suffix.
pub fn export_file_name(spec: &ExportSpec, at: DateTime<Local>, copy: u32) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    let ext = spec.format.extension();
    if copy <= 1 {
        format!("{}_{}.{}", spec.filename, stamp, ext)
    } else {
        format!("{}_{}_{:0>3}.{}", spec.filename, stamp, copy, ext)
    }
}

/// Writes exports into one directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    /// Create the exporter, creating `output_dir` if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ImagingError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Encode and write `image`, returning the path written.
    pub fn save(&self, image: &DynamicImage, spec: &ExportSpec) -> Result<PathBuf, ImagingError> {
        let bytes = encode(image, spec.format, spec.quality)?;
        let at = Local::now();
        let mut copy = 1;
        loop {
            let path = self.output_dir.join(export_file_name(spec, at, copy));
            // never overwrite an earlier export
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&bytes)?;
                    info!(path = %path.display(), bytes = bytes.len(), format = %spec.format, "exported image");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => copy += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use chrono::TimeZone;

    fn spec(format: ExportFormat) -> ExportSpec {
        ExportSpec {
            format,
            quality: Quality::default(),
            filename: "portrait".into(),
        }
    }

    #[test]
    fn jpeg_drops_alpha() {
        let img = solid_rgba(32, 24, [200, 100, 50, 128]);
        let bytes = encode(&img, ExportFormat::Jpeg, Quality::new(90)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn png_is_lossless_and_keeps_alpha() {
        let img = solid_rgba(8, 8, [1, 2, 3, 4]);
        let bytes = encode(&img, ExportFormat::Png, Quality::default()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn gif_roundtrips_dimensions() {
        let img = gradient_rgb(20, 10);
        let bytes = encode(&img, ExportFormat::Gif, Quality::default()).unwrap();
        assert_eq!(&bytes[..3], b"GIF");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn lower_quality_makes_smaller_jpeg() {
        let img = checkerboard_rgb(64, 64, 3);
        let high = encode(&img, ExportFormat::Jpeg, Quality::new(100)).unwrap();
        let low = encode(&img, ExportFormat::Jpeg, Quality::new(10)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn file_name_has_timestamp_and_extension() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_file_name(&spec(ExportFormat::Jpeg), at, 1),
            "portrait_20240309_140507.jpeg"
        );
        assert_eq!(
            export_file_name(&spec(ExportFormat::Gif), at, 1),
            "portrait_20240309_140507.gif"
        );
        assert_eq!(
            export_file_name(&spec(ExportFormat::Png), at, 2),
            "portrait_20240309_140507_002.png"
        );
    }

    #[test]
    fn back_to_back_saves_write_distinct_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let exporter = Exporter::new(tmp.path()).unwrap();
        let spec = spec(ExportFormat::Png);
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| exporter.save(&solid_rgb(4, 4, [i * 80, 0, 0]), &spec).unwrap())
            .collect();

        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 3);
        for (i, path) in paths.iter().enumerate() {
            let px = image::open(path).unwrap().to_rgb8().get_pixel(0, 0).0;
            assert_eq!(px, [i as u8 * 80, 0, 0]);
        }
    }

    #[test]
    fn exporter_creates_directory_and_writes_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("outputs");
        let exporter = Exporter::new(&dir).unwrap();
        assert!(dir.is_dir());

        let path = exporter
            .save(&gradient_rgb(16, 16), &spec(ExportFormat::Png))
            .unwrap();
        assert_eq!(path.parent().unwrap(), dir);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("portrait_"));
        assert!(name.ends_with(".png"));
        // portrait_ + 8 digits + _ + 6 digits + .png
        assert_eq!(name.len(), "portrait_".len() + 15 + ".png".len());
        assert_eq!(image::open(&path).unwrap().width(), 16);
    }

    #[test]
    fn exporter_fails_when_directory_is_a_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("taken");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(Exporter::new(&file), Err(ImagingError::Io(_))));
    }
}

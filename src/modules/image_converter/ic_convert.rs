use eframe::egui;
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use crate::error::{ConvertError, ConvertResult};
use crate::modules::image_export::{export_image, OutputFormat};
use super::ic_scan;

pub const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;
pub const THUMBNAIL_SIDE: u32 = 120;

/// Everything the worker needs for one run. Built on the interface thread,
/// moved into the worker and never changed afterwards.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    source: PathBuf,
    format: OutputFormat,
    quality: u8,
    files: Vec<PathBuf>,
}

impl ConversionJob {
    pub fn new(
        source: impl Into<PathBuf>,
        format: OutputFormat,
        quality: u8,
        files: Vec<PathBuf>,
    ) -> ConvertResult<Self> {
        if !QUALITY_RANGE.contains(&quality) {
            return Err(ConvertError::InvalidQuality(quality));
        }
        Ok(Self {
            source: source.into(),
            format,
            quality,
            files,
        })
    }

    /// Enumerates `source` and builds the job from what is there now.
    pub fn prepare(source: &Path, format: OutputFormat, quality: u8) -> ConvertResult<Self> {
        let files = ic_scan::scan_folder(source)?;
        Self::new(source, format, quality, files)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// `<source>/output/<format>`
    pub fn output_dir(&self) -> PathBuf {
        self.source.join("output").join(self.format.extension())
    }
}

pub fn decode(path: &Path) -> ConvertResult<DynamicImage> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| ConvertError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    reader.decode().map_err(|source| ConvertError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Drops transparency. Palette sources arrive from the decoder as RGB(A),
/// so removing alpha is the whole normalization.
pub fn normalize(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    }
}

pub fn output_path(source: &Path, output_dir: &Path, format: OutputFormat) -> ConvertResult<PathBuf> {
    let stem = source
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConvertError::InvalidFileName(source.to_path_buf()))?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format.extension());
    Ok(output_dir.join(name))
}

/// Decodes `source`, strips alpha and writes `<output_dir>/<stem>.<ext>`,
/// overwriting any previous output.
pub fn convert_image(
    source: &Path,
    output_dir: &Path,
    format: OutputFormat,
    quality: u8,
) -> ConvertResult<PathBuf> {
    let target = output_path(source, output_dir, format)?;
    let img = normalize(decode(source)?);
    export_image(&img, &target, format, quality)?;
    Ok(target)
}

/// Result of a best-effort thumbnail load. `Unavailable` means "show no
/// preview", never an error for the interface.
pub enum Preview {
    Ready(egui::ColorImage),
    Unavailable(String),
}

pub fn load_preview(path: &Path) -> Preview {
    match decode(path) {
        Ok(img) => {
            let thumb = img.thumbnail(THUMBNAIL_SIDE, THUMBNAIL_SIDE).to_rgba8();
            let size = [thumb.width() as usize, thumb.height() as usize];
            Preview::Ready(egui::ColorImage::from_rgba_unmultiplied(size, thumb.as_raw()))
        }
        Err(e) => Preview::Unavailable(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GenericImageView, Rgb, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_rgba_png(path: &Path) {
        let img = RgbaImage::from_fn(20, 10, |x, _| Rgba([200, x as u8 * 10, 30, 64]));
        img.save(path).unwrap();
    }

    #[test]
    fn job_rejects_quality_out_of_range() {
        assert!(matches!(
            ConversionJob::new("/tmp", OutputFormat::Jpg, 0, Vec::new()),
            Err(ConvertError::InvalidQuality(0))
        ));
        assert!(ConversionJob::new("/tmp", OutputFormat::Jpg, 101, Vec::new()).is_err());
        assert!(ConversionJob::new("/tmp", OutputFormat::Jpg, 1, Vec::new()).is_ok());
    }

    #[test]
    fn output_dir_is_nested_by_format() {
        let job = ConversionJob::new("/photos", OutputFormat::Webp, 80, Vec::new()).unwrap();
        assert_eq!(job.output_dir(), Path::new("/photos/output/webp"));
    }

    #[test]
    fn output_path_swaps_extension() {
        let path = output_path(Path::new("/in/holiday.photo.PNG"), Path::new("/out"), OutputFormat::Bmp).unwrap();
        assert_eq!(path, Path::new("/out/holiday.photo.bmp"));
    }

    #[test]
    fn alpha_is_dropped_on_conversion() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("clear.png");
        write_rgba_png(&src);
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let out = convert_image(&src, &out_dir, OutputFormat::Png, 80).unwrap();
        let converted = image::open(&out).unwrap();

        assert_eq!(out, out_dir.join("clear.png"));
        assert!(!converted.color().has_alpha());
        assert_eq!(converted.color(), ColorType::Rgb8);
        assert_eq!(converted.dimensions(), (20, 10));
    }

    #[test]
    fn rgba_source_converts_to_jpeg() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("logo.png");
        write_rgba_png(&src);
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let out = convert_image(&src, &out_dir, OutputFormat::Jpg, 75).unwrap();
        assert_eq!(out.extension().unwrap(), "jpg");
        assert!(!image::open(&out).unwrap().color().has_alpha());
    }

    #[test]
    fn float_tiff_converts_to_every_format() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("hdr.tiff");
        let hdr = image::Rgb32FImage::from_fn(8, 8, |x, y| Rgb([x as f32 / 8.0, y as f32 / 8.0, 0.5]));
        DynamicImage::ImageRgb32F(hdr).save(&src).unwrap();
        assert_eq!(decode(&src).unwrap().color(), ColorType::Rgb32F);

        for format in OutputFormat::all() {
            let out_dir = dir.path().join(format.extension());
            std::fs::create_dir(&out_dir).unwrap();

            let out = convert_image(&src, &out_dir, format, 80).unwrap();
            assert_eq!(image::open(&out).unwrap().dimensions(), (8, 8), "{:?}", format);
        }
    }

    #[test]
    fn corrupt_source_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("broken.png");
        std::fs::write(&src, b"definitely not a png").unwrap();

        let err = convert_image(&src, dir.path(), OutputFormat::Jpg, 80).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
        assert!(!dir.path().join("broken.jpg").exists());
    }

    #[test]
    fn missing_output_dir_is_reported() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("ok.png");
        write_rgba_png(&src);

        let err = convert_image(&src, &dir.path().join("nope"), OutputFormat::Bmp, 80).unwrap_err();
        assert!(matches!(err, ConvertError::CreateOutput { .. }));
    }

    #[test]
    fn preview_fits_thumbnail_box() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("wide.png");
        image::RgbImage::new(480, 240).save(&src).unwrap();

        match load_preview(&src) {
            Preview::Ready(img) => assert_eq!(img.size, [120, 60]),
            Preview::Unavailable(reason) => panic!("{}", reason),
        }
    }

    #[test]
    fn unreadable_preview_degrades() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("bad.jpg");
        std::fs::write(&src, b"junk").unwrap();
        assert!(matches!(load_preview(&src), Preview::Unavailable(_)));
    }
}

use image::{DynamicImage, ImageEncoder, ImageFormat, ImageResult};
use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use crate::error::{ConvertError, ConvertResult};

const ICO_MAX_SIDE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpg,
    Png,
    Webp,
    Ico,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Webp => "WebP",
            OutputFormat::Ico => "ICO",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Tiff => "TIFF",
        }
    }

    /// File extension and output subdirectory name.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Ico => "ico",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn all() -> [OutputFormat; 6] {
        [
            OutputFormat::Jpg,
            OutputFormat::Png,
            OutputFormat::Webp,
            OutputFormat::Ico,
            OutputFormat::Bmp,
            OutputFormat::Tiff,
        ]
    }

    /// Hover text for the quality slider.
    pub fn quality_hint(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "Set the JPEG quality level for output images.",
            OutputFormat::Webp => "WebP is saved lossless, so the quality level is ignored.",
            _ => "Only JPEG uses the quality level. PNG, WebP (lossless), ICO, BMP and TIFF ignore it.",
        }
    }
}

/// Encodes `img` to `path`. `quality` (1-100) is only honoured by lossy
/// encoders; the others accept and ignore it.
///
/// The image is encoded in memory first, so a failed encode never creates
/// or truncates the file at `path`.
pub fn export_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> ConvertResult<()> {
    let bytes = encode(img, format, quality).map_err(|source| ConvertError::Encode {
        format: format.as_str(),
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, bytes).map_err(|source| ConvertError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> ImageResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());

    match format {
        OutputFormat::Jpg => {
            let img = if img.color().has_alpha() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                to_8bit(img)
            };
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;
        }
        OutputFormat::Png => {
            let img = to_png_depth(img);
            let encoder = image::codecs::png::PngEncoder::new_with_quality(
                &mut out,
                image::codecs::png::CompressionType::Best,
                image::codecs::png::FilterType::Adaptive,
            );
            encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;
        }
        OutputFormat::Webp => {
            let img = to_8bit(img);
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut out);
            encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;
        }
        OutputFormat::Ico => {
            fit_ico(to_8bit(img)).write_to(&mut out, ImageFormat::Ico)?;
        }
        OutputFormat::Bmp => {
            to_8bit(img).write_to(&mut out, ImageFormat::Bmp)?;
        }
        OutputFormat::Tiff => {
            to_tiff_layout(img).write_to(&mut out, ImageFormat::Tiff)?;
        }
    }

    Ok(out.into_inner())
}

// JPEG, WebP, BMP and ICO only take 8-bit samples.
fn to_8bit(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img.clone(),
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

// PNG stores 8 or 16 bits per sample but no floats.
fn to_png_depth(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb16(img.to_rgb16())),
        DynamicImage::ImageRgba32F(_) => Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16())),
        other => Cow::Borrowed(other),
    }
}

// The TIFF encoder has no gray+alpha layout.
fn to_tiff_layout(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageLumaA8(_) => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
        DynamicImage::ImageLumaA16(_) => Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16())),
        other => Cow::Borrowed(other),
    }
}

fn fit_ico(img: DynamicImage) -> DynamicImage {
    if img.width() <= ICO_MAX_SIDE && img.height() <= ICO_MAX_SIDE {
        return img;
    }
    img.resize(ICO_MAX_SIDE, ICO_MAX_SIDE, image::imageops::FilterType::Lanczos3)
}

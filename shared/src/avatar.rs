use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageReader, Limits};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{AppError, ErrorKind};

pub const AVATAR_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("failed to decode image: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("jpeg encoding failed: width={width}, height={height}, reason={reason}")]
    JpegEncode {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("image too large: {width}x{height} = {pixels} pixels, max {max_pixels}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    #[error("input too large: {size} bytes, max {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    #[error("input bytes empty")]
    EmptyInput,

    #[error("unsupported image format")]
    UnsupportedFormat,
}

impl From<AvatarError> for AppError {
    fn from(e: AvatarError) -> Self {
        let kind = match &e {
            AvatarError::ImageTooLarge { .. } | AvatarError::InputTooLarge { .. } => {
                ErrorKind::ImageTooLarge
            }
            AvatarError::UnsupportedFormat => ErrorKind::ImageFormatUnsupported,
            AvatarError::Decode { .. } | AvatarError::JpegEncode { .. } | AvatarError::EmptyInput => {
                ErrorKind::ImageProcessing
            }
        };
        AppError::new(kind, "Could not prepare the selected photo").with_internal(e.to_string())
    }
}

/// Limits applied to picked photos before they are uploaded as avatars.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub max_input_bytes: usize,
    pub max_image_pixels: u64,
    pub max_alloc_bytes: u64,
    pub max_decode_dimension: u32,
    /// Longest side of the uploaded image.
    pub output_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: crate::MAX_AVATAR_INPUT_BYTES,
            max_image_pixels: 40_000_000,
            max_alloc_bytes: 256 * 1024 * 1024,
            max_decode_dimension: 10_000,
            output_dimension: crate::AVATAR_OUTPUT_DIMENSION,
            jpeg_quality: crate::AVATAR_JPEG_QUALITY,
        }
    }
}

/// Decodes a picked photo, downsizes it to fit `output_dimension` and
/// re-encodes it as a baseline JPEG. Metadata of the source is dropped.
#[instrument(skip(config, raw_bytes), fields(input_size = raw_bytes.len()))]
pub fn normalize_avatar(config: &AvatarConfig, raw_bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    let img = decode_image(config, raw_bytes).inspect_err(|e| {
        warn!(error = %e, "avatar decode rejected");
    })?;

    let (w, h) = img.dimensions();
    let img = if w > config.output_dimension || h > config.output_dimension {
        img.resize(
            config.output_dimension,
            config.output_dimension,
            FilterType::Triangle,
        )
    } else {
        img
    };

    let encoded = encode_jpeg(&img, config.jpeg_quality)?;
    debug!(
        source_width = w,
        source_height = h,
        output_size = encoded.len(),
        "avatar normalized"
    );
    Ok(encoded)
}

fn decode_image(config: &AvatarConfig, raw_bytes: &[u8]) -> Result<DynamicImage, AvatarError> {
    if raw_bytes.is_empty() {
        return Err(AvatarError::EmptyInput);
    }

    if raw_bytes.len() > config.max_input_bytes {
        return Err(AvatarError::InputTooLarge {
            size: raw_bytes.len(),
            max_size: config.max_input_bytes,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(raw_bytes))
        .with_guessed_format()
        .map_err(|e| AvatarError::Decode { source: e.into() })?;

    if reader.format().is_none() {
        return Err(AvatarError::UnsupportedFormat);
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_decode_dimension);
    limits.max_image_height = Some(config.max_decode_dimension);
    limits.max_alloc = Some(config.max_alloc_bytes);
    reader.limits(limits);

    let img = reader.decode()?;
    let (w, h) = img.dimensions();
    let pixels = u64::from(w) * u64::from(h);

    if pixels > config.max_image_pixels {
        return Err(AvatarError::ImageTooLarge {
            width: w,
            height: h,
            pixels,
            max_pixels: config.max_image_pixels,
        });
    }

    Ok(img)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, AvatarError> {
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    if width == 0 || height == 0 {
        return Err(AvatarError::JpegEncode {
            width,
            height,
            reason: "zero dimension".into(),
        });
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| AvatarError::JpegEncode {
            width,
            height,
            reason: e.to_string(),
        })?;

    if buffer.len() < 2 || buffer[0..2] != [0xFF, 0xD8] {
        return Err(AvatarError::JpegEncode {
            width,
            height,
            reason: "missing jpeg start-of-image marker".into(),
        });
    }

    Ok(buffer)
}

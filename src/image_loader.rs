//! # Image Sources
//!
//! Resolves an image `src` to its intrinsic pixel size. Layout only needs
//! the size (for `keep-ratio` and for images without declared dimensions),
//! so pixels are never decoded; the `image` crate reads the header.
//!
//! Supported `src` formats:
//! - `data:image/...;base64,...` data URIs
//! - file paths starting with `/`, `./` or `../`
//! - raw base64-encoded image data

use std::io::Cursor;

use crate::error::LayoutError;

/// Intrinsic size of an image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width_px: u32,
    pub height_px: u32,
}

pub fn image_info(src: &str) -> Result<ImageInfo, LayoutError> {
    let raw_bytes = read_source_bytes(src)?;
    decode_dimensions(&raw_bytes)
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, LayoutError> {
    if src.starts_with("data:image/") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| LayoutError::Image("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes; base64 payloads may contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src)
            .map_err(|e| LayoutError::Image(format!("Failed to read image file '{}': {}", src, e)));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, LayoutError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| LayoutError::Image(format!("Base64 decode error: {}", e)))
}

fn decode_dimensions(data: &[u8]) -> Result<ImageInfo, LayoutError> {
    if data.len() < 4 {
        return Err(LayoutError::Image("Image data too short".to_string()));
    }
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| LayoutError::Image(format!("Format detection error: {}", e)))?;
    if reader.format().is_none() {
        return Err(LayoutError::Image(
            "Unsupported image format (expected JPEG, PNG or WebP)".to_string(),
        ));
    }
    let (width_px, height_px) = reader
        .into_dimensions()
        .map_err(|e| LayoutError::Image(format!("Failed to read image dimensions: {}", e)))?;
    Ok(ImageInfo { width_px, height_px })
}

//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! single-channel intensity image every binarization strategy consumes,
//! alongside the RGB copy used as the annotation overlay base.

use image::{GrayImage, RgbImage};

use crate::types::SegmentError;

/// Decode raw image bytes and convert to grayscale.
///
/// The standard luminance formula is used for RGB-to-gray conversion:
/// `0.299*R + 0.587*G + 0.114*B`.
///
/// # Errors
///
/// Returns [`SegmentError::EmptyInput`] if `bytes` is empty.
/// Returns [`SegmentError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, SegmentError> {
    Ok(decode_rgb_and_grayscale(bytes)?.1)
}

/// Decode raw image bytes into an RGB overlay base and its grayscale
/// counterpart. Both share the same dimensions.
///
/// # Errors
///
/// Same as [`decode_and_grayscale`].
pub fn decode_rgb_and_grayscale(bytes: &[u8]) -> Result<(RgbImage, GrayImage), SegmentError> {
    if bytes.is_empty() {
        return Err(SegmentError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok((img.to_rgb8(), img.to_luma8()))
}

/// Reject images that have no pixels.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidInput`] carrying the offending
/// dimensions when either is zero.
pub const fn ensure_non_empty(width: u32, height: u32) -> Result<(), SegmentError> {
    if width == 0 || height == 0 {
        Err(SegmentError::InvalidInput { width, height })
    } else {
        Ok(())
    }
}

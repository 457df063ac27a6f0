//! Image to raster conversion.
//!
//! Turns a decoded image into a [`RasterImage`]: scale to the requested
//! width, composite onto white, threshold on luminance, pack MSB first.

use image::{imageops::FilterType, DynamicImage, Rgba};

use crate::error::{Error, Result};
use crate::protocol::raster::{pack_rows, RasterImage};

/// Narrowest raster the printer accepts: one byte per row.
pub const MIN_WIDTH: u32 = 8;

/// Luminance below this prints black.
pub const LUMINANCE_THRESHOLD: f32 = 128.0;

/// Alpha at or below this never prints.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Round a width down to a multiple of 8, never below [`MIN_WIDTH`].
///
/// # Example
///
/// ```
/// use thermal_printer_ble::imaging::rasterize::adjust_width;
///
/// assert_eq!(adjust_width(203), 200);
/// assert_eq!(adjust_width(3), 8);
/// ```
pub fn adjust_width(width: u32) -> u32 {
    (width - width % 8).max(MIN_WIDTH)
}

/// Output size for a source image: width capped at `max_width` and rounded
/// to a multiple of 8, height scaled to keep the aspect ratio.
pub fn target_dimensions(source_width: u32, source_height: u32, max_width: u32) -> (u32, u32) {
    let width = adjust_width(source_width.min(max_width));
    let height = (f64::from(source_height) * f64::from(width) / f64::from(source_width)).round();
    (width, (height as u32).max(1))
}

/// Blend a pixel over an opaque white background.
///
/// The result is always fully opaque, so transparent areas come out white
/// instead of black.
pub fn composite_on_white(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let alpha = u32::from(a);
    let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
    Rgba([blend(r), blend(g), blend(b), 255])
}

/// Whether a pixel prints: luminance below 128 and alpha above 128.
pub fn is_dark(pixel: Rgba<u8>) -> bool {
    let [r, g, b, a] = pixel.0;
    let luminance = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    luminance < LUMINANCE_THRESHOLD && a > ALPHA_THRESHOLD
}

/// Convert an image to a raster no wider than `max_width` dots.
///
/// # Errors
///
/// Returns [`Error::ImageDecode`] for empty images or when the scaled
/// result does not fit the 16-bit raster header.
pub fn rasterize(image: &DynamicImage, max_width: u32) -> Result<RasterImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::ImageDecode {
            reason: "image has no pixels".to_string(),
        });
    }

    let (width, height) = target_dimensions(image.width(), image.height(), max_width);
    let (raster_width, raster_height) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(Error::ImageDecode {
                reason: format!("image too large for raster: {}x{}", width, height),
            })
        }
    };

    let scaled = if (width, height) == (image.width(), image.height()) {
        image.to_rgba8()
    } else {
        image
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8()
    };

    let dark: Vec<bool> = scaled
        .pixels()
        .map(|p| is_dark(composite_on_white(*p)))
        .collect();

    RasterImage::new(raster_width, raster_height, pack_rows(&dark))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use proptest::prelude::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    #[test]
    fn test_black_image_is_all_ones() {
        let raster = rasterize(&solid(64, 10, [0, 0, 0, 255]), 384).unwrap();
        assert_eq!(raster.width(), 64);
        assert_eq!(raster.height(), 10);
        assert!(raster.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_white_image_is_all_zeros() {
        let raster = rasterize(&solid(40, 4, [255, 255, 255, 255]), 384).unwrap();
        assert!(raster.data().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_transparent_resolves_to_white() {
        let raster = rasterize(&solid(16, 2, [0, 0, 0, 0]), 384).unwrap();
        assert!(raster.data().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_scales_to_max_width() {
        let raster = rasterize(&solid(500, 100, [0, 0, 0, 255]), 250).unwrap();
        assert_eq!(raster.width(), 248);
        assert_eq!(raster.height(), 50);
        assert_eq!(raster.to_bytes().len(), 8 + 31 * 50);
    }

    #[test]
    fn test_dark_threshold() {
        assert!(is_dark(Rgba([127, 127, 127, 255])));
        assert!(!is_dark(Rgba([129, 129, 129, 255])));
        assert!(!is_dark(Rgba([0, 0, 0, 128])));
        assert!(is_dark(Rgba([0, 0, 0, 129])));
    }

    #[test]
    fn test_composite_half_transparent_black() {
        assert_eq!(composite_on_white(Rgba([0, 0, 0, 0])), Rgba([255, 255, 255, 255]));
        assert_eq!(composite_on_white(Rgba([0, 0, 0, 255])), Rgba([0, 0, 0, 255]));
        let half = composite_on_white(Rgba([0, 0, 0, 200]));
        assert_eq!(half.0[3], 255);
        assert!(is_dark(half));
    }

    proptest! {
        #[test]
        fn prop_adjusted_width_is_byte_aligned(width in 8u32..10_000) {
            let adjusted = adjust_width(width);
            prop_assert!(adjusted > 0);
            prop_assert_eq!(adjusted % 8, 0);
            prop_assert_eq!(adjusted, width - width % 8);
        }

        #[test]
        fn prop_header_width_matches(width in 8u32..160, height in 1u32..4) {
            let raster = rasterize(&solid(width, height, [0, 0, 0, 255]), width).unwrap();
            let header = raster.header();
            let width_bytes = u32::from(u16::from_le_bytes([header[4], header[5]]));
            prop_assert_eq!(width_bytes, (width - width % 8) / 8);
            prop_assert_eq!(raster.to_bytes().len(), 8 + (width_bytes * u32::from(raster.height())) as usize);
        }
    }
}

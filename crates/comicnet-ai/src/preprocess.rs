//! Image preprocessing: encoded bytes to a model-ready NHWC tensor.
//!
//! The pipeline is fixed and deterministic:
//!
//! 1. Decode with the `image` crate (any format it was built with)
//! 2. Flatten onto a white RGB canvas, so transparent regions become white
//! 3. Resize to exactly the model's width × height (aspect ratio is not kept)
//! 4. Lay out as `[1, height, width, 3]`, scaled to `[-1, 1]` for floating
//!    models or left as raw `u8` for quantized ones

use comicnet_core::{InputSize, NumericMode};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, RgbImage};

use crate::model::InputTensor;

/// Bicubic resampling.
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Decode, resize, flatten and normalize one image.
pub fn preprocess(
    bytes: &[u8],
    size: InputSize,
    mode: NumericMode,
) -> Result<InputTensor, ImageError> {
    let image = image::load_from_memory(bytes)?;
    let rgb = resize_onto_white(&image, size);
    Ok(to_input_tensor(&rgb, mode))
}

/// Composite onto white, then resize to exactly `size`.
///
/// Flattening first keeps the color of fully transparent pixels out of the
/// resampling kernel.
pub fn resize_onto_white(image: &DynamicImage, size: InputSize) -> RgbImage {
    let rgb = flatten_onto_white(image);
    imageops::resize(&rgb, size.width, size.height, RESIZE_FILTER)
}

/// Composite an image over an opaque white background.
///
/// Images without an alpha channel are only converted to 8-bit RGB.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        dst.0 = [over_white(r, a), over_white(g, a), over_white(b, a)];
    }
    out
}

/// `c·a + 255·(1 − a)` in 8-bit fixed point, rounded to nearest.
fn over_white(c: u8, a: u8) -> u8 {
    let (c, a) = (c as u32, a as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Lay out RGB pixels as a batch of one, `[1, height, width, 3]`.
pub fn to_input_tensor(rgb: &RgbImage, mode: NumericMode) -> InputTensor {
    let shape = vec![1, rgb.height() as i64, rgb.width() as i64, 3];
    let pixels = rgb.as_raw();
    match mode {
        NumericMode::Floating => InputTensor::F32 {
            shape,
            data: pixels.iter().map(|&v| normalize(v)).collect(),
        },
        NumericMode::Quantized => InputTensor::U8 {
            shape,
            data: pixels.clone(),
        },
    }
}

/// Map `[0, 255]` to `[-1, 1]`.
fn normalize(v: u8) -> f32 {
    (v as f32 - 127.5) / 127.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    fn size(width: u32, height: u32) -> InputSize {
        InputSize { width, height }
    }

    fn f32_data(t: InputTensor) -> Vec<f32> {
        match t {
            InputTensor::F32 { data, .. } => data,
            other => panic!("expected f32 tensor, got {other:?}"),
        }
    }

    fn u8_data(t: InputTensor) -> Vec<u8> {
        match t {
            InputTensor::U8 { data, .. } => data,
            other => panic!("expected u8 tensor, got {other:?}"),
        }
    }

    #[test]
    fn shape_is_batch_height_width_channels() {
        let bytes = solid_png(10, 10, [255, 0, 0]);
        let t = preprocess(&bytes, size(32, 24), NumericMode::Floating).unwrap();
        assert_eq!(t.shape(), &[1, 24, 32, 3]);
        assert_eq!(t.len(), 24 * 32 * 3);
    }

    #[test]
    fn white_and_black_normalize_to_extremes() {
        let white = preprocess(&solid_png(4, 4, [255; 3]), size(4, 4), NumericMode::Floating);
        let black = preprocess(&solid_png(4, 4, [0; 3]), size(4, 4), NumericMode::Floating);
        let white = f32_data(white.unwrap());
        let black = f32_data(black.unwrap());
        assert_ne!(white, black);
        assert!(white.iter().all(|&v| v == 1.0));
        assert!(black.iter().all(|&v| v == -1.0));
    }

    #[test]
    fn quantized_keeps_raw_pixels() {
        let bytes = solid_png(3, 3, [10, 128, 250]);
        let data = u8_data(preprocess(&bytes, size(3, 3), NumericMode::Quantized).unwrap());
        assert_eq!(data.len(), 27);
        for px in data.chunks(3) {
            assert_eq!(px, &[10, 128, 250]);
        }
    }

    #[test]
    fn upscaled_solid_color_stays_close() {
        let bytes = solid_png(10, 10, [255, 0, 0]);
        let data = u8_data(preprocess(&bytes, size(224, 224), NumericMode::Quantized).unwrap());
        for px in data.chunks(3) {
            assert!(px[0] >= 250, "red channel drifted: {px:?}");
            assert!(px[1] <= 5 && px[2] <= 5, "green/blue drifted: {px:?}");
        }
    }

    #[test]
    fn deterministic() {
        let mut img = RgbImage::new(17, 9);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb([(x * 15) as u8, (y * 28) as u8, ((x + y) * 7) as u8]);
        }
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);
        let a = preprocess(&bytes, size(8, 8), NumericMode::Floating).unwrap();
        let b = preprocess(&bytes, size(8, 8), NumericMode::Floating).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let rgb = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        assert_eq!(rgb.as_raw(), &vec![255, 255, 255, 0, 0, 255]);
    }

    #[test]
    fn fully_transparent_image_is_white_after_resize() {
        let img = RgbaImage::from_pixel(5, 7, Rgba([30, 60, 90, 0]));
        let bytes = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);
        let data = f32_data(preprocess(&bytes, size(4, 4), NumericMode::Floating).unwrap());
        assert!(data.iter().all(|&v| v > 0.99), "{data:?}");
    }

    #[test]
    fn hidden_color_does_not_bleed_into_downscale() {
        let mut img = RgbaImage::from_pixel(4, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(2, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(3, 0, Rgba([255, 255, 255, 255]));
        let rgb = resize_onto_white(&DynamicImage::ImageRgba8(img), size(1, 1));
        assert!(rgb.get_pixel(0, 0).0.iter().all(|&v| v >= 254), "{rgb:?}");
    }

    #[test]
    fn transparent_edge_blends_with_white_not_black() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        for y in 0..8 {
            for x in 4..8 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let bytes = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png);
        let data = u8_data(preprocess(&bytes, size(4, 1), NumericMode::Quantized).unwrap());
        for px in data.chunks(3) {
            assert!(px[0] >= 250, "red channel darkened: {data:?}");
        }
        assert!(data[..3].iter().all(|&v| v >= 250), "left edge not white: {data:?}");
        assert!(data[10] <= 5 && data[11] <= 5, "right edge not red: {data:?}");
    }

    #[test]
    fn half_alpha_blends_toward_white() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 100, 255, 128]));
        let rgb = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        assert_eq!(rgb.get_pixel(0, 0).0, [127, 177, 255]);
    }

    #[test]
    fn grayscale_expands_to_three_channels() {
        let img = image::GrayImage::from_pixel(2, 2, image::Luma([200]));
        let bytes = encode(DynamicImage::ImageLuma8(img), ImageFormat::Png);
        let data = u8_data(preprocess(&bytes, size(2, 2), NumericMode::Quantized).unwrap());
        assert_eq!(data, vec![200; 12]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = preprocess(b"definitely not an image", size(4, 4), NumericMode::Floating);
        assert!(err.is_err());
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let bytes = solid_png(8, 8, [1, 2, 3]);
        let err = preprocess(&bytes[..bytes.len() / 2], size(4, 4), NumericMode::Floating);
        assert!(err.is_err());
    }
}

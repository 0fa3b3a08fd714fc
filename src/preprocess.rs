use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{ColorType, DynamicImage, ImageFormat};
use ndarray::Array4;

use crate::error::ScanError;

/// Side length of the square VGG16 input.
pub const INPUT_SIZE: u32 = 224;

/// ImageNet channel means in BGR order, subtracted by VGG16's `preprocess_input`.
pub const BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// Decodes an uploaded file. Only JPEG and PNG are accepted.
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage, ScanError> {
    let format = image::guess_format(bytes).map_err(|_| ScanError::UnsupportedFormat)?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png => {
            Ok(image::load_from_memory_with_format(bytes, format)?)
        }
        _ => Err(ScanError::UnsupportedFormat),
    }
}

/// Turns an arbitrary image into the `[1, 224, 224, 3]` BGR tensor the model expects.
#[derive(Debug)]
pub struct Preprocessor {
    resize_options: ResizeOptions,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            // Bicubic, no cropping: non-square inputs are stretched.
            resize_options: ResizeOptions {
                algorithm: ResizeAlg::Convolution(FilterType::CatmullRom),
                mul_div_alpha: false,
                ..Default::default()
            },
        }
    }
}

impl Preprocessor {
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>, ScanError> {
        // Alpha is dropped, gray is replicated into three channels
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut resized = DynamicImage::new(INPUT_SIZE, INPUT_SIZE, ColorType::Rgb8);
        Resizer::new()
            .resize(&rgb, &mut resized, &self.resize_options)
            .map_err(|e| ScanError::Preprocess(e.to_string()))?;
        let resized = resized.into_rgb8();

        let size = INPUT_SIZE as usize;
        let mut input = Array4::zeros((1, size, size, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            let [r, g, b] = pixel.0;
            input[[0, y, x, 0]] = (b as f32) - BGR_MEAN[0];
            input[[0, y, x, 1]] = (g as f32) - BGR_MEAN[1];
            input[[0, y, x, 2]] = (r as f32) - BGR_MEAN[2];
        }
        Ok(input)
    }
}

pub fn preprocess(image: &DynamicImage) -> Result<Array4<f32>, ScanError> {
    Preprocessor::default().preprocess(image)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn assert_uniform(input: &Array4<f32>, bgr: [u8; 3]) {
        for ((_, _, _, c), value) in input.indexed_iter() {
            let expected = bgr[c] as f32 - BGR_MEAN[c];
            assert!(
                (value - expected).abs() <= 1.01,
                "channel {c}: {value} != {expected}"
            );
        }
    }

    #[test]
    fn any_size_becomes_fixed_shape() {
        for (w, h) in [(1, 1), (224, 224), (640, 480), (31, 517), (1000, 3)] {
            let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])));
            let input = preprocess(&image).unwrap();
            assert_eq!(input.shape(), &[1, 224, 224, 3], "{w}x{h}");
        }
    }

    #[test]
    fn subtracts_means_in_bgr_order() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([200, 100, 50])));
        let input = preprocess(&image).unwrap();
        assert_uniform(&input, [50, 100, 200]);
        assert!((input[[0, 0, 0, 0]] - (50. - 103.939)).abs() <= 1.01);
        assert!((input[[0, 223, 223, 2]] - (200. - 123.68)).abs() <= 1.01);
    }

    #[test]
    fn exact_size_input_is_not_altered() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(224, 224, |x, y| {
            Rgb([x as u8, y as u8, 7])
        }));
        let input = preprocess(&image).unwrap();
        assert_eq!(input[[0, 5, 9, 0]], 7. - BGR_MEAN[0]);
        assert_eq!(input[[0, 5, 9, 1]], 5. - BGR_MEAN[1]);
        assert_eq!(input[[0, 5, 9, 2]], 9. - BGR_MEAN[2]);
    }

    #[test]
    fn grayscale_is_replicated() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 80, Luma([128])));
        let input = preprocess(&image).unwrap();
        assert_uniform(&input, [128, 128, 128]);
    }

    #[test]
    fn alpha_is_discarded() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([0, 255, 0, 0])));
        let input = preprocess(&image).unwrap();
        assert_uniform(&input, [0, 255, 0]);
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(97, 311, |x, y| {
            Rgb([(x * 3) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }));
        assert_eq!(preprocess(&image).unwrap(), preprocess(&image).unwrap());
    }

    #[test]
    fn decodes_png_and_jpeg() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([1, 2, 3])));

        let png = decode_upload(&encode(&image, ImageFormat::Png)).unwrap();
        assert_eq!((png.width(), png.height()), (40, 30));

        let jpeg = decode_upload(&encode(&image, ImageFormat::Jpeg)).unwrap();
        assert_eq!((jpeg.width(), jpeg.height()), (40, 30));
        assert_eq!(preprocess(&jpeg).unwrap().shape(), &[1, 224, 224, 3]);
    }

    #[test]
    fn rejects_other_formats() {
        assert!(matches!(
            decode_upload(b"GIF89a\x01\x00\x01\x00"),
            Err(ScanError::UnsupportedFormat)
        ));
        assert!(matches!(
            decode_upload(b"just some text"),
            Err(ScanError::UnsupportedFormat)
        ));
        assert!(matches!(decode_upload(&[]), Err(ScanError::UnsupportedFormat)));
    }

    #[test]
    fn corrupt_png_fails_to_decode() {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let err = decode_upload(&bytes).unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
        assert!(err.is_client_error());
    }
}

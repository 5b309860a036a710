use crate::error::InferenceError;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use ndarray::{Array, Array4, Axis};
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

/// Decodes with the format sniffed from the content and turns the raster
/// upright according to any EXIF orientation tag.
fn decode_upright<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<RgbImage, InferenceError> {
    let mut decoder = reader.with_guessed_format()?.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img.to_rgb8())
}

/// Opens an image file and converts it to 8-bit RGB. The extension does not
/// have to match the content.
pub fn open(path: impl AsRef<Path>) -> Result<RgbImage, InferenceError> {
    decode_upright(ImageReader::open(path)?)
}

/// Decodes raw bytes into 8-bit RGB.
pub fn decode(buffer: &[u8]) -> Result<RgbImage, InferenceError> {
    decode_upright(ImageReader::new(Cursor::new(buffer)))
}

/// Converts an RGB image into a `[1, 3, H, W]` tensor scaled to `[0, 1]`.
pub fn to_tensor(img: &RgbImage) -> Result<Array4<f32>, InferenceError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(InferenceError::PreprocessingError(
            "image has no pixels".to_string(),
        ));
    }

    let data: Vec<f32> = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();

    // Pixels arrive as [H, W, C]
    let array = Array::from_shape_vec((height as usize, width as usize, 3), data)
        .map_err(|e| InferenceError::PreprocessingError(e.to_string()))?;

    let array = array.permuted_axes([2, 0, 1]).insert_axis(Axis(0));

    Ok(array.as_standard_layout().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_open_nonexistent_file() {
        match open("nonexistent.jpg") {
            Err(InferenceError::Io(_)) => {}
            _ => panic!("Expected Io error for nonexistent file"),
        }
    }

    #[test]
    fn test_open_ignores_misleading_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        std::fs::write(&path, png_bytes(&RgbImage::new(6, 4))).unwrap();
        assert_eq!(open(&path).unwrap().dimensions(), (6, 4));
    }

    /// JPEG of `img` with an APP1 EXIF block carrying `Orientation = value`.
    fn jpeg_with_orientation(img: &RgbImage, value: u8) -> Vec<u8> {
        let mut jpeg = Vec::new();
        img.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        // big-endian TIFF header, first IFD at offset 8
        app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        // one entry: tag 0x0112 (Orientation), SHORT, count 1
        app1.extend_from_slice(&[0x00, 0x01, 0x01, 0x12, 0x00, 0x03]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x00, value, 0x00, 0x00]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        // right after SOI
        let rest = jpeg.split_off(2);
        jpeg.extend(app1);
        jpeg.extend(rest);
        jpeg
    }

    #[test]
    fn test_exif_orientation_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phone.jpg");
        let img = RgbImage::from_pixel(16, 8, image::Rgb([200, 200, 200]));
        let jpeg = jpeg_with_orientation(&img, 6);
        std::fs::write(&path, &jpeg).unwrap();

        // rotated 90 degrees clockwise: width and height swap
        assert_eq!(open(&path).unwrap().dimensions(), (8, 16));
        assert_eq!(decode(&jpeg).unwrap().dimensions(), (8, 16));
    }

    #[test]
    fn test_normal_orientation_keeps_dimensions() {
        let img = RgbImage::from_pixel(16, 8, image::Rgb([10, 10, 10]));
        let jpeg = jpeg_with_orientation(&img, 1);
        assert_eq!(decode(&jpeg).unwrap().dimensions(), (16, 8));
    }

    #[test]
    fn test_decode_invalid_bytes() {
        match decode(b"invalid image data") {
            Err(InferenceError::ImageError(_)) => {}
            _ => panic!("Expected ImageError"),
        }
    }

    #[test]
    fn test_decode_keeps_dimensions() {
        let img = RgbImage::new(13, 7);
        let decoded = decode(&png_bytes(&img)).unwrap();
        assert_eq!(decoded.dimensions(), (13, 7));
    }

    #[test]
    fn test_tensor_shape_is_channel_first() {
        let img = RgbImage::new(5, 3);
        let tensor = to_tensor(&img).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 3, 5]);
    }

    #[test]
    fn test_tensor_values_scaled_per_channel() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([255, 0, 51]));

        let tensor = to_tensor(&img).unwrap();
        assert_eq!(tensor[[0, 0, 0, 1]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 1]], 0.0);
        assert!((tensor[[0, 2, 0, 1]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 0, 1, 1]], 0.0);
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = RgbImage::new(0, 0);
        assert!(matches!(
            to_tensor(&img),
            Err(InferenceError::PreprocessingError(_))
        ));
    }
}

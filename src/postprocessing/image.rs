use crate::error::InferenceError;
use image::{ImageFormat, RgbImage};
use ndarray::{s, Array4, ArrayView4, Axis};
use std::path::Path;

/// Drops padding added before the forward pass.
pub fn crop(
    tensor: &Array4<f32>,
    height: usize,
    width: usize,
) -> Result<ArrayView4<'_, f32>, InferenceError> {
    let (_, _, h, w) = tensor.dim();
    if h < height || w < width {
        return Err(InferenceError::ShapeMismatch {
            expected: vec![1, 3, height, width],
            got: tensor.shape().to_vec(),
        });
    }
    Ok(tensor.slice(s![.., .., ..height, ..width]))
}

/// Converts a `[1, 3, H, W]` tensor to RGB8, clamping to `[0, 1]` and
/// rounding to the nearest level.
pub fn to_image(tensor: ArrayView4<'_, f32>) -> Result<RgbImage, InferenceError> {
    let (n, c, h, w) = tensor.dim();
    if n != 1 || c != 3 {
        return Err(InferenceError::ShapeMismatch {
            expected: vec![1, 3, h, w],
            got: tensor.shape().to_vec(),
        });
    }

    let hwc = tensor.index_axis_move(Axis(0), 0).permuted_axes([1, 2, 0]);
    let pixels: Vec<u8> = hwc
        .iter()
        .map(|&v| {
            let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
            (v * 255.0).round() as u8
        })
        .collect();

    RgbImage::from_raw(w as u32, h as u32, pixels).ok_or_else(|| {
        InferenceError::PreprocessingError("pixel buffer does not match image size".to_string())
    })
}

/// Writes an image, picking the encoder from the file extension.
pub fn save(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), InferenceError> {
    let path = path.as_ref();
    ImageFormat::from_path(path)?;
    img.save(path)?;
    Ok(())
}

/// Encodes an image as PNG in memory.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, InferenceError> {
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

//! The restore routine: image -> tensor -> network -> tensor -> image.

use crate::error::InferenceError;
use crate::model::Restorer;
use crate::postprocessing::image as post;
use crate::preprocessing::{image as pre, padding};
use image::RgbImage;
use metrics::histogram;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Restores an in-memory RGB image.
pub fn restore_image(
    restorer: &dyn Restorer,
    img: &RgbImage,
    pad_multiple: usize,
) -> Result<RgbImage, InferenceError> {
    let (width, height) = img.dimensions();
    let (h, w) = (height as usize, width as usize);

    let input = pre::to_tensor(img)?;
    let input = padding::pad_to_multiple(&input, pad_multiple);

    let start = Instant::now();
    let output = restorer.restore(input)?;
    let elapsed = start.elapsed();
    histogram!("derain_inference_seconds").record(elapsed.as_secs_f64());
    info!(
        width,
        height,
        inference_ms = elapsed.as_secs_f64() * 1000.0,
        "Restored image"
    );

    post::to_image(post::crop(&output, h, w)?)
}

/// Restores the image at `input_path` and writes the result into
/// `output_dir` under the same file name. Returns the written path.
pub fn process_image(
    restorer: &dyn Restorer,
    input_path: &Path,
    output_dir: &Path,
    pad_multiple: usize,
) -> Result<PathBuf, InferenceError> {
    let file_name = input_path.file_name().ok_or_else(|| {
        InferenceError::PreprocessingError(format!(
            "input path has no file name: {}",
            input_path.display()
        ))
    })?;

    let img = pre::open(input_path)?;
    let restored = restore_image(restorer, &img, pad_multiple)?;

    let output_path = output_dir.join(file_name);
    post::save(&restored, &output_path)?;
    Ok(output_path)
}

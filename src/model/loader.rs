use crate::error::InferenceError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{debug, info};

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), InferenceError> {
    let committed = ort::init().with_name("derainx").commit()?;
    debug!(committed, "ONNX Runtime environment initialised");
    Ok(())
}

fn load_error(e: impl std::fmt::Display) -> InferenceError {
    InferenceError::ModelLoad(e.to_string())
}

/// Loads an ONNX model from disk and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
/// * `intra_threads` - Threads used within a single operator
pub fn load_model(
    model_path: impl AsRef<Path>,
    intra_threads: usize,
) -> Result<Session, InferenceError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(InferenceError::ModelNotFound(path.display().to_string()));
    }

    let session = Session::builder()
        .map_err(load_error)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(load_error)?
        .with_intra_threads(intra_threads.max(1))
        .map_err(load_error)?
        .commit_from_file(path)
        .map_err(load_error)?;

    info!(path = %path.display(), "Loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        debug!(index = i, name = %input.name, kind = ?input.input_type, "Model input");
    }
    for (i, output) in session.outputs.iter().enumerate() {
        debug!(index = i, name = %output.name, kind = ?output.output_type, "Model output");
    }

    Ok(session)
}

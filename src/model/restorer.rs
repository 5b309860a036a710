use crate::error::InferenceError;
use ndarray::{Array4, ArrayD, Ix4};
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// A pretrained image-to-image network.
///
/// Takes a `[1, 3, H, W]` tensor with values in `[0, 1]` and returns a tensor
/// of the same layout. Implementations must be shareable across request tasks.
pub trait Restorer: Send + Sync {
    fn restore(&self, input: Array4<f32>) -> Result<Array4<f32>, InferenceError>;
}

/// Restorer backed by an ONNX Runtime session.
pub struct OnnxRestorer {
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxRestorer {
    pub fn new(session: Session) -> Result<Self, InferenceError> {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| InferenceError::ModelLoad("model declares no inputs".to_string()))?;
        if session.outputs.is_empty() {
            return Err(InferenceError::ModelLoad("model declares no outputs".to_string()));
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl Restorer for OnnxRestorer {
    fn restore(&self, input: Array4<f32>) -> Result<Array4<f32>, InferenceError> {
        let shape = input.shape().to_vec();
        let data: Vec<f32> = input.as_standard_layout().iter().copied().collect();
        let input_value = Tensor::from_array((shape.clone(), data.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Worker("model session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let (out_shape, out_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&x| x as usize).collect();
        debug!(input = ?shape, output = ?dims, "Forward pass complete");

        if dims.len() != 4 || dims[0] != 1 || dims[1] != 3 {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![1, 3, shape[2], shape[3]],
                got: dims,
            });
        }

        let output = ArrayD::from_shape_vec(dims, out_data.to_vec())?;
        Ok(output.into_dimensionality::<Ix4>()?)
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl IntoResponse for InferenceError {
    fn into_response(self) -> Response {
        let status = match self {
            InferenceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            InferenceError::NotFound(_) => StatusCode::NOT_FOUND,
            InferenceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => {
                tracing::error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found_error() {
        let error = InferenceError::ModelNotFound("test_path".to_string());
        assert_eq!(error.to_string(), "Model not found at path: test_path");
    }

    #[test]
    fn test_shape_mismatch_error() {
        let error = InferenceError::ShapeMismatch {
            expected: vec![1, 3, 16, 16],
            got: vec![1, 1, 16, 16],
        };
        assert_eq!(
            error.to_string(),
            "Output shape mismatch: expected [1, 3, 16, 16], got [1, 1, 16, 16]"
        );
    }

    #[test]
    fn test_bad_request_message_is_verbatim() {
        let error = InferenceError::BadRequest("No file uploaded".to_string());
        assert_eq!(error.to_string(), "No file uploaded");
    }

    #[test]
    fn test_shape_error_conversion() {
        let shape_error = ShapeError::from_kind(ndarray::ErrorKind::OutOfBounds);
        let inference_error = InferenceError::from(shape_error);
        assert!(matches!(inference_error, InferenceError::ShapeError(_)));
    }

    #[test]
    fn test_image_error_conversion() {
        let image_error =
            image::ImageError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));
        let inference_error = InferenceError::from(image_error);
        assert!(matches!(inference_error, InferenceError::ImageError(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let inference_error = InferenceError::from(io_error);
        assert!(matches!(inference_error, InferenceError::Io(_)));
    }

    #[test]
    fn test_into_response_status_codes() {
        let response = InferenceError::BadRequest("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = InferenceError::NotFound("x.png".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = InferenceError::PayloadTooLarge("limit".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = InferenceError::PreprocessingError("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = InferenceError::ModelNotFound("m.onnx".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

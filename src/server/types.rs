use crate::model::Restorer;
use crate::storage::Storage;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub restorer: Arc<dyn Restorer>,
    pub storage: Storage,
    pub pad_multiple: usize,
    pub metrics: PrometheusHandle,
}

// --- DTOs (Data Transfer Objects) ---

/// Reply to a multipart upload; both entries are URLs under `/static`.
#[derive(Serialize, Deserialize, Debug)]
pub struct DetectResponse {
    pub input_image: String,
    pub output_image: String,
}

#[derive(Deserialize)]
pub struct RestoreRequest {
    /// Base64 encoded image data
    pub image: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RestoreResponse {
    /// Base64 encoded PNG
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub inference_time_ms: f64,
}

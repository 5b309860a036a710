use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use metrics::counter;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::error::InferenceError;
use crate::pipeline;
use crate::postprocessing::image as post;
use crate::preprocessing::image as pre;
use crate::server::types::*;
use crate::storage::sanitize_file_name;

const INDEX_HTML: &str = include_str!("../../static/index.html");
const SCRIPT_JS: &str = include_str!("../../static/script.js");

pub const UPLOADS_URL: &str = "/static/uploads";
pub const RESULTS_URL: &str = "/static/results";

/// Characters escaped in a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// RFC 5987 `attr-char` complement, for `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// URL under `base` for a stored file.
pub fn file_url(base: &str, name: &str) -> String {
    format!("{}/{}", base, utf8_percent_encode(name, PATH_SEGMENT))
}

/// `Content-Disposition` value with an ASCII fallback name and the exact
/// UTF-8 name.
pub fn attachment_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(name, ATTR_CHAR)
    )
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], SCRIPT_JS)
}

pub async fn render_metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}

fn record_failure(route: &'static str) {
    counter!("derain_failures_total", "route" => route).increment(1);
}

/// Keeps the body-limit rejection distinct from malformed forms.
fn multipart_error(e: MultipartError) -> InferenceError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        InferenceError::PayloadTooLarge(e.body_text())
    } else {
        InferenceError::BadRequest(e.body_text())
    }
}

/// Pulls the `file` field out of a multipart form.
async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, Bytes)>, InferenceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        return Ok(Some((file_name, data)));
    }
    Ok(None)
}

async fn run_detect(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<DetectResponse, InferenceError> {
    let (file_name, data) = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| InferenceError::BadRequest("No file uploaded".to_string()))?;
    if file_name.is_empty() {
        return Err(InferenceError::BadRequest("No selected file".to_string()));
    }
    let file_name = sanitize_file_name(&file_name)?;
    info!(file = %file_name, size = data.len(), "Received upload");

    let input_path = state.storage.save_upload(&file_name, &data).await?;

    // CPU-bound; keep it off the async workers
    let restorer = Arc::clone(&state.restorer);
    let output_dir = state.storage.output_dir().to_path_buf();
    let pad_multiple = state.pad_multiple;
    let output_path = tokio::task::spawn_blocking(move || {
        pipeline::process_image(restorer.as_ref(), &input_path, &output_dir, pad_multiple)
    })
    .await
    .map_err(|e| InferenceError::Worker(e.to_string()))??;

    let output_name = output_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    Ok(DetectResponse {
        input_image: file_url(UPLOADS_URL, &file_name),
        output_image: file_url(RESULTS_URL, &output_name),
    })
}

/// Multipart upload: saves the file, restores it, and points at both copies.
pub async fn detect(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, InferenceError> {
    counter!("derain_requests_total", "route" => "detect").increment(1);
    run_detect(&state, multipart)
        .await
        .map(Json)
        .inspect_err(|_| record_failure("detect"))
}

async fn run_restore(
    state: &AppState,
    payload: RestoreRequest,
) -> Result<RestoreResponse, InferenceError> {
    let image_bytes = general_purpose::STANDARD
        .decode(payload.image.trim())
        .map_err(|e| InferenceError::BadRequest(format!("Base64 decode failed: {}", e)))?;
    if image_bytes.is_empty() {
        return Err(InferenceError::BadRequest("Empty image".to_string()));
    }

    let start = Instant::now();
    let restorer = Arc::clone(&state.restorer);
    let pad_multiple = state.pad_multiple;
    let restored = tokio::task::spawn_blocking(move || {
        let img = pre::decode(&image_bytes)?;
        pipeline::restore_image(restorer.as_ref(), &img, pad_multiple)
    })
    .await
    .map_err(|e| InferenceError::Worker(e.to_string()))??;
    let duration = start.elapsed();

    let png = post::encode_png(&restored)?;
    Ok(RestoreResponse {
        image: general_purpose::STANDARD.encode(png),
        width: restored.width(),
        height: restored.height(),
        inference_time_ms: duration.as_secs_f64() * 1000.0,
    })
}

/// JSON variant of `detect` that never touches the disk.
pub async fn restore(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RestoreRequest>,
) -> Result<Json<RestoreResponse>, InferenceError> {
    counter!("derain_requests_total", "route" => "restore").increment(1);
    run_restore(&state, payload)
        .await
        .map(Json)
        .inspect_err(|_| record_failure("restore"))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, InferenceError> {
    let name = sanitize_file_name(&filename)?;
    let bytes = state.storage.read_output(&name).await?;

    let content_type = image::ImageFormat::from_path(&name)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    let disposition = HeaderValue::from_str(&attachment_disposition(&name))
        .map_err(|e| InferenceError::BadRequest(format!("Invalid file name: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

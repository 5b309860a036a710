use crate::server::handlers::{self, RESULTS_URL, UPLOADS_URL};
use crate::server::types::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let uploads = ServeDir::new(state.storage.upload_dir());
    let results = ServeDir::new(state.storage.output_dir());
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::render_metrics))
        .route("/api/detect", post(handlers::detect))
        .route("/api/restore", post(handlers::restore))
        .route("/download/:filename", get(handlers::download))
        .route("/static/script.js", get(handlers::script))
        .nest_service(UPLOADS_URL, uploads)
        .nest_service(RESULTS_URL, results)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use clap::Parser;
use derainx::cli::{Cli, Commands};
use derainx::{config, model, pipeline, server, storage::Storage};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

fn load_restorer(config: &config::ModelConfig) -> anyhow::Result<Arc<dyn model::Restorer>> {
    model::loader::init_ort()?;
    info!(name = %config.name, path = %config.path.display(), "Loading model");
    let session = model::loader::load_model(&config.path, config.intra_threads)?;
    Ok(Arc::new(model::OnnxRestorer::new(session)?))
}

async fn serve(config: config::AppConfig) -> anyhow::Result<()> {
    let metrics = PrometheusBuilder::new().install_recorder()?;

    let storage = Storage::new(&config.storage);
    storage.ensure_dirs()?;

    // Built once, shared read-only for the lifetime of the process
    let restorer = load_restorer(&config.model)?;

    let state = server::AppState {
        restorer,
        storage,
        pad_multiple: config.model.pad_multiple,
        metrics,
    };
    let app = server::create_router(state, config.server.max_upload_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(url = %format!("http://{}", addr), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

fn restore_file(config: config::AppConfig, input: &Path, output: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(output)?;
    let restorer = load_restorer(&config.model)?;
    let written =
        pipeline::process_image(restorer.as_ref(), input, output, config.model.pad_multiple)?;
    info!(path = %written.display(), "Wrote restored image");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "derainx=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config::AppConfig::load(&cli.config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Restore { input, output } => {
            tokio::task::spawn_blocking(move || restore_file(config, &input, &output)).await?
        }
    }
}

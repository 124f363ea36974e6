use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use site_host::{
    api,
    config::{Config, StorageBackend},
    registry::Registry,
    serve::SitePipeline,
    site_store::{LocalStore, S3Store, SiteStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "site-host starting");

    // Load configuration
    let config = Config::load()?;

    // Open the project registry
    let registry = Registry::open(&config.data_dir)?;
    info!("Registry opened at: {}", config.data_dir);

    // Initialize the storage backend, chosen once at startup
    let store: Arc<dyn SiteStore> = match config.storage.backend {
        StorageBackend::Local => {
            let store = LocalStore::new(&config.storage.local_storage_path)?;
            info!(
                "Using local storage backend at: {}",
                config.storage.local_storage_path
            );
            Arc::new(store)
        }
        StorageBackend::S3 => {
            let bucket = config
                .storage
                .s3_bucket
                .as_deref()
                .expect("S3_BUCKET validated in config");
            let access_key = config
                .storage
                .s3_access_key_id
                .as_deref()
                .expect("S3_ACCESS_KEY_ID validated in config");
            let secret_key = config
                .storage
                .s3_secret_access_key
                .as_deref()
                .expect("S3_SECRET_ACCESS_KEY validated in config");
            let store = S3Store::new(
                &config.storage.s3_endpoint,
                &config.storage.s3_region,
                bucket,
                access_key,
                secret_key,
            )?;
            info!(
                "Using S3 storage backend, bucket: {} at {}",
                bucket, config.storage.s3_endpoint
            );
            Arc::new(store)
        }
    };

    let pipeline = SitePipeline::new(Arc::new(registry.clone()), Arc::clone(&store));

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        registry,
        store,
        pipeline,
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on: {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

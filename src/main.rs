use std::sync::Arc;

use anyhow::{Context, Result};
use sitecms::{
    AppState, build_router,
    config::AppConfig,
    storage::{DocumentStore, MemoryStore},
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "sitecms=debug,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let config = AppConfig::from_env().context("could not read configuration")?;
    let store = open_store_or_exit(&config.store_url);

    let state = AppState::from_config(store, &config);
    state
        .uploads
        .ensure_dirs()
        .await
        .with_context(|| format!("could not prepare {}", state.uploads.root().display()))?;
    info!(
        upload_dir = %state.uploads.root().display(),
        max_upload_bytes = state.uploads.max_bytes(),
        field_policy = ?state.pages.policy(),
        "content service ready"
    );

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not listen on {addr}"))?;
    info!(address = %addr, "sitecms listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("http server stopped with an error")?;

    info!("sitecms stopped");
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Without a store there is nothing to serve; log the cause and exit with 1.
fn open_store_or_exit(url: &str) -> Arc<dyn DocumentStore> {
    match MemoryStore::open(url) {
        Ok(store) => {
            if !store.is_persistent() {
                warn!(store_url = %url, "content is kept in memory only");
            }
            info!(store_url = %url, "document store opened");
            Arc::new(store)
        }
        Err(err) => {
            error!(store_url = %url, error = %err, "could not open document store");
            std::process::exit(1);
        }
    }
}

async fn wait_for_shutdown() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            error!("SIGTERM handler unavailable");
            return std::future::pending::<()>().await;
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("interrupt received, draining connections"),
        () = terminate => info!("SIGTERM received, draining connections"),
    }
}

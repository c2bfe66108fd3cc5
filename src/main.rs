use sipscope::application::SessionSearchService;
use sipscope::config::Config;
use sipscope::domain::attribute::StoreAttributeCatalog;
use sipscope::infrastructure::store::InMemorySessionStore;
use sipscope::interface::api::{build_router, init_metrics, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting SipScope session search service");

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded: {:?}", config);

    // Embedded store; records are expected to be indexed by an external
    // capture pipeline
    let store = Arc::new(InMemorySessionStore::new());
    info!("Embedded session store initialized");

    let catalog = Arc::new(StoreAttributeCatalog::new(store.clone()));
    let search_service = Arc::new(SessionSearchService::new(
        store.clone(),
        catalog.clone(),
        config.session.correlation(),
    ));

    // Initialize metrics exporter
    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics();

    let state = AppState {
        search_service,
        attribute_catalog: catalog,
    };
    let app = build_router(state, prometheus_handle);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    info!(
        "REST API server started on {}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

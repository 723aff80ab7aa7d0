//! kart-highscores binary entrypoint wiring configuration, storage and the REST layer.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use kart_highscores::{
    config::{AppConfig, StorageBackend},
    dao::document_store::memory::MemoryDocumentStore,
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config.reference_policy, config.api_prefix.clone());

    start_storage(&config, app_state.clone()).await?;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, prefix = %config.api_prefix, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the configured document store.
///
/// Database backends are connected by the storage supervisor in the
/// background; the API answers 503 until the first connection succeeds.
async fn start_storage(config: &AppConfig, state: SharedState) -> anyhow::Result<()> {
    match config.storage {
        StorageBackend::Memory => {
            info!("using in-memory storage; data is lost on restart");
            state
                .install_document_store(Arc::new(MemoryDocumentStore::new()))
                .await;
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            let settings = config.mongo.clone();
            info!(uri = %settings.uri, database = %settings.database, "using MongoDB storage");
            tokio::spawn(kart_highscores::services::storage_supervisor::run(
                state,
                move || backends::connect_mongo(settings.clone()),
            ));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            let settings = config.couch.clone();
            info!(url = %settings.base_url, database = %settings.database, "using CouchDB storage");
            tokio::spawn(kart_highscores::services::storage_supervisor::run(
                state,
                move || backends::connect_couch(settings.clone()),
            ));
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("storage backend {other:?} is not compiled into this binary"),
    }
    Ok(())
}

mod backends {
    #[cfg(any(feature = "mongo-store", feature = "couch-store"))]
    use std::sync::Arc;

    #[cfg(any(feature = "mongo-store", feature = "couch-store"))]
    use kart_highscores::dao::{document_store::DocumentStore, storage::StorageError};

    #[cfg(feature = "mongo-store")]
    pub async fn connect_mongo(
        settings: kart_highscores::config::MongoSettings,
    ) -> Result<Arc<dyn DocumentStore>, StorageError> {
        use kart_highscores::dao::document_store::mongodb::{MongoConfig, MongoDocumentStore};

        let config = MongoConfig::from_uri(&settings.uri, Some(&settings.database)).await?;
        let store = MongoDocumentStore::connect(config).await?;
        Ok(Arc::new(store))
    }

    #[cfg(feature = "couch-store")]
    pub async fn connect_couch(
        settings: kart_highscores::config::CouchSettings,
    ) -> Result<Arc<dyn DocumentStore>, StorageError> {
        use kart_highscores::dao::document_store::couchdb::{CouchConfig, CouchDocumentStore};

        let mut config = CouchConfig::new(settings.base_url, settings.database);
        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            config = config.with_credentials(username, password);
        }
        let store = CouchDocumentStore::connect(config).await?;
        Ok(Arc::new(store))
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

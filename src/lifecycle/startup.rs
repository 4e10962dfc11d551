//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the store from its storage file
//! - Register the API routes against it
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::api;
use crate::config::AppConfig;
use crate::error::{RouteError, StoreError};
use crate::http::HttpServer;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to register routes: {0}")]
    Routes(#[from] RouteError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to start serving.
pub struct Application {
    pub store: Arc<Store>,
    pub server: HttpServer,
    pub listener: TcpListener,
}

/// Build the application described by `config` and bind its listener.
pub async fn bootstrap(config: AppConfig) -> Result<Application, StartupError> {
    let store = Arc::new(Store::open(&config.storage).await?);
    tracing::info!(path = ?store.path(), "Store opened");

    let router = api::routes(store.clone())?.with_body_limit(config.limits.max_body_size);
    tracing::debug!(routes = router.len(), "Routes registered");

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = HttpServer::new(config, router);

    Ok(Application {
        store,
        server,
        listener,
    })
}

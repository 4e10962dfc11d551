//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use jsontable::config::{AppConfig, InsertPersistence};
use jsontable::lifecycle::{self, Application, Shutdown};
use jsontable::Store;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// A running server with its own storage file.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<Store>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn users(&self) -> jsontable_sdk::UsersClient {
        jsontable_sdk::UsersClient::with_client(&self.base_url(), client())
    }

    pub fn storage_path(&self) -> std::path::PathBuf {
        self.dir.path().join("storage.json")
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) -> (Arc<Store>, TempDir) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
        (self.store, self.dir)
    }
}

/// Start a server on `127.0.0.1:<port>` backed by a fresh temporary storage file.
pub async fn start_server(port: u16) -> TestServer {
    start_server_with(port, InsertPersistence::Awaited, None).await
}

/// Start a server with explicit insert persistence and optional initial file content.
pub async fn start_server_with(
    port: u16,
    insert_persistence: InsertPersistence,
    initial: Option<&str>,
) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("storage.json");
    if let Some(content) = initial {
        std::fs::write(&storage, content).unwrap();
    }

    let mut config = AppConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{}", port);
    config.storage.path = storage;
    config.storage.insert_persistence = insert_persistence;

    let Application {
        store,
        server,
        listener,
    } = lifecycle::bootstrap(config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    TestServer {
        addr,
        store,
        shutdown,
        handle,
        dir,
    }
}

/// HTTP client without connection pooling or system proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;

use plinth::{HttpServer, RouteTable, ServerConfig, Shutdown};

/// A scratch content root with the standard layout:
/// `public/` plus a `public/static/` subtree.
pub struct TestSite {
    pub dir: tempfile::TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public").join("static")).unwrap();
        Self { dir }
    }

    pub fn public_dir(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    /// Write a file under `public/`.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.public_dir().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Write a file under `public/static/`.
    pub fn write_static(&self, rel: &str, content: &str) {
        self.write(&format!("static/{}", rel), content);
    }

    /// Config pointing at this site's content root. The rate limit
    /// threshold is high so ordinary tests never trip it.
    pub fn config(&self) -> ServerConfig {
        config_for(&self.public_dir())
    }
}

/// Config with a given content root and a permissive rate limit.
pub fn config_for(public_dir: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.site.public_dir = public_dir.to_path_buf();
    config.rate_limit.max_requests_per_second = 10_000;
    config
}

/// Build and spawn a server on an ephemeral port.
///
/// Returns the bound address and the shutdown coordinator (dropping it is
/// fine; the task ends with the test runtime).
pub async fn spawn_server(config: ServerConfig, routes: RouteTable) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::build(config, routes).await.unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Client that does not follow redirects, so 302s are observable.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

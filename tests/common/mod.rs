//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use cascade_server::config::ServerConfig;
use cascade_server::http::HttpServer;
use cascade_server::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A content root plus static directory living in a temp dir.
pub struct Site {
    pub dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        Self { dir }
    }

    /// Write `contents` to `content/<relative>`.
    pub fn content(&self, relative: &str, contents: &str) -> &Self {
        write(&self.dir.path().join("content"), relative, contents);
        self
    }

    /// Write `contents` to `static/<relative>`.
    #[allow(dead_code)]
    pub fn asset(&self, relative: &str, contents: &str) -> &Self {
        write(&self.dir.path().join("static"), relative, contents);
        self
    }

    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.content.root = self.dir.path().join("content");
        config.content.static_dir = Some(self.dir.path().join("static"));
        config
    }
}

fn write(base: &Path, relative: &str, contents: &str) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the server for `config` and return once it accepts connections.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestServer { addr, shutdown }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

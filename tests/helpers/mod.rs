//! Shared test helpers.
//!
//! Spins up a real echo server on a dynamic port so integration tests can
//! drive it over actual TCP connections.

use std::time::Duration;

use echoer::{EchoConfig, EchoServer};

/// Find an available port for testing
pub async fn find_available_port() -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Test server handle that manages a dynamic port server
pub struct EchoTestServer {
    pub port: u16,
    pub server_handle: tokio::task::JoinHandle<()>,
}

impl EchoTestServer {
    /// Start a new echo test server on a dynamic port
    pub async fn start() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let port = find_available_port().await?;

        let server_handle = tokio::spawn(async move {
            let server = EchoServer::new(EchoConfig::new("127.0.0.1", port));
            if let Err(e) = server.start().await {
                eprintln!("Test server error: {e}");
            }
        });

        // Wait a bit for the server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(Self {
            port,
            server_handle,
        })
    }

    /// Full URL for a path on this server
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }

    /// Stop the server
    pub async fn stop(self) {
        self.server_handle.abort();
        let _ = self.server_handle.await;
    }
}

/// Run a test against a managed echo server
pub async fn with_echo_test_server<F, Fut, T>(
    test_fn: F,
) -> Result<T, Box<dyn std::error::Error + Send + Sync>>
where
    F: FnOnce(EchoTestServer) -> Fut,
    Fut: std::future::Future<Output = Result<T, Box<dyn std::error::Error + Send + Sync>>>,
{
    let server = EchoTestServer::start().await?;
    test_fn(server).await
}

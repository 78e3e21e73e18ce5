//! Echo server.
//!
//! Builds the route table once at startup and serves it over a bound TCP
//! listener. The service is stateless: the only thing shared between
//! requests is the immutable configuration.

use {
    crate::config::EchoConfig,
    crate::{rest, rpc, soap},
    anyhow::{Context, Result},
    std::sync::Arc,
    tracing::debug,
    warp::{Filter, Rejection, Reply},
};

pub struct EchoServer {
    config: Arc<EchoConfig>,
}

impl EchoServer {
    pub fn new(config: EchoConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The complete route table: info banner, REST, SOAP (+WSDL), JSON-RPC.
    ///
    /// Constructed once, never mutated at request time; dispatch order is
    /// REST first, then SOAP, then RPC — the paths are disjoint.
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        rest::routes()
            .or(soap::routes(self.config.clone()))
            .or(rpc::routes())
    }

    /// Bind the configured address and serve until shut down.
    pub async fn start(&self) -> Result<()> {
        debug!(host = %self.config.host, port = self.config.port, "Starting echo server");

        let addr = format!("{}:{}", self.config.host, self.config.port)
            .parse::<std::net::SocketAddr>()
            .context("Invalid bind address")?;

        // Try to bind the port first so the failure surfaces before serving.
        // try_bind_ephemeral (rather than run_incoming over a raw listener)
        // keeps the peer address visible to warp::addr::remote().
        let (_, serving) = warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .map_err(|e| anyhow::anyhow!("Could not bind to {}: {}", addr, e))?;

        crate::logging::log_server_ready(&format!("http://{addr}"));
        tracing::info!(
            endpoints = ?vec![
                "GET / (info banner)",
                "GET|POST|PUT|PATCH|DELETE /echo/rest",
                "POST /echo/soap",
                "GET /echo/soap?wsdl",
                "POST /echo/rpc",
            ],
            "Available endpoints"
        );

        serving.await;

        Ok(())
    }

    pub fn config(&self) -> &EchoConfig {
        &self.config
    }
}

//! Echo server binary.

use anyhow::Result;
use echoer::{logging, EchoConfig, EchoServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging with tracing
    logging::init_tracing();

    let config = EchoConfig::from_env()?;
    logging::log_server_startup(&config.host, config.port);

    let server = EchoServer::new(config);
    server.start().await?;

    Ok(())
}

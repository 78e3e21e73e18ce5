//! Service configuration.
//!
//! Bind host/port come from the environment; everything else is derived.
//! The SOAP target namespace embeds the bind address, so the config is
//! built once at startup and shared with the SOAP/WSDL builders by `Arc`.

use anyhow::{Context, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5080;

#[derive(Debug, Clone)]
pub struct EchoConfig {
    /// Bind host for the HTTP listener.
    pub host: String,
    /// Bind port for the HTTP listener.
    pub port: u16,
}

impl EchoConfig {
    /// Load configuration from `HOST` / `PORT` environment variables,
    /// falling back to the defaults when unset.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid PORT value: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self { host, port })
    }

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base HTTP address of the service, e.g. `http://0.0.0.0:5080`.
    pub fn service_address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Target namespace of the SOAP service. Also used as the soapAction
    /// and service location in the WSDL.
    pub fn soap_target_namespace(&self) -> String {
        format!("{}/echo/soap", self.service_address())
    }
}

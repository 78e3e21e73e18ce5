//! Diagnostic HTTP echo server.
//!
//! Reflects request metadata (client address, request line, headers, query
//! parameters, body) back to the caller over three protocol surfaces: plain
//! REST, SOAP-over-HTTP (with WSDL), and JSON-RPC 2.0. Every response is a
//! deterministic function of the inbound request; the service holds no
//! state between requests.

pub mod config;
pub mod error;
pub mod logging;
pub mod rest;
pub mod rpc;
pub mod server;
pub mod snapshot;
pub mod soap;
pub mod wsdl;

// Re-export key types
pub use config::EchoConfig;
pub use error::{EchoError, EchoResult};
pub use server::EchoServer;
pub use snapshot::{EnvelopeResult, RequestSnapshot};

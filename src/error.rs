use serde_json::Value;
use thiserror::Error;

/// Error taxonomy for the echo service.
///
/// Adapters catch these locally and translate them into their protocol's
/// native error representation: plain HTTP errors for REST, a SOAP Fault
/// envelope for SOAP, and JSON-RPC error objects for RPC. Nothing escapes
/// a handler as a raw rejection.
#[derive(Debug, Error)]
pub enum EchoError {
    /// Request body could not be decoded as UTF-8 text.
    #[error("request body is not valid UTF-8: {0}")]
    MalformedBody(String),

    /// Inbound XML was not well-formed or not a SOAP envelope.
    #[error("invalid SOAP envelope: {0}")]
    InvalidSoapEnvelope(String),

    /// JSON-RPC body was not valid JSON (-32700).
    #[error("Parse error")]
    ParseError,

    /// JSON-RPC envelope missing required fields or wrong version (-32600).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// JSON-RPC method other than "echo" (-32601).
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The transport layer did not supply a peer address. Should not occur
    /// under a standard TCP listener; surfaces as HTTP 500.
    #[error("peer address unavailable")]
    UnavailablePeerInfo,

    #[error("internal error: {0}")]
    Internal(String),
}

impl EchoError {
    /// Convert to a JSON-RPC 2.0 error code.
    pub fn error_code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest(_) | Self::MalformedBody(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            _ => -32603, // Internal error
        }
    }

    /// Create a JSON-RPC error response object.
    ///
    /// `id` is echoed from the request when it could be recovered, `null`
    /// otherwise (e.g. the body never parsed as JSON).
    pub fn to_json_rpc_error(&self, id: Option<Value>) -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            },
            "id": id,
        })
    }
}

pub type EchoResult<T> = Result<T, EchoError>;

impl From<std::string::FromUtf8Error> for EchoError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        EchoError::MalformedBody(err.to_string())
    }
}

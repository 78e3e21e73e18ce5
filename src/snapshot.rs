//! Normalized request snapshots.
//!
//! Every adapter builds exactly one [`RequestSnapshot`] per request from the
//! raw pieces the HTTP listener supplies. The snapshot is immutable after
//! construction and fully determined by the inbound request; the field types
//! here carry hand-written `Serialize` impls so the wire shape is explicit
//! rather than an artifact of derive output.

use {
    crate::error::{EchoError, EchoResult},
    serde::ser::{SerializeMap, Serializer},
    serde::Serialize,
    serde_json::Value,
    std::net::SocketAddr,
    url::form_urlencoded,
    warp::http::{HeaderMap, Method},
    warp::hyper::body::Bytes,
    warp::path::FullPath,
    warp::{Filter, Rejection},
};

/// The listener speaks HTTP/1.1; warp does not surface the negotiated
/// version to filters, so the protocol field is constant.
const HTTP_PROTOCOL: &str = "HTTP/1.1";

/// Transport-level peer address of the inbound connection.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub host: String,
    pub port: String,
}

impl From<SocketAddr> for ClientInfo {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port().to_string(),
        }
    }
}

/// Request line: method, request-target and protocol version.
#[derive(Debug, Clone, Serialize)]
pub struct HttpLine {
    pub method: String,
    pub path: String,
    pub protocol: String,
}

/// A single header as it arrived on the wire.
///
/// Serializes as a one-entry map `{name: value}`; duplicates stay separate
/// entries so the original wire sequence can be reproduced.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl Serialize for HeaderEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

/// A decoded query parameter value: scalar, or a list when the key repeats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

/// Query parameters in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(pub Vec<(String, QueryValue)>);

impl QueryParams {
    /// Parse a raw query string with standard URL percent-decoding.
    /// Repeated keys collapse into a list under that key.
    pub fn parse(raw_query: &str) -> Self {
        let mut pairs: Vec<(String, QueryValue)> = Vec::new();
        for (key, value) in form_urlencoded::parse(raw_query.as_bytes()) {
            let value = value.into_owned();
            if let Some((_, existing)) = pairs.iter_mut().find(|(name, _)| *name == key) {
                let prior = std::mem::replace(existing, QueryValue::Many(Vec::new()));
                *existing = match prior {
                    QueryValue::Single(first) => QueryValue::Many(vec![first, value]),
                    QueryValue::Many(mut values) => {
                        values.push(value);
                        QueryValue::Many(values)
                    }
                };
            } else {
                pairs.push((key.into_owned(), QueryValue::Single(value)));
            }
        }
        Self(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Path-level captured parameters.
///
/// No route in this service defines capture groups, so this always
/// serializes as the literal string `"None"`. Existing clients depend on
/// that exact sentinel; do not turn it into a null or drop the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams;

impl Serialize for PathParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("None")
    }
}

/// The `request` half of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub http: HttpLine,
    pub params: PathParams,
    pub query_param: QueryParams,
    pub headers: Vec<HeaderEntry>,
    pub body: String,
}

/// Normalized, serializable representation of one inbound HTTP request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    pub client: ClientInfo,
    pub request: RequestInfo,
}

/// Protocol-specific payload wrapping a snapshot: the snapshot fields plus
/// the operation result computed by the adapter.
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeResult {
    pub client: ClientInfo,
    pub request: RequestInfo,
    pub op_result: Value,
}

impl EnvelopeResult {
    pub fn new(snapshot: RequestSnapshot, op_result: Value) -> Self {
        Self {
            client: snapshot.client,
            request: snapshot.request,
            op_result,
        }
    }
}

/// Raw request pieces handed over by the HTTP listener.
#[derive(Debug)]
pub struct RequestParts {
    pub remote: Option<SocketAddr>,
    pub method: Method,
    pub path: String,
    pub raw_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RequestSnapshot {
    /// Build a snapshot from raw request parts.
    ///
    /// Fails with `UnavailablePeerInfo` when the transport gave no peer
    /// address and with `MalformedBody` when the payload is not UTF-8.
    pub fn from_parts(parts: &RequestParts) -> EchoResult<Self> {
        let client = parts
            .remote
            .map(ClientInfo::from)
            .ok_or(EchoError::UnavailablePeerInfo)?;

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| HeaderEntry {
                name: name.as_str().to_string(),
                value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            })
            .collect();

        let body = String::from_utf8(parts.body.to_vec())?;

        Ok(Self {
            client,
            request: RequestInfo {
                http: HttpLine {
                    method: parts.method.as_str().to_string(),
                    path: parts.path.clone(),
                    protocol: HTTP_PROTOCOL.to_string(),
                },
                params: PathParams,
                query_param: QueryParams::parse(&parts.raw_query),
                headers,
                body,
            },
        })
    }
}

/// Warp filter bundling everything a snapshot needs from the request.
///
/// The raw query is optional in warp, so an absent query string falls back
/// to empty rather than rejecting the request.
pub fn request_parts() -> impl Filter<Extract = (RequestParts,), Error = Rejection> + Clone {
    warp::method()
        .and(warp::path::full())
        .and(raw_query_or_empty())
        .and(warp::header::headers_cloned())
        .and(warp::addr::remote())
        .and(warp::body::bytes())
        .map(
            |method: Method,
             path: FullPath,
             raw_query: String,
             headers: HeaderMap,
             remote: Option<SocketAddr>,
             body: Bytes| RequestParts {
                remote,
                method,
                path: path.as_str().to_string(),
                raw_query,
                headers,
                body,
            },
        )
}

/// The raw query string, or `""` when the request has none.
pub fn raw_query_or_empty() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::query::raw().or_else(|_| async { Ok::<(String,), Rejection>((String::new(),)) })
}

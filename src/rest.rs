//! REST adapter.
//!
//! `/echo/rest` reflects the snapshot back as JSON for any of
//! GET/POST/PUT/PATCH/DELETE with an empty `op_result`; behavior is
//! identical across methods. `/` and `/echo` serve a static info banner.

use {
    crate::error::EchoError,
    crate::snapshot::{request_parts, EnvelopeResult, RequestParts, RequestSnapshot},
    serde_json::json,
    tracing::{debug, error},
    uuid::Uuid,
    warp::http::StatusCode,
    warp::{reply, Filter, Rejection, Reply},
};

const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Routes for the REST surface: the info banner and `/echo/rest`.
pub fn routes() -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    let banner_root = warp::path::end().and(warp::get()).map(info_banner);
    let banner_echo = warp::path!("echo").and(warp::get()).map(info_banner);
    let rest = warp::path!("echo" / "rest")
        .and(request_parts())
        .and_then(handle_rest);

    banner_root.or(banner_echo).unify().or(rest).unify()
}

/// Static JSON banner naming the service and its endpoints.
fn info_banner() -> warp::reply::Response {
    let banner = json!({
        "service": "echoer",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            {"path": "/echo/rest", "methods": ["GET", "POST", "PUT", "PATCH", "DELETE"]},
            {"path": "/echo/soap", "methods": ["POST"]},
            {"path": "/echo/soap?wsdl", "methods": ["GET"]},
            {"path": "/echo/rpc", "methods": ["POST"]},
        ],
    });
    reply::json(&banner).into_response()
}

async fn handle_rest(parts: RequestParts) -> Result<warp::reply::Response, Rejection> {
    let request_id = Uuid::new_v4();

    if !ALLOWED_METHODS.contains(&parts.method.as_str()) {
        debug!(%request_id, method = %parts.method, "REST method not allowed");
        let body = json!({"error": format!("method {} not allowed", parts.method)});
        return Ok(
            reply::with_status(reply::json(&body), StatusCode::METHOD_NOT_ALLOWED)
                .into_response(),
        );
    }

    match RequestSnapshot::from_parts(&parts) {
        Ok(snapshot) => {
            debug!(
                %request_id,
                method = %parts.method,
                path = %parts.path,
                body_bytes = parts.body.len(),
                "REST echo"
            );
            let reply_body = EnvelopeResult::new(snapshot, json!(""));
            Ok(reply::json(&reply_body).into_response())
        }
        Err(e) => Ok(plain_error_reply(&e, &request_id)),
    }
}

/// Map a non-protocol error to a plain HTTP error response.
///
/// `MalformedBody` is the caller's fault (400); anything else is internal
/// and surfaces as a detail-free 500, logged for the operator.
pub(crate) fn plain_error_reply(err: &EchoError, request_id: &Uuid) -> warp::reply::Response {
    match err {
        EchoError::MalformedBody(_) => {
            debug!(%request_id, error = %err, "rejecting malformed body");
            let body = json!({"error": err.to_string()});
            reply::with_status(reply::json(&body), StatusCode::BAD_REQUEST).into_response()
        }
        _ => {
            error!(%request_id, error = %err, "internal error while building snapshot");
            let body = json!({"error": "internal server error"});
            reply::with_status(reply::json(&body), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
    }
}

//! SOAP adapter.
//!
//! `POST /echo/soap` takes a SOAP 1.1 envelope, pulls the text of the
//! `EchoRequest` element out of the Body, and answers with an envelope whose
//! `EchoResponse/response` element carries the reflected snapshot JSON as
//! CDATA. Element matching is by (namespace URI, local name), never by
//! prefix, so clients may bind the envelope namespace to any prefix they
//! like. Parse failures come back as a SOAP Fault on HTTP 200: SOAP faults
//! are transport-success, payload-failure by convention.
//!
//! `GET /echo/soap?wsdl` serves the service description; without the flag
//! the GET is a 404.

use std::io;
use std::sync::Arc;

use quick_xml::events::{BytesCData, BytesDecl, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};
use serde_json::json;
use tracing::debug;
use url::form_urlencoded;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{reply, Filter, Rejection, Reply};

use crate::config::EchoConfig;
use crate::error::{EchoError, EchoResult};
use crate::rest::plain_error_reply;
use crate::snapshot::{raw_query_or_empty, request_parts, EnvelopeResult, RequestParts, RequestSnapshot};
use crate::wsdl;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

const CONTENT_TYPE_SOAP: &str = "text/xml; charset=utf-8";
const CONTENT_TYPE_WSDL: &str = "text/xml";

/// Routes for the SOAP surface: WSDL retrieval and the echo operation.
pub fn routes(
    config: Arc<EchoConfig>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    let wsdl_route = warp::path!("echo" / "soap")
        .and(warp::get())
        .and(raw_query_or_empty())
        .and(with_config(config.clone()))
        .and_then(handle_wsdl);

    let echo_route = warp::path!("echo" / "soap")
        .and(warp::post())
        .and(request_parts())
        .and(with_config(config))
        .and_then(handle_soap_echo);

    wsdl_route.or(echo_route).unify()
}

fn with_config(
    config: Arc<EchoConfig>,
) -> impl Filter<Extract = (Arc<EchoConfig>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || config.clone())
}

/// Serve the WSDL when the `wsdl` query flag is present (its value is
/// irrelevant); a bare GET answers 404 directly. Rejecting here instead
/// would combine with the POST route's method-not-allowed rejection and
/// surface as a 405.
async fn handle_wsdl(
    raw_query: String,
    config: Arc<EchoConfig>,
) -> Result<warp::reply::Response, Rejection> {
    let has_wsdl_flag = form_urlencoded::parse(raw_query.as_bytes()).any(|(key, _)| key == "wsdl");
    if !has_wsdl_flag {
        return Ok(
            reply::with_status(reply::json(&json!({"error": "not found"})), StatusCode::NOT_FOUND)
                .into_response(),
        );
    }

    debug!("serving WSDL document");
    let document = wsdl::build_wsdl(&config);
    Ok(xml_reply(document, CONTENT_TYPE_WSDL, StatusCode::OK))
}

async fn handle_soap_echo(
    parts: RequestParts,
    config: Arc<EchoConfig>,
) -> Result<warp::reply::Response, Rejection> {
    let request_id = Uuid::new_v4();

    let op_result = match extract_echo_request(&parts.body) {
        Ok(text) => text,
        Err(e) => {
            debug!(%request_id, error = %e, "SOAP envelope rejected");
            // Request-side failure: SOAP 1.1 "Client" fault on a 200.
            let fault = build_fault_envelope("Client", &e.to_string());
            return Ok(xml_reply(fault, CONTENT_TYPE_SOAP, StatusCode::OK));
        }
    };

    let snapshot = match RequestSnapshot::from_parts(&parts) {
        Ok(snapshot) => snapshot,
        Err(e) => return Ok(plain_error_reply(&e, &request_id)),
    };

    debug!(%request_id, op_result_len = op_result.len(), "SOAP echo");
    let reply_body = EnvelopeResult::new(snapshot, json!(op_result));
    let reply_json = match serde_json::to_string(&reply_body) {
        Ok(json) => json,
        Err(e) => {
            return Ok(plain_error_reply(
                &EchoError::Internal(e.to_string()),
                &request_id,
            ))
        }
    };

    let envelope = build_response_envelope(&reply_json, &config.soap_target_namespace());
    Ok(xml_reply(envelope, CONTENT_TYPE_SOAP, StatusCode::OK))
}

fn xml_reply(body: Vec<u8>, content_type: &'static str, status: StatusCode) -> warp::reply::Response {
    reply::with_header(
        reply::with_status(warp::reply::Response::new(body.into()), status),
        "content-type",
        content_type,
    )
    .into_response()
}

/// Extract the text content of `Body/EchoRequest` from a SOAP envelope.
///
/// The root must be an `Envelope` in the SOAP 1.1 namespace and a `Body`
/// (same namespace) must be present; either missing is an
/// `InvalidSoapEnvelope`, as is any XML well-formedness failure. A missing
/// or empty `EchoRequest` yields the empty string. The element itself is
/// matched by local name in any namespace to tolerate unqualified and
/// tns-qualified clients alike.
pub fn extract_echo_request(xml: &[u8]) -> EchoResult<String> {
    let mut reader = NsReader::from_reader(xml);

    let mut saw_envelope = false;
    let mut saw_body = false;

    loop {
        let (resolve, event) = reader
            .read_resolved_event()
            .map_err(|e| EchoError::InvalidSoapEnvelope(e.to_string()))?;
        match event {
            Event::Start(e) => {
                let local = e.local_name();
                if !saw_envelope {
                    if in_soap_ns(&resolve) && local.as_ref() == b"Envelope" {
                        saw_envelope = true;
                    } else {
                        return Err(EchoError::InvalidSoapEnvelope(
                            "root element is not a SOAP Envelope".to_string(),
                        ));
                    }
                } else if !saw_body {
                    if in_soap_ns(&resolve) && local.as_ref() == b"Body" {
                        saw_body = true;
                    } else {
                        // Header or other envelope children before the Body.
                        skip_element(&mut reader)?;
                    }
                } else if local.as_ref() == b"EchoRequest" {
                    return read_text_content(&mut reader);
                } else {
                    skip_element(&mut reader)?;
                }
            }
            Event::Empty(e) => {
                let local = e.local_name();
                if !saw_envelope {
                    return Err(
                        if in_soap_ns(&resolve) && local.as_ref() == b"Envelope" {
                            EchoError::InvalidSoapEnvelope("missing SOAP Body".to_string())
                        } else {
                            EchoError::InvalidSoapEnvelope(
                                "root element is not a SOAP Envelope".to_string(),
                            )
                        },
                    );
                }
                if !saw_body && in_soap_ns(&resolve) && local.as_ref() == b"Body" {
                    // Self-closing Body: no EchoRequest, empty result.
                    return Ok(String::new());
                }
                if saw_body && local.as_ref() == b"EchoRequest" {
                    return Ok(String::new());
                }
            }
            Event::End(_) => {
                if saw_body {
                    // Left the Body without meeting an EchoRequest.
                    return Ok(String::new());
                }
            }
            Event::Eof => {
                return if !saw_envelope {
                    Err(EchoError::InvalidSoapEnvelope(
                        "empty request body".to_string(),
                    ))
                } else if !saw_body {
                    Err(EchoError::InvalidSoapEnvelope(
                        "missing SOAP Body".to_string(),
                    ))
                } else {
                    Ok(String::new())
                };
            }
            _ => {}
        }
    }
}

fn in_soap_ns(resolve: &ResolveResult) -> bool {
    matches!(resolve, ResolveResult::Bound(ns) if ns.as_ref() == SOAP_ENVELOPE_NS.as_bytes())
}

/// Read the text content of the current element and consume its end tag.
/// Nested elements are skipped; only character data is collected.
fn read_text_content(reader: &mut NsReader<&[u8]>) -> EchoResult<String> {
    let mut text = String::new();
    let mut depth: u32 = 1;
    loop {
        let (_, event) = reader
            .read_resolved_event()
            .map_err(|e| EchoError::InvalidSoapEnvelope(e.to_string()))?;
        match event {
            Event::Text(e) => {
                if depth == 1 {
                    let decoded = reader
                        .decoder()
                        .decode(e.as_ref())
                        .map_err(|err| EchoError::InvalidSoapEnvelope(err.to_string()))?;
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map_err(|err| EchoError::InvalidSoapEnvelope(err.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if depth == 1 {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(text);
                }
            }
            Event::Eof => {
                return Err(EchoError::InvalidSoapEnvelope(
                    "unexpected EOF while reading element text".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut NsReader<&[u8]>) -> EchoResult<()> {
    let mut depth: u32 = 1;
    loop {
        let (_, event) = reader
            .read_resolved_event()
            .map_err(|e| EchoError::InvalidSoapEnvelope(e.to_string()))?;
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(EchoError::InvalidSoapEnvelope(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Build the SOAP response envelope carrying the reflected JSON as CDATA.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <soap:Envelope xmlns:soap="..." xmlns:tns="http://host:port/echo/soap">
///   <soap:Body>
///     <EchoResponse>
///       <response><![CDATA[{...}]]></response>
///     </EchoResponse>
///   </soap:Body>
/// </soap:Envelope>
/// ```
pub fn build_response_envelope(reply_json: &str, target_ns: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(reply_json.len() + 256);
    // Writing to Vec<u8> is infallible; a failure here is a logic error.
    if let Err(e) = write_response_envelope(&mut buf, reply_json, target_ns) {
        tracing::error!(error = %e, "failed to serialize SOAP response envelope");
        buf.clear();
    }
    buf
}

fn write_response_envelope(
    buf: &mut Vec<u8>,
    reply_json: &str,
    target_ns: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element("soap:Envelope")
        .with_attribute(("xmlns:soap", SOAP_ENVELOPE_NS))
        .with_attribute(("xmlns:tns", target_ns))
        .write_inner_content(|w| {
            w.create_element("soap:Body").write_inner_content(|w| {
                w.create_element("EchoResponse").write_inner_content(|w| {
                    w.create_element("response")
                        .write_cdata_content(BytesCData::new(reply_json))?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })?;

    Ok(())
}

/// Build a SOAP 1.1 Fault envelope.
pub fn build_fault_envelope(faultcode: &str, faultstring: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_fault_envelope(&mut buf, faultcode, faultstring) {
        tracing::error!(error = %e, "failed to serialize SOAP fault envelope");
        buf.clear();
    }
    buf
}

fn write_fault_envelope(buf: &mut Vec<u8>, faultcode: &str, faultstring: &str) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element("soap:Envelope")
        .with_attribute(("xmlns:soap", SOAP_ENVELOPE_NS))
        .write_inner_content(|w| {
            w.create_element("soap:Body").write_inner_content(|w| {
                w.create_element("soap:Fault").write_inner_content(|w| {
                    w.create_element("faultcode")
                        .write_text_content(BytesText::new(faultcode))?;
                    w.create_element("faultstring")
                        .write_text_content(BytesText::new(faultstring))?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })?;

    Ok(())
}

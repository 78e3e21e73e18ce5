//! WSDL document builder.
//!
//! Describes the single `Echo` operation: a string `EchoRequest` in, a
//! string `EchoResponse` out, bound over the SOAP HTTP transport. The
//! target namespace embeds the configured bind host/port and matches the
//! `tns` declared on `/echo/soap` response envelopes.

use std::io;

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;

use crate::config::EchoConfig;

pub const WSDL_NS: &str = "http://schemas.xmlsoap.org/wsdl/";
pub const SOAP_BINDING_NS: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const SOAP_HTTP_TRANSPORT: &str = "http://schemas.xmlsoap.org/soap/http";

/// Build the WSDL document for the configured service address.
pub fn build_wsdl(config: &EchoConfig) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1024);
    // Writing to Vec<u8> is infallible; a failure here is a logic error.
    if let Err(e) = write_wsdl(&mut buf, config) {
        tracing::error!(error = %e, "failed to serialize WSDL document");
        buf.clear();
    }
    buf
}

fn write_wsdl(buf: &mut Vec<u8>, config: &EchoConfig) -> io::Result<()> {
    let target_ns = config.soap_target_namespace();
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element("wsdl:definitions")
        .with_attribute(("targetNamespace", target_ns.as_str()))
        .with_attribute(("xmlns:wsdl", WSDL_NS))
        .with_attribute(("xmlns:soap", SOAP_BINDING_NS))
        .with_attribute(("xmlns:xsd", XSD_NS))
        .with_attribute(("xmlns:tns", target_ns.as_str()))
        .write_inner_content(|w| {
            w.create_element("wsdl:types").write_empty()?;

            write_message(w, "EchoRequest")?;
            write_message(w, "EchoResponse")?;

            // <portType>
            w.create_element("wsdl:portType")
                .with_attribute(("name", "EchoPortType"))
                .write_inner_content(|w| {
                    w.create_element("wsdl:operation")
                        .with_attribute(("name", "Echo"))
                        .write_inner_content(|w| {
                            w.create_element("wsdl:input")
                                .with_attribute(("message", "tns:EchoRequest"))
                                .write_empty()?;
                            w.create_element("wsdl:output")
                                .with_attribute(("message", "tns:EchoResponse"))
                                .write_empty()?;
                            Ok(())
                        })?;
                    Ok(())
                })?;

            // <binding>
            w.create_element("wsdl:binding")
                .with_attribute(("name", "EchoBinding"))
                .with_attribute(("type", "tns:EchoPortType"))
                .write_inner_content(|w| {
                    w.create_element("soap:binding")
                        .with_attribute(("transport", SOAP_HTTP_TRANSPORT))
                        .with_attribute(("style", "document"))
                        .write_empty()?;
                    w.create_element("wsdl:operation")
                        .with_attribute(("name", "Echo"))
                        .write_inner_content(|w| {
                            w.create_element("soap:operation")
                                .with_attribute(("soapAction", target_ns.as_str()))
                                .write_empty()?;
                            w.create_element("wsdl:input").write_inner_content(|w| {
                                w.create_element("soap:body")
                                    .with_attribute(("use", "literal"))
                                    .write_empty()?;
                                Ok(())
                            })?;
                            w.create_element("wsdl:output").write_inner_content(|w| {
                                w.create_element("soap:body")
                                    .with_attribute(("use", "literal"))
                                    .write_empty()?;
                                Ok(())
                            })?;
                            Ok(())
                        })?;
                    Ok(())
                })?;

            // <service>
            w.create_element("wsdl:service")
                .with_attribute(("name", "EchoService"))
                .write_inner_content(|w| {
                    w.create_element("wsdl:port")
                        .with_attribute(("name", "EchoPort"))
                        .with_attribute(("binding", "tns:EchoBinding"))
                        .write_inner_content(|w| {
                            w.create_element("soap:address")
                                .with_attribute(("location", target_ns.as_str()))
                                .write_empty()?;
                            Ok(())
                        })?;
                    Ok(())
                })?;

            Ok(())
        })?;

    Ok(())
}

/// Write a `<wsdl:message>` with a single `xsd:string` part of the same name.
fn write_message<W: io::Write>(writer: &mut Writer<W>, name: &str) -> io::Result<()> {
    writer
        .create_element("wsdl:message")
        .with_attribute(("name", name))
        .write_inner_content(|w| {
            w.create_element("wsdl:part")
                .with_attribute(("name", name))
                .with_attribute(("type", "xsd:string"))
                .write_empty()?;
            Ok(())
        })?;
    Ok(())
}

//! SOAP v1 session (rpc/encoded)
//!
//! Connecting fetches the WSDL to learn the service location and namespace.
//! Requests are SOAP 1.1 envelopes; JSON objects travel as Apache `Map`
//! structures and JSON arrays as `SOAP-ENC:Array`, which is what the Magento
//! v1 SOAP server accepts and returns.

use super::transport::Transport;
use super::xml::{self, Element};
use super::{require_token, CallSpec, Protocol, ProtocolSession, SessionHandle};
use super::xmlrpc::session_id;
use crate::error::{MagentoError, Result};
use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_NAMESPACE: &str = "urn:Magento";
const SOAP_ACTION: &str = "\"urn:Action\"";

pub struct SoapSession {
    location: String,
    namespace: String,
    transport: Arc<dyn Transport>,
}

impl SoapSession {
    pub fn new(location: String, namespace: String, transport: Arc<dyn Transport>) -> Self {
        Self {
            location,
            namespace,
            transport,
        }
    }

    /// Fetch the WSDL at `wsdl_url` and build a session against its service location
    pub async fn discover(wsdl_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        debug!("Fetching WSDL from {}", wsdl_url);
        let response = transport.get(wsdl_url).await?;
        if !response.is_success() {
            return Err(MagentoError::Http {
                url: wsdl_url.to_string(),
                status: response.status,
                body: response.body,
            });
        }

        let definitions = xml::parse(&response.body)?;
        let namespace = definitions
            .attr("targetNamespace")
            .unwrap_or(DEFAULT_NAMESPACE)
            .to_string();
        let location = definitions
            .find("address")
            .and_then(|address| address.attr("location"))
            .map(|s| s.to_string())
            .unwrap_or_else(|| fallback_location(wsdl_url));

        info!("SOAP service location {} ({})", location, namespace);
        Ok(Self::new(location, namespace, transport))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Invoke `operation` with named parameters and return the decoded `return` part
    pub async fn invoke(&self, operation: &str, params: &[(&str, Value)]) -> Result<Value> {
        debug!("SOAP {} -> {}", operation, self.location);
        let body = encode_envelope(&self.namespace, operation, params);
        let response = self
            .transport
            .post(&self.location, &[("SOAPAction", SOAP_ACTION)], body)
            .await?;

        // Faults arrive with status 500, so look for one before the status check
        let envelope = match xml::parse(&response.body) {
            Ok(envelope) => envelope,
            Err(_) if !response.is_success() => {
                return Err(MagentoError::Http {
                    url: self.location.clone(),
                    status: response.status,
                    body: response.body,
                })
            }
            Err(e) => return Err(e),
        };

        if let Some(fault) = envelope.find("Fault") {
            return Err(MagentoError::Fault {
                code: fault
                    .child("faultcode")
                    .map(|c| c.text.trim().to_string())
                    .unwrap_or_default(),
                message: fault
                    .child("faultstring")
                    .map(|c| c.text.trim().to_string())
                    .unwrap_or_default(),
            });
        }

        if !response.is_success() {
            return Err(MagentoError::Http {
                url: self.location.clone(),
                status: response.status,
                body: response.body,
            });
        }

        decode_envelope(&envelope, operation)
    }
}

#[async_trait]
impl ProtocolSession for SoapSession {
    fn protocol(&self) -> Protocol {
        Protocol::Soap
    }

    async fn login(&self, username: &str, password: &str) -> Result<SessionHandle> {
        let result = self
            .invoke(
                "login",
                &[
                    ("username", Value::String(username.to_string())),
                    ("apiKey", Value::String(password.to_string())),
                ],
            )
            .await?;
        info!("SOAP login succeeded for {}", username);
        session_id(result)
    }

    async fn logout(&self, handle: &SessionHandle) -> Result<()> {
        let token = require_token(handle)?;
        self.invoke("endSession", &[("sessionId", Value::String(token.to_string()))])
            .await?;
        info!("SOAP session ended");
        Ok(())
    }

    async fn call(
        &self,
        handle: &SessionHandle,
        resource_path: &str,
        arguments: Value,
    ) -> Result<Value> {
        let token = require_token(handle)?;
        self.invoke(
            "call",
            &[
                ("sessionId", Value::String(token.to_string())),
                ("resourcePath", Value::String(resource_path.to_string())),
                ("args", arguments),
            ],
        )
        .await
    }

    async fn multi_call(&self, handle: &SessionHandle, calls: &[CallSpec]) -> Result<Value> {
        let token = require_token(handle)?;
        let batch = Value::Array(calls.iter().map(CallSpec::to_value).collect());
        self.invoke(
            "multiCall",
            &[
                ("sessionId", Value::String(token.to_string())),
                ("calls", batch),
            ],
        )
        .await
    }
}

fn fallback_location(wsdl_url: &str) -> String {
    wsdl_url
        .strip_suffix("?wsdl")
        .unwrap_or(wsdl_url)
        .to_string()
}

/// Build a SOAP 1.1 rpc/encoded request envelope
pub fn encode_envelope(namespace: &str, operation: &str, params: &[(&str, Value)]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(concat!(
        "<SOAP-ENV:Envelope",
        " xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\"",
        " xmlns:SOAP-ENC=\"http://schemas.xmlsoap.org/soap/encoding/\"",
        " xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"",
        " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
        " xmlns:ns2=\"http://xml.apache.org/xml-soap\"",
    ));
    out.push_str(&format!(" xmlns:ns1=\"{}\"", xml::escape(namespace)));
    out.push_str(" SOAP-ENV:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">");
    out.push_str("<SOAP-ENV:Body>");
    out.push_str(&format!("<ns1:{}>", operation));
    for (name, value) in params {
        encode_part(name, value, &mut out);
    }
    out.push_str(&format!("</ns1:{}>", operation));
    out.push_str("</SOAP-ENV:Body></SOAP-ENV:Envelope>");
    out
}

fn encode_part(name: &str, value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str(&format!("<{} xsi:nil=\"true\"/>", name)),
        Value::Bool(b) => out.push_str(&format!(
            "<{0} xsi:type=\"xsd:boolean\">{1}</{0}>",
            name, b
        )),
        Value::Number(n) => {
            let xsd_type = if n.is_f64() { "xsd:double" } else { "xsd:int" };
            out.push_str(&format!("<{0} xsi:type=\"{1}\">{2}</{0}>", name, xsd_type, n));
        }
        Value::String(s) => out.push_str(&format!(
            "<{0} xsi:type=\"xsd:string\">{1}</{0}>",
            name,
            xml::escape(s)
        )),
        Value::Array(items) => {
            out.push_str(&format!(
                "<{} SOAP-ENC:arrayType=\"xsd:anyType[{}]\" xsi:type=\"SOAP-ENC:Array\">",
                name,
                items.len()
            ));
            for item in items {
                encode_part("item", item, out);
            }
            out.push_str(&format!("</{}>", name));
        }
        Value::Object(members) => {
            out.push_str(&format!("<{} xsi:type=\"ns2:Map\">", name));
            for (key, member) in members {
                out.push_str("<item>");
                encode_part("key", &Value::String(key.clone()), out);
                encode_part("value", member, out);
                out.push_str("</item>");
            }
            out.push_str(&format!("</{}>", name));
        }
    }
}

/// Extract the return value of `operation` from a response envelope
pub fn decode_envelope(envelope: &Element, operation: &str) -> Result<Value> {
    let body = envelope.expect_child("Body")?;
    let response_name = format!("{}Response", operation);
    let response = body
        .child(&response_name)
        .or_else(|| body.children.first())
        .ok_or_else(|| {
            MagentoError::MalformedResponse(format!("SOAP body has no <{}>", response_name))
        })?;

    match response.children.first() {
        Some(part) => decode_part(part),
        None => Ok(Value::Null),
    }
}

fn decode_part(element: &Element) -> Result<Value> {
    if element.attr("nil") == Some("true") {
        return Ok(Value::Null);
    }

    let xsi_type = element.attr("type").unwrap_or_default();
    let local_type = xsi_type.rsplit(':').next().unwrap_or_default();

    if element.children.is_empty() {
        return Ok(match local_type {
            "Map" => Value::Object(Map::new()),
            "Array" => Value::Array(Vec::new()),
            _ => decode_scalar(local_type, &element.text),
        });
    }

    let all_items = element.children.iter().all(|c| c.name == "item");
    // An explicit array type wins over the key/value shape of its items
    let is_map = local_type == "Map"
        || (local_type != "Array"
            && all_items
            && element
                .children
                .iter()
                .all(|item| item.child("key").is_some() && item.child("value").is_some()));

    if is_map {
        let mut map = Map::new();
        for item in &element.children {
            let key = item.expect_child("key")?.text.clone();
            map.insert(key, decode_part(item.expect_child("value")?)?);
        }
        return Ok(Value::Object(map));
    }

    if local_type == "Array" || all_items {
        return element
            .children
            .iter()
            .map(decode_part)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array);
    }

    // Complex types with named members
    let mut map = Map::new();
    for child in &element.children {
        map.insert(child.name.clone(), decode_part(child)?);
    }
    Ok(Value::Object(map))
}

fn decode_scalar(local_type: &str, text: &str) -> Value {
    match local_type {
        "int" | "integer" | "long" | "short" | "byte" => text
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .unwrap_or_else(|_| Value::String(text.to_string())),
        "double" | "float" | "decimal" => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        "boolean" => Value::Bool(matches!(text.trim(), "true" | "1")),
        _ => Value::String(text.to_string()),
    }
}

//! XML-RPC session
//!
//! Encodes `methodCall` documents from JSON values and decodes `methodResponse`
//! documents (including faults) back into JSON values. Magento's XML-RPC
//! endpoint exposes `login`, `endSession`, `call` and `multiCall`.

use super::transport::Transport;
use super::xml::{self, Element};
use super::{require_token, CallSpec, Protocol, ProtocolSession, SessionHandle};
use crate::error::{MagentoError, Result};
use async_trait::async_trait;
use base64::Engine;
use serde_json::{Map, Number, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub struct XmlRpcSession {
    url: String,
    transport: Arc<dyn Transport>,
}

impl XmlRpcSession {
    pub fn new(url: String, transport: Arc<dyn Transport>) -> Self {
        Self { url, transport }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Invoke `method` with positional `params` and return the decoded result
    pub async fn invoke(&self, method: &str, params: &[Value]) -> Result<Value> {
        debug!("XML-RPC {} -> {}", method, self.url);
        let body = encode_method_call(method, params);
        let response = self.transport.post(&self.url, &[], body).await?;

        if !response.is_success() {
            return Err(MagentoError::Http {
                url: self.url.clone(),
                status: response.status,
                body: response.body,
            });
        }

        decode_method_response(&response.body)
    }
}

#[async_trait]
impl ProtocolSession for XmlRpcSession {
    fn protocol(&self) -> Protocol {
        Protocol::XmlRpc
    }

    async fn login(&self, username: &str, password: &str) -> Result<SessionHandle> {
        let result = self
            .invoke(
                "login",
                &[
                    Value::String(username.to_string()),
                    Value::String(password.to_string()),
                ],
            )
            .await?;
        info!("XML-RPC login succeeded for {}", username);
        session_id(result)
    }

    async fn logout(&self, handle: &SessionHandle) -> Result<()> {
        let token = require_token(handle)?;
        self.invoke("endSession", &[Value::String(token.to_string())])
            .await?;
        info!("XML-RPC session ended");
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
                Value::String(token.to_string()),
                Value::String(resource_path.to_string()),
                arguments,
            ],
        )
        .await
    }

    async fn multi_call(&self, handle: &SessionHandle, calls: &[CallSpec]) -> Result<Value> {
        let token = require_token(handle)?;
        let batch = Value::Array(calls.iter().map(CallSpec::to_value).collect());
        self.invoke("multiCall", &[Value::String(token.to_string()), batch])
            .await
    }
}

/// Session ids are strings, but some servers hand back numbers
pub(crate) fn session_id(value: Value) -> Result<SessionHandle> {
    match value {
        Value::String(token) if !token.is_empty() => Ok(SessionHandle::Token(token)),
        Value::Number(n) => Ok(SessionHandle::Token(n.to_string())),
        other => Err(MagentoError::MalformedResponse(format!(
            "login returned no session id: {}",
            other
        ))),
    }
}

/// Build a `methodCall` document
pub fn encode_method_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&xml::escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(param, &mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn encode_value(value: &Value, out: &mut String) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push_str(if *b { "1" } else { "0" });
            out.push_str("</boolean>");
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i32::try_from(i).is_ok() {
                    out.push_str(&format!("<int>{}</int>", i));
                } else {
                    out.push_str(&format!("<i8>{}</i8>", i));
                }
            } else if let Some(u) = n.as_u64() {
                out.push_str(&format!("<i8>{}</i8>", u));
            } else {
                out.push_str(&format!("<double>{}</double>", n));
            }
        }
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&xml::escape(s));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(item, out);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&xml::escape(name));
                out.push_str("</name>");
                encode_value(member, out);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Decode a `methodResponse` document, mapping `<fault>` to [`MagentoError::Fault`]
pub fn decode_method_response(body: &str) -> Result<Value> {
    let root = xml::parse(body)?;
    if root.name != "methodResponse" {
        return Err(MagentoError::MalformedResponse(format!(
            "expected <methodResponse>, got <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let detail = decode_value(fault.expect_child("value")?)?;
        return Err(fault_error(&detail));
    }

    let value = root
        .expect_child("params")?
        .expect_child("param")?
        .expect_child("value")?;
    decode_value(value)
}

fn fault_error(detail: &Value) -> MagentoError {
    let code = match detail.get("faultCode") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    };
    let message = detail
        .get("faultString")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    MagentoError::Fault { code, message }
}

fn decode_value(value: &Element) -> Result<Value> {
    // An untyped <value> is a string
    let Some(typed) = value.children.first() else {
        return Ok(Value::String(value.text.clone()));
    };

    let text = typed.text.as_str();
    match typed.name.as_str() {
        "string" => Ok(Value::String(text.to_string())),
        "int" | "i4" | "i8" => text
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| malformed("integer", text)),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(malformed("boolean", text)),
        },
        "double" => {
            let f = text
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed("double", text))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        "dateTime.iso8601" => Ok(Value::String(text.trim().to_string())),
        "base64" => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|_| malformed("base64", text))?;
            Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        }
        "nil" => Ok(Value::Null),
        "array" => {
            let data = typed.expect_child("data")?;
            data.children_named("value")
                .map(decode_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut map = Map::new();
            for member in typed.children_named("member") {
                let name = member.expect_child("name")?.text.clone();
                let member_value = decode_value(member.expect_child("value")?)?;
                map.insert(name, member_value);
            }
            Ok(Value::Object(map))
        }
        other => Err(MagentoError::MalformedResponse(format!(
            "unknown XML-RPC type <{}>",
            other
        ))),
    }
}

fn malformed(kind: &str, text: &str) -> MagentoError {
    MagentoError::MalformedResponse(format!("invalid {} value '{}'", kind, text))
}

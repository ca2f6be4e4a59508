//! JSON envelope printed by the CLI
//!
//! Every run prints exactly one envelope. Successful runs carry the protocol,
//! endpoint and result; failed runs carry only `error` and `meta`.

use crate::error::MagentoError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Envelope layout version reported in `meta.version`
pub const ENVELOPE_VERSION: &str = "v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEnvelope {
    pub ok: bool,

    /// `connection`, `call_result` or `multi_call_result`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Protocol tag, e.g. `rpc-xml`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Resource path of a single call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    pub meta: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable code from [`MagentoError::code`]
    pub code: String,
    pub message: String,

    /// Set for HTTP errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            duration_ms: None,
        }
    }
}

impl OutputEnvelope {
    /// Successful result of `kind` obtained over `protocol` at `endpoint`
    pub fn result(kind: &str, protocol: &str, endpoint: &str, data: Value) -> Self {
        Self {
            ok: true,
            kind: Some(kind.to_string()),
            protocol: Some(protocol.to_string()),
            endpoint: Some(endpoint.to_string()),
            operation: None,
            data: Some(data),
            error: None,
            meta: Metadata::default(),
        }
    }

    pub fn with_operation(mut self, resource_path: &str) -> Self {
        self.operation = Some(resource_path.to_string());
        self
    }

    /// Record the time elapsed since `start`
    pub fn timed(mut self, start: Instant) -> Self {
        self.meta.duration_ms = Some(start.elapsed().as_millis() as u64);
        self
    }

    pub fn failure(err: &MagentoError) -> Self {
        Self {
            ok: false,
            kind: None,
            protocol: None,
            endpoint: None,
            operation: None,
            data: None,
            error: Some(ErrorInfo {
                code: err.code().to_string(),
                message: err.to_string(),
                status: err.status(),
            }),
            meta: Metadata::default(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_result_names_resource_and_duration() {
        let envelope = OutputEnvelope::result(
            "call_result",
            "rpc-xml",
            "https://shop.example.com/index.php/api/xmlrpc",
            json!([]),
        )
        .with_operation("customer.list")
        .timed(Instant::now());

        assert!(envelope.ok);
        assert_eq!(envelope.operation.as_deref(), Some("customer.list"));
        assert_eq!(envelope.protocol.as_deref(), Some("rpc-xml"));
        assert!(envelope.meta.duration_ms.is_some());
        assert!(envelope.error.is_none());
    }

    #[test]
    fn http_failure_keeps_status_and_drops_payload() {
        let err = MagentoError::Http {
            url: "https://h/rest/V1/x".to_string(),
            status: 404,
            body: "{}".to_string(),
        };
        let envelope = OutputEnvelope::failure(&err);

        assert!(!envelope.ok);
        let info = envelope.error.as_ref().unwrap();
        assert_eq!(info.code, "HTTP_ERROR");
        assert_eq!(info.status, Some(404));
        assert_eq!(envelope.meta.version, ENVELOPE_VERSION);

        let printed: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert!(printed.get("data").is_none());
        assert!(printed.get("endpoint").is_none());
    }

    #[test]
    fn fault_failure_has_no_status_field() {
        let err = MagentoError::Fault {
            code: "2".to_string(),
            message: "Access denied.".to_string(),
        };
        let printed: Value =
            serde_json::from_str(&OutputEnvelope::failure(&err).to_json().unwrap()).unwrap();
        assert_eq!(printed["error"]["code"], "REMOTE_FAULT");
        assert!(printed["error"].get("status").is_none());
    }
}

//! Wire protocol sessions
//!
//! Each protocol implements a common interface for:
//! - Login / logout
//! - Single calls
//! - Batched calls (where the protocol has them)

pub mod rest;
pub mod soap;
pub mod transport;
pub mod xml;
pub mod xmlrpc;

use crate::config::SessionConfig;
use crate::error::{MagentoError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use transport::{HttpTransport, Transport};

/// Supported protocol types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    #[default]
    XmlRpc,
    Soap,
    Rest,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::XmlRpc, Protocol::Soap, Protocol::Rest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::XmlRpc => "rpc-xml",
            Protocol::Soap => "rpc-soap",
            Protocol::Rest => "rest",
        }
    }

    /// Well-known path of the service below the shop's base URL
    pub fn service_path(&self) -> &'static str {
        match self {
            Protocol::Soap => "api/?wsdl",
            Protocol::XmlRpc => "index.php/api/xmlrpc",
            Protocol::Rest => "index.php/rest/V1",
        }
    }

    /// Whether the server keeps a session that must be ended on exit
    pub fn is_stateful(&self) -> bool {
        !matches!(self, Protocol::Rest)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = MagentoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rpc-xml" | "xmlrpc" => Ok(Protocol::XmlRpc),
            "rpc-soap" | "soap" => Ok(Protocol::Soap),
            "rest" => Ok(Protocol::Rest),
            other => Err(MagentoError::Configuration(format!(
                "Unsupported protocol '{}': protocol must be {}",
                other,
                Protocol::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(" OR ")
            ))),
        }
    }
}

impl TryFrom<String> for Protocol {
    type Error = MagentoError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.as_str().to_string()
    }
}

/// Proof of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionHandle {
    /// Server-issued session id (XML-RPC, SOAP)
    Token(String),
    /// REST requests authenticate with the bearer token, no server session exists
    Bearer,
}

impl SessionHandle {
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionHandle::Token(token) => Some(token),
            SessionHandle::Bearer => None,
        }
    }
}

/// One entry of a multi-call batch
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    pub resource_path: String,
    pub arguments: Value,
}

impl CallSpec {
    pub fn new(resource_path: impl Into<String>, arguments: Value) -> Self {
        Self {
            resource_path: resource_path.into(),
            arguments,
        }
    }

    /// Wire shape expected by `multiCall`: `[resource_path, arguments]`
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.resource_path.clone()),
            self.arguments.clone(),
        ])
    }

    /// Parse a `[["path", args], ...]` batch
    pub fn list_from_value(value: &Value) -> Result<Vec<CallSpec>> {
        let entries = value.as_array().ok_or_else(|| {
            MagentoError::Configuration("multi-call batch must be a JSON array".to_string())
        })?;

        entries
            .iter()
            .map(|entry| match entry.as_array().map(|items| items.as_slice()) {
                Some([Value::String(path)]) => Ok(CallSpec::new(path.clone(), Value::Null)),
                Some([Value::String(path), args]) => Ok(CallSpec::new(path.clone(), args.clone())),
                _ => Err(MagentoError::Configuration(format!(
                    "multi-call entry must be [\"resource.path\", arguments], got {}",
                    entry
                ))),
            })
            .collect()
    }
}

/// Protocol session trait - implemented once per wire protocol
#[async_trait]
pub trait ProtocolSession: Send + Sync {
    /// Get the protocol this session speaks
    fn protocol(&self) -> Protocol;

    /// Authenticate and obtain a session handle
    async fn login(&self, username: &str, password: &str) -> Result<SessionHandle>;

    /// End the server-side session
    async fn logout(&self, handle: &SessionHandle) -> Result<()>;

    /// Invoke one remote resource method
    async fn call(&self, handle: &SessionHandle, resource_path: &str, arguments: Value)
        -> Result<Value>;

    /// Invoke a batch of resource methods in one request
    async fn multi_call(&self, handle: &SessionHandle, calls: &[CallSpec]) -> Result<Value>;
}

/// Enum of all protocol sessions, selected once at connect time
pub enum Connection {
    XmlRpc(xmlrpc::XmlRpcSession),
    Soap(soap::SoapSession),
    Rest(rest::RestSession),
}

impl Connection {
    /// Build the connection for `config.protocol` against `endpoint` without logging in
    pub async fn open(config: &SessionConfig, endpoint: &str) -> Result<Self> {
        match config.protocol {
            Protocol::XmlRpc => {
                let transport = Self::transport_for(config)?;
                Ok(Connection::XmlRpc(xmlrpc::XmlRpcSession::new(
                    endpoint.to_string(),
                    transport,
                )))
            }
            Protocol::Soap => {
                let transport = Self::transport_for(config)?;
                let session = soap::SoapSession::discover(endpoint, transport).await?;
                Ok(Connection::Soap(session))
            }
            // The REST API authenticates with a token passed as the password
            Protocol::Rest => Ok(Connection::Rest(rest::RestSession::new(
                rest::RestClient::new(endpoint, &config.password, config.verify_ssl)?,
            ))),
        }
    }

    fn transport_for(config: &SessionConfig) -> Result<Arc<dyn Transport>> {
        match &config.transport {
            Some(transport) => Ok(Arc::clone(transport)),
            None => Ok(Arc::new(HttpTransport::new(config.verify_ssl)?)),
        }
    }

    /// REST adapter, when this is a REST connection
    pub fn rest_client(&self) -> Option<&rest::RestClient> {
        match self {
            Connection::Rest(session) => Some(session.client()),
            _ => None,
        }
    }
}

#[async_trait]
impl ProtocolSession for Connection {
    fn protocol(&self) -> Protocol {
        match self {
            Connection::XmlRpc(_) => Protocol::XmlRpc,
            Connection::Soap(_) => Protocol::Soap,
            Connection::Rest(_) => Protocol::Rest,
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<SessionHandle> {
        match self {
            Connection::XmlRpc(s) => s.login(username, password).await,
            Connection::Soap(s) => s.login(username, password).await,
            Connection::Rest(s) => s.login(username, password).await,
        }
    }

    async fn logout(&self, handle: &SessionHandle) -> Result<()> {
        match self {
            Connection::XmlRpc(s) => s.logout(handle).await,
            Connection::Soap(s) => s.logout(handle).await,
            Connection::Rest(s) => s.logout(handle).await,
        }
    }

    async fn call(
        &self,
        handle: &SessionHandle,
        resource_path: &str,
        arguments: Value,
    ) -> Result<Value> {
        match self {
            Connection::XmlRpc(s) => s.call(handle, resource_path, arguments).await,
            Connection::Soap(s) => s.call(handle, resource_path, arguments).await,
            Connection::Rest(s) => s.call(handle, resource_path, arguments).await,
        }
    }

    async fn multi_call(&self, handle: &SessionHandle, calls: &[CallSpec]) -> Result<Value> {
        match self {
            Connection::XmlRpc(s) => s.multi_call(handle, calls).await,
            Connection::Soap(s) => s.multi_call(handle, calls).await,
            Connection::Rest(s) => s.multi_call(handle, calls).await,
        }
    }
}

/// Session id required by the stateful protocols
pub(crate) fn require_token(handle: &SessionHandle) -> Result<&str> {
    handle.token().ok_or(MagentoError::NotLoggedIn)
}

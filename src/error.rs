//! Magento client error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MagentoError>;

#[derive(Error, Debug)]
pub enum MagentoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error {status} for {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Remote fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("No active session: call enter() before issuing calls")]
    NotLoggedIn,

    #[error("Unknown sub-API: {0}")]
    UnknownSubApi(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MagentoError {
    /// Machine-readable code used in CLI error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            MagentoError::Configuration(_) => "CONFIGURATION_ERROR",
            MagentoError::Http { .. } => "HTTP_ERROR",
            MagentoError::Fault { .. } => "REMOTE_FAULT",
            MagentoError::MalformedResponse(_) | MagentoError::Xml(_) => "MALFORMED_RESPONSE",
            MagentoError::NotSupported(_) => "NOT_SUPPORTED",
            MagentoError::NotLoggedIn => "NOT_LOGGED_IN",
            MagentoError::UnknownSubApi(_) => "UNKNOWN_SUB_API",
            MagentoError::Network(_) => "NETWORK_ERROR",
            MagentoError::Json(_) => "INVALID_JSON",
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            MagentoError::Http { status, .. } => Some(*status),
            MagentoError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

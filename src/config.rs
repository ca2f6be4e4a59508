//! Session configuration

use crate::error::{MagentoError, Result};
use crate::protocols::transport::Transport;
use crate::protocols::Protocol;
use crate::utils::expand_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Default Magento version reported to sub-APIs
pub const DEFAULT_VERSION: &str = "1.3.2.4";

/// Connection parameters of one API session
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Shop base URL, or the complete service URL when `full_url` is set
    pub url: String,

    /// Web-services user (not the admin user)
    pub username: String,

    /// Web-services API key; the integration access token for REST
    pub password: String,

    /// Wire protocol
    #[serde(default)]
    pub protocol: Protocol,

    /// Magento version the connection is made to
    #[serde(default = "default_version")]
    pub version: String,

    /// Treat `url` as the complete endpoint instead of expanding it
    #[serde(default)]
    pub full_url: bool,

    /// Verify TLS certificates
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Custom transport for the XML-RPC and SOAP protocols
    #[serde(skip)]
    pub transport: Option<Arc<dyn Transport>>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_verify_ssl() -> bool {
    true
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("protocol", &self.protocol)
            .field("version", &self.version)
            .field("full_url", &self.full_url)
            .field("verify_ssl", &self.verify_ssl)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl SessionConfig {
    /// Create a configuration with default protocol, version and flags
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            protocol: Protocol::default(),
            version: default_version(),
            full_url: false,
            verify_ssl: true,
            transport: None,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_full_url(mut self, full_url: bool) -> Self {
        self.full_url = full_url;
        self
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolved service endpoint
    pub fn endpoint(&self) -> String {
        if self.full_url {
            self.url.clone()
        } else {
            expand_url(&self.url, self.protocol)
        }
    }

    /// Check the URL before any connection is attempted
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(MagentoError::Configuration("URL cannot be empty".to_string()));
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| {
            MagentoError::Configuration(format!("Invalid URL '{}': {}", self.url, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(MagentoError::Configuration(format!(
                "URL must use http:// or https://, got: {}",
                parsed.scheme()
            )));
        }

        Ok(())
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| MagentoError::Configuration(format!("Invalid config: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            MagentoError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build configuration from `MAGENTO_*` environment variables
    ///
    /// `MAGENTO_URL`, `MAGENTO_USERNAME` and `MAGENTO_PASSWORD` are required;
    /// `MAGENTO_PROTOCOL`, `MAGENTO_API_VERSION`, `MAGENTO_FULL_URL` and
    /// `MAGENTO_VERIFY_SSL` are optional.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| {
                MagentoError::Configuration(format!("Missing environment variable {}", name))
            })
        };

        let mut config = Self::new(
            required("MAGENTO_URL")?,
            required("MAGENTO_USERNAME")?,
            required("MAGENTO_PASSWORD")?,
        );

        if let Ok(protocol) = std::env::var("MAGENTO_PROTOCOL") {
            config.protocol = protocol.parse()?;
        }
        if let Ok(version) = std::env::var("MAGENTO_API_VERSION") {
            config.version = version;
        }
        if let Ok(value) = std::env::var("MAGENTO_FULL_URL") {
            config.full_url = parse_flag("MAGENTO_FULL_URL", &value)?;
        }
        if let Ok(value) = std::env::var("MAGENTO_VERIFY_SSL") {
            config.verify_ssl = parse_flag("MAGENTO_VERIFY_SSL", &value)?;
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(MagentoError::Configuration(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

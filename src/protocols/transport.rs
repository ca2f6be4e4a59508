//! HTTP transport used by the XML-RPC and SOAP sessions
//!
//! The transport only moves documents; encoding and decoding stay in the
//! protocol sessions. A custom implementation can be supplied through
//! [`SessionConfig::with_transport`](crate::config::SessionConfig::with_transport).

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Raw response returned by a transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code (or protocol equivalent)
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Document transport abstraction
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a document (used for WSDL discovery)
    async fn get(&self, url: &str) -> Result<TransportResponse>;

    /// Post an XML document with extra request headers
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<TransportResponse>;
}

/// Default transport over reqwest
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(verify_ssl: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<TransportResponse> {
        tracing::debug!("POST {} ({} bytes)", url, body.len());
        let mut req = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let response = req.body(body).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

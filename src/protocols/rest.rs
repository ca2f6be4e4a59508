//! REST adapter for the token-authenticated Magento 2 API

use super::{CallSpec, Protocol, ProtocolSession, SessionHandle};
use crate::error::{MagentoError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

/// Bearer-token REST client
pub struct RestClient {
    client: Client,
    url: String,
    token: String,
}

impl RestClient {
    pub fn new(url: &str, token: &str, verify_ssl: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            token: token.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a REST request.
    ///
    /// `GET` sends `arguments` as query parameters; other methods send non-null
    /// `arguments` as a JSON body. `method` defaults to `GET`.
    pub async fn call(
        &self,
        resource_path: &str,
        arguments: Value,
        method: Option<Method>,
        store_view: Option<&str>,
    ) -> Result<Value> {
        let mut url = join_path(&self.url, resource_path);
        if let Some(store_view) = store_view.filter(|s| !s.is_empty()) {
            url = scope_to_store_view(&url, store_view);
        }
        let method = method.unwrap_or(Method::GET);

        debug!("REST {} {}", method, url);

        let mut req = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.token);

        if method == Method::GET {
            let params = query_pairs(&arguments);
            if !params.is_empty() {
                req = req.query(&params);
            }
        } else if !arguments.is_null() {
            req = req
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(&arguments)?);
        }

        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            return Err(MagentoError::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// REST protocol session: the token authenticates every request, so there is
/// no server-side session to open or close
pub struct RestSession {
    client: RestClient,
}

impl RestSession {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

#[async_trait]
impl ProtocolSession for RestSession {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<SessionHandle> {
        Ok(SessionHandle::Bearer)
    }

    async fn logout(&self, _handle: &SessionHandle) -> Result<()> {
        Ok(())
    }

    async fn call(
        &self,
        _handle: &SessionHandle,
        resource_path: &str,
        arguments: Value,
    ) -> Result<Value> {
        self.client.call(resource_path, arguments, None, None).await
    }

    async fn multi_call(&self, _handle: &SessionHandle, _calls: &[CallSpec]) -> Result<Value> {
        Err(MagentoError::NotSupported(
            "the REST API has no batched calls; issue them one by one".to_string(),
        ))
    }
}

fn join_path(base: &str, resource_path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        resource_path.trim_start_matches('/')
    )
}

/// Scope a REST URL to a store view: `/rest/V1/` becomes `/rest/<store_view>/V1/`.
///
/// Works around https://github.com/magento/magento2/issues/3864
pub fn scope_to_store_view(url: &str, store_view: &str) -> String {
    url.replace("/rest/V1/", &format!("/rest/{}/V1/", store_view))
}

/// Flatten arguments into query pairs using PHP bracket notation for nesting
pub fn query_pairs(arguments: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    match arguments {
        Value::Object(map) => {
            for (key, value) in map {
                flatten(key.clone(), value, &mut pairs);
            }
        }
        // A list of [key, value] pairs
        Value::Array(items) => {
            for item in items {
                if let Some([Value::String(key), value]) =
                    item.as_array().map(|pair| pair.as_slice())
                {
                    flatten(key.clone(), value, &mut pairs);
                }
            }
        }
        _ => {}
    }
    pairs
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Bool(b) => pairs.push((prefix, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{}[{}]", prefix, index), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{}[{}]", prefix, key), item, pairs);
            }
        }
    }
}

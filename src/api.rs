//! Root API session
//!
//! [`Api`] owns the connection parameters, the protocol connection and the
//! session handle, and dispatches `call`/`multi_call` to whichever protocol
//! was configured.
//!
//! ```rust,no_run
//! use magento_api::{Api, SessionConfig};
//! use serde_json::json;
//!
//! # async fn example() -> magento_api::Result<()> {
//! let api = Api::new(SessionConfig::new("https://shop.example.com", "ws-user", "api-key"))?;
//! api.enter().await?;
//! let customers = api.call("customer.list", json!([])).await;
//! api.exit().await?;
//! println!("{}", customers?);
//! # Ok(())
//! # }
//! ```

use crate::config::SessionConfig;
use crate::error::{MagentoError, Result};
use crate::protocols::{CallSpec, Connection, Protocol, ProtocolSession, SessionHandle};
use crate::registry::{self, AnyInstance, SubApi};
use reqwest::Method;
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct Api {
    config: SessionConfig,
    endpoint: String,
    connection: RwLock<Option<Arc<Connection>>>,
    session: RwLock<Option<SessionHandle>>,
    instances: Mutex<HashMap<TypeId, AnyInstance>>,
}

impl Api {
    /// Create a session for `config`. Nothing is sent over the network.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint();

        Ok(Self {
            config,
            endpoint,
            connection: RwLock::new(None),
            session: RwLock::new(None),
            instances: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fully resolved service URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn protocol(&self) -> Protocol {
        self.config.protocol
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Current session handle, if logged in
    pub fn session(&self) -> Option<SessionHandle> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.current_connection().is_some()
    }

    /// Build the protocol connection without logging in.
    ///
    /// Useful as a connectivity test; for SOAP this downloads the WSDL.
    pub async fn connect(&self) -> Result<()> {
        let connection = Connection::open(&self.config, &self.endpoint).await?;
        info!("Connected to {} over {}", self.endpoint, self.config.protocol);
        *self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(connection));
        Ok(())
    }

    /// Log in, connecting first if needed, and keep the session handle
    pub async fn enter(&self) -> Result<&Self> {
        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => {
                self.connect().await?;
                self.require_connection()?
            }
        };

        let handle = connection
            .login(&self.config.username, &self.config.password)
            .await?;
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(self)
    }

    /// End the session.
    ///
    /// The handle is cleared before logging out, so it is gone even when the
    /// logout request fails; that failure is still returned. REST has no
    /// server session and skips the logout request.
    pub async fn exit(&self) -> Result<()> {
        let handle = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let (Some(handle), Some(connection)) = (handle, self.current_connection()) else {
            return Ok(());
        };

        if !self.config.protocol.is_stateful() {
            return Ok(());
        }

        connection.logout(&handle).await
    }

    /// Run `body` inside a logged-in session and log out afterwards.
    ///
    /// An error from `body` takes precedence over a logout error.
    pub async fn scoped<F, Fut, T>(self: Arc<Self>, body: F) -> Result<T>
    where
        F: FnOnce(Arc<Api>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.enter().await?;
        let outcome = body(Arc::clone(&self)).await;
        let exited = self.exit().await;

        match (outcome, exited) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(logout)) => {
                warn!("Logout failed after an error: {}", logout);
                Err(e)
            }
        }
    }

    /// Call a remote resource method
    pub async fn call(&self, resource_path: &str, arguments: Value) -> Result<Value> {
        let (connection, handle) = self.active()?;
        debug!("call {} over {}", resource_path, self.config.protocol);
        connection.call(&handle, resource_path, arguments).await
    }

    /// Call several resource methods in one request (XML-RPC and SOAP only)
    pub async fn multi_call(&self, calls: &[CallSpec]) -> Result<Value> {
        let (connection, handle) = self.active()?;
        debug!("multiCall of {} calls over {}", calls.len(), self.config.protocol);
        connection.multi_call(&handle, calls).await
    }

    /// REST call with an explicit HTTP method and optional store view
    pub async fn call_rest(
        &self,
        resource_path: &str,
        arguments: Value,
        method: Option<Method>,
        store_view: Option<&str>,
    ) -> Result<Value> {
        let (connection, _handle) = self.active()?;
        let client = connection.rest_client().ok_or_else(|| {
            MagentoError::NotSupported(format!(
                "HTTP methods and store views only apply to REST, not {}",
                self.config.protocol
            ))
        })?;
        client.call(resource_path, arguments, method, store_view).await
    }

    /// Cached, logged-in instance of sub-API `T`.
    ///
    /// The first access creates a new session with the same credentials and
    /// the already resolved endpoint, logs it in and caches it; later accesses
    /// return the same instance. The cache lock is held across creation, so
    /// concurrent first accesses build exactly one instance.
    pub async fn get_instance_of<T: SubApi>(&self) -> Result<Arc<T>> {
        let instance = self
            .instance_for(
                TypeId::of::<T>(),
                &T::canonical_name(),
                registry::build_instance::<T>,
            )
            .await?;

        instance
            .downcast::<T>()
            .map_err(|_| MagentoError::UnknownSubApi(T::canonical_name()))
    }

    /// Look up a registered sub-API by canonical name
    pub async fn sub_api(&self, name: &str) -> Result<AnyInstance> {
        let registration =
            registry::lookup(name).ok_or_else(|| MagentoError::UnknownSubApi(name.to_string()))?;
        self.instance_for(registration.type_id, &registration.name, registration.build)
            .await
    }

    async fn instance_for(
        &self,
        type_id: TypeId,
        name: &str,
        build: fn(Api) -> AnyInstance,
    ) -> Result<AnyInstance> {
        let mut instances = self.instances.lock().await;
        if let Some(existing) = instances.get(&type_id) {
            return Ok(Arc::clone(existing));
        }

        debug!("Creating sub-API {}", name);
        let child = Api::new(self.child_config())?;
        child.enter().await?;

        let instance = build(child);
        instances.insert(type_id, Arc::clone(&instance));
        Ok(instance)
    }

    fn child_config(&self) -> SessionConfig {
        let mut config = self.config.clone();
        config.url = self.endpoint.clone();
        config.full_url = true;
        config
    }

    fn current_connection(&self) -> Option<Arc<Connection>> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_connection(&self) -> Result<Arc<Connection>> {
        self.current_connection().ok_or(MagentoError::NotLoggedIn)
    }

    fn active(&self) -> Result<(Arc<Connection>, SessionHandle)> {
        let handle = self.session().ok_or(MagentoError::NotLoggedIn)?;
        let connection = self.require_connection()?;
        Ok((connection, handle))
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("endpoint", &self.endpoint)
            .field("protocol", &self.config.protocol)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rest_api() -> Api {
        Api::new(
            SessionConfig::new("https://shop.example.com", "integration", "token")
                .with_protocol(Protocol::Rest),
        )
        .unwrap()
    }

    #[test]
    fn new_resolves_endpoint_without_network() {
        let api = rest_api();
        assert_eq!(api.endpoint(), "https://shop.example.com/index.php/rest/V1");
        assert!(!api.is_connected());
        assert!(!api.is_logged_in());
    }

    #[test]
    fn new_rejects_invalid_url() {
        let err = Api::new(SessionConfig::new("shop.example.com", "u", "p")).unwrap_err();
        assert!(matches!(err, MagentoError::Configuration(_)));
    }

    #[test]
    fn child_config_uses_resolved_endpoint() {
        let api = rest_api();
        let child = api.child_config();
        assert!(child.full_url);
        assert_eq!(child.url, api.endpoint());
        assert_eq!(child.endpoint(), api.endpoint());
        assert_eq!(child.protocol, Protocol::Rest);
    }

    #[tokio::test]
    async fn call_before_enter_fails() {
        let api = rest_api();
        let err = api.call("products", json!({})).await.unwrap_err();
        assert!(matches!(err, MagentoError::NotLoggedIn));
    }

    #[tokio::test]
    async fn rest_enter_sets_bearer_sentinel_and_exit_clears_it() {
        let api = rest_api();
        api.enter().await.unwrap();
        assert_eq!(api.session(), Some(SessionHandle::Bearer));

        api.exit().await.unwrap();
        assert_eq!(api.session(), None);

        let err = api.call("products", Value::Null).await.unwrap_err();
        assert!(matches!(err, MagentoError::NotLoggedIn));
    }

    #[tokio::test]
    async fn rest_multi_call_is_not_supported() {
        let api = rest_api();
        api.enter().await.unwrap();
        let err = api
            .multi_call(&[CallSpec::new("products", Value::Null)])
            .await
            .unwrap_err();
        assert!(matches!(err, MagentoError::NotSupported(_)));
    }

    #[tokio::test]
    async fn unknown_sub_api_name() {
        let api = rest_api();
        let err = api.sub_api("not_a_resource").await.unwrap_err();
        assert!(matches!(err, MagentoError::UnknownSubApi(name) if name == "not_a_resource"));
    }
}

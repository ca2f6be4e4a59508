//! magento-api - Magento web-services client
//!
//! One session type speaking XML-RPC, SOAP or the token-authenticated REST
//! API, with lazily created, cached sub-APIs per resource group.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod protocols;
pub mod registry;
pub mod resources;
pub mod utils;

pub use api::Api;
pub use config::SessionConfig;
pub use error::{MagentoError, Result};
pub use output::OutputEnvelope;
pub use protocols::{CallSpec, Protocol, SessionHandle};
pub use registry::SubApi;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! CLI orchestration module
//!
//! Argument definitions and command execution for the `magento-api` binary,
//! kept in the library so they can be tested without spawning a process.

use crate::api::Api;
use crate::config::SessionConfig;
use crate::error::{MagentoError, Result};
use crate::output::OutputEnvelope;
use crate::protocols::{CallSpec, Protocol};
use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "magento-api")]
#[command(about = "Call Magento web services over XML-RPC, SOAP or REST", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection flags; unset flags fall back to the config file, then to
/// `MAGENTO_*` environment variables
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Shop base URL (or full endpoint with --full-url)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Web-services user
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// API key, or the access token for REST
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Protocol: rpc-xml, rpc-soap or rest
    #[arg(long, global = true)]
    pub protocol: Option<String>,

    /// Magento version
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Use --url as the complete endpoint
    #[arg(long, global = true)]
    pub full_url: bool,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect without logging in and report the endpoint
    Ping,

    /// Call one resource method
    Call {
        /// Resource path (e.g. "customer.list", or "products" for REST)
        #[arg(value_name = "RESOURCE")]
        resource: String,

        /// JSON arguments
        #[arg(long)]
        json: Option<String>,

        /// HTTP method (REST only)
        #[arg(long)]
        method: Option<String>,

        /// Store view code (REST only)
        #[arg(long)]
        store_view: Option<String>,
    },

    /// Call several resource methods in one request
    MultiCall {
        /// JSON batch: [["resource.path", args], ...]
        #[arg(long)]
        json: String,
    },
}

impl ConnectionArgs {
    /// Resolve the session configuration from flags, file and environment
    pub fn to_config(&self) -> Result<SessionConfig> {
        let mut config = match (&self.config, &self.url) {
            (Some(path), _) => SessionConfig::load_from_file(path)?,
            (None, Some(url)) => SessionConfig::new(
                url.clone(),
                self.username.clone().unwrap_or_default(),
                self.password.clone().unwrap_or_default(),
            ),
            (None, None) => SessionConfig::from_env()?,
        };

        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(protocol) = &self.protocol {
            config.protocol = protocol.parse::<Protocol>()?;
        }
        if let Some(version) = &self.api_version {
            config.version = version.clone();
        }
        if self.full_url {
            config.full_url = true;
        }
        if self.insecure {
            config.verify_ssl = false;
        }

        Ok(config)
    }
}

/// Execute a parsed command line and build its output envelope
pub async fn run(cli: Cli) -> OutputEnvelope {
    match execute(cli).await {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::error!("{}", err);
            OutputEnvelope::failure(&err)
        }
    }
}

async fn execute(cli: Cli) -> Result<OutputEnvelope> {
    let config = cli.connection.to_config()?;
    let api = Arc::new(Api::new(config)?);
    let protocol = api.protocol().as_str();
    let endpoint = api.endpoint().to_string();
    let start = Instant::now();

    match cli.command {
        Command::Ping => {
            api.connect().await?;
            Ok(
                OutputEnvelope::result("connection", protocol, &endpoint, Value::Bool(true))
                    .timed(start),
            )
        }
        Command::Call {
            resource,
            json,
            method,
            store_view,
        } => {
            let arguments = parse_json_arg(json.as_deref())?;
            let method = method.as_deref().map(parse_method).transpose()?;
            let rest_options = method.is_some() || store_view.is_some();

            let path = resource.clone();
            let data = Arc::clone(&api)
                .scoped(|api| async move {
                    if rest_options {
                        api.call_rest(&path, arguments, method, store_view.as_deref())
                            .await
                    } else {
                        api.call(&path, arguments).await
                    }
                })
                .await?;

            Ok(OutputEnvelope::result("call_result", protocol, &endpoint, data)
                .with_operation(&resource)
                .timed(start))
        }
        Command::MultiCall { json } => {
            let batch: Value = serde_json::from_str(&json)?;
            let calls = CallSpec::list_from_value(&batch)?;

            let data = Arc::clone(&api)
                .scoped(|api| async move { api.multi_call(&calls).await })
                .await?;

            Ok(
                OutputEnvelope::result("multi_call_result", protocol, &endpoint, data)
                    .timed(start),
            )
        }
    }
}

/// Arguments given with `--json`; absent means no arguments
pub fn parse_json_arg(json: Option<&str>) -> Result<Value> {
    match json {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Value::Null),
    }
}

pub fn parse_method(method: &str) -> Result<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "PATCH" => Ok(Method::PATCH),
        other => Err(MagentoError::Configuration(format!(
            "Unsupported HTTP method: {}",
            other
        ))),
    }
}

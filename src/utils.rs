//! URL and naming helpers shared by the session core and the sub-API registry

use crate::protocols::Protocol;
use regex::Regex;
use std::sync::LazyLock;

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid word boundary pattern"));

static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid case boundary pattern"));

/// Expand a base URL to the web-services endpoint of `protocol`.
///
/// A `/` separator is inserted only if `url` does not already end with one.
pub fn expand_url(url: &str, protocol: Protocol) -> String {
    let ws_part = protocol.service_path();
    if url.ends_with('/') {
        format!("{}{}", url, ws_part)
    } else {
        format!("{}/{}", url, ws_part)
    }
}

/// Convert a CamelCase type name to its snake_case canonical name.
pub fn camel_to_snake(name: &str) -> String {
    let first = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    LOWER_UPPER.replace_all(&first, "${1}_${2}").to_lowercase()
}

/// Last path segment of a Rust type name (`magento_api::resources::Customer` -> `Customer`)
pub(crate) fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

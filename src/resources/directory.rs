//! Directory resources

use crate::error::Result;
use crate::registry::sub_api;
use serde_json::{json, Value};

sub_api! {
    /// `directory_country.*` methods
    Country => country
}

impl Country {
    pub async fn list(&self) -> Result<Value> {
        self.call("directory_country.list", json!([])).await
    }
}

sub_api! {
    /// `directory_region.*` methods
    Region => region
}

impl Region {
    /// Regions of a country (ISO 3166-1 alpha-2 code)
    pub async fn list(&self, country: &str) -> Result<Value> {
        self.call("directory_region.list", json!([country])).await
    }
}

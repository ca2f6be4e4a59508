//! Store views

use crate::error::Result;
use crate::registry::sub_api;
use serde_json::{json, Value};

sub_api! {
    /// `store.*` methods
    Store => store
}

impl Store {
    pub async fn list(&self) -> Result<Value> {
        self.call("store.list", json!([])).await
    }

    /// Store view by code or id
    pub async fn info(&self, store: impl Into<Value>) -> Result<Value> {
        self.call("store.info", json!([store.into()])).await
    }
}

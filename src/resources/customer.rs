//! Customer resources

use super::{filters_or_empty, positional, to_id, truthy};
use crate::error::Result;
use crate::registry::sub_api;
use serde_json::{json, Value};

sub_api! {
    /// `customer.*` methods
    Customer => customer
}

impl Customer {
    /// List customers matching `filters`
    pub async fn list(&self, filters: Option<Value>) -> Result<Value> {
        self.call("customer.list", json!([filters_or_empty(filters)]))
            .await
    }

    /// Customer record, optionally restricted to `attributes`
    pub async fn info(&self, customer_id: i64, attributes: Option<Vec<String>>) -> Result<Value> {
        let attributes = attributes.map(|a| json!(a)).unwrap_or(Value::Null);
        self.call("customer.info", positional(vec![json!(customer_id), attributes]))
            .await
    }

    /// Create a customer and return its id
    pub async fn create(&self, data: Value) -> Result<i64> {
        to_id(self.call("customer.create", json!([data])).await?)
    }

    pub async fn update(&self, customer_id: i64, data: Value) -> Result<bool> {
        let result = self
            .call("customer.update", json!([customer_id, data]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn delete(&self, customer_id: i64) -> Result<bool> {
        let result = self.call("customer.delete", json!([customer_id])).await?;
        Ok(truthy(&result))
    }
}

sub_api! {
    /// `customer_group.*` methods
    CustomerGroup => customer_group
}

impl CustomerGroup {
    pub async fn list(&self) -> Result<Value> {
        self.call("customer_group.list", json!([])).await
    }
}

sub_api! {
    /// `customer_address.*` methods
    CustomerAddress => customer_address
}

impl CustomerAddress {
    /// Addresses of one customer
    pub async fn list(&self, customer_id: i64) -> Result<Value> {
        self.call("customer_address.list", json!([customer_id]))
            .await
    }

    pub async fn info(&self, address_id: i64) -> Result<Value> {
        self.call("customer_address.info", json!([address_id]))
            .await
    }

    /// Add an address to a customer and return the address id
    pub async fn create(&self, customer_id: i64, data: Value) -> Result<i64> {
        to_id(
            self.call("customer_address.create", json!([customer_id, data]))
                .await?,
        )
    }

    pub async fn update(&self, address_id: i64, data: Value) -> Result<bool> {
        let result = self
            .call("customer_address.update", json!([address_id, data]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn delete(&self, address_id: i64) -> Result<bool> {
        let result = self
            .call("customer_address.delete", json!([address_id]))
            .await?;
        Ok(truthy(&result))
    }
}

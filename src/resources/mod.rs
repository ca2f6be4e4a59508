//! Resource sub-APIs
//!
//! Typed helpers over [`Api::call`](crate::api::Api::call) for the Magento v1
//! resources. Each sub-API is reachable from the root session through its
//! accessor (`api.customer().await?`) or by canonical name through
//! [`Api::sub_api`](crate::api::Api::sub_api).

pub mod catalog;
pub mod customer;
pub mod directory;
pub mod sales;
pub mod store;

pub use catalog::{Category, Inventory, Product, ProductAttributeSet, ProductTypes};
pub use customer::{Customer, CustomerAddress, CustomerGroup};
pub use directory::{Country, Region};
pub use sales::{SalesOrder, SalesOrderInvoice, SalesOrderShipment};
pub use store::Store;

use crate::error::{MagentoError, Result};
use crate::registry::Registration;
use serde_json::Value;

/// Registration table of every built-in sub-API
pub fn registrations() -> Vec<Registration> {
    vec![
        Registration::of::<Customer>(),
        Registration::of::<CustomerGroup>(),
        Registration::of::<CustomerAddress>(),
        Registration::of::<SalesOrder>(),
        Registration::of::<SalesOrderInvoice>(),
        Registration::of::<SalesOrderShipment>(),
        Registration::of::<Category>(),
        Registration::of::<Product>(),
        Registration::of::<ProductAttributeSet>(),
        Registration::of::<ProductTypes>(),
        Registration::of::<Inventory>(),
        Registration::of::<Country>(),
        Registration::of::<Region>(),
        Registration::of::<Store>(),
    ]
}

/// Positional arguments with trailing nulls dropped, so optional parameters
/// fall back to their server-side defaults
pub(crate) fn positional(mut args: Vec<Value>) -> Value {
    while matches!(args.last(), Some(Value::Null)) {
        args.pop();
    }
    Value::Array(args)
}

/// Filters argument; the v1 list methods expect an object even when empty
pub(crate) fn filters_or_empty(filters: Option<Value>) -> Value {
    filters.unwrap_or_else(|| Value::Object(Default::default()))
}

/// Numeric id returned by create methods, sometimes as a string
pub(crate) fn to_id(value: Value) -> Result<i64> {
    match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| MagentoError::MalformedResponse(format!("expected a numeric id, got {}", value)))
}

/// Success flag of update/delete methods
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

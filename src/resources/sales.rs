//! Sales resources: orders, invoices and shipments
//!
//! Sales documents are addressed by their increment id (the number shown to
//! customers), not by the internal entity id.

use super::{filters_or_empty, to_id, truthy};
use crate::error::Result;
use crate::registry::sub_api;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Quantities to invoice or ship, keyed by order item id
pub type ItemQuantities = HashMap<String, f64>;

sub_api! {
    /// `sales_order.*` methods
    SalesOrder => sales_order
}

impl SalesOrder {
    pub async fn list(&self, filters: Option<Value>) -> Result<Value> {
        self.call("sales_order.list", json!([filters_or_empty(filters)]))
            .await
    }

    pub async fn info(&self, order_increment_id: &str) -> Result<Value> {
        self.call("sales_order.info", json!([order_increment_id]))
            .await
    }

    /// Add a comment and change the order status
    pub async fn add_comment(
        &self,
        order_increment_id: &str,
        status: &str,
        comment: Option<&str>,
        notify: bool,
    ) -> Result<bool> {
        let result = self
            .call(
                "sales_order.addComment",
                json!([order_increment_id, status, comment, notify]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn hold(&self, order_increment_id: &str) -> Result<bool> {
        let result = self
            .call("sales_order.hold", json!([order_increment_id]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn unhold(&self, order_increment_id: &str) -> Result<bool> {
        let result = self
            .call("sales_order.unhold", json!([order_increment_id]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn cancel(&self, order_increment_id: &str) -> Result<bool> {
        let result = self
            .call("sales_order.cancel", json!([order_increment_id]))
            .await?;
        Ok(truthy(&result))
    }
}

sub_api! {
    /// `sales_order_invoice.*` methods
    SalesOrderInvoice => sales_order_invoice
}

impl SalesOrderInvoice {
    pub async fn list(&self, filters: Option<Value>) -> Result<Value> {
        self.call("sales_order_invoice.list", json!([filters_or_empty(filters)]))
            .await
    }

    pub async fn info(&self, invoice_increment_id: &str) -> Result<Value> {
        self.call("sales_order_invoice.info", json!([invoice_increment_id]))
            .await
    }

    /// Invoice an order and return the invoice increment id
    pub async fn create(
        &self,
        order_increment_id: &str,
        items_qty: &ItemQuantities,
        comment: Option<&str>,
        email: bool,
        include_comment: bool,
    ) -> Result<String> {
        let result = self
            .call(
                "sales_order_invoice.create",
                json!([order_increment_id, items_qty, comment, email, include_comment]),
            )
            .await?;
        Ok(increment_id(result))
    }

    pub async fn add_comment(
        &self,
        invoice_increment_id: &str,
        comment: Option<&str>,
        email: bool,
        include_comment: bool,
    ) -> Result<bool> {
        let result = self
            .call(
                "sales_order_invoice.addComment",
                json!([invoice_increment_id, comment, email, include_comment]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn capture(&self, invoice_increment_id: &str) -> Result<bool> {
        let result = self
            .call("sales_order_invoice.capture", json!([invoice_increment_id]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn void(&self, invoice_increment_id: &str) -> Result<bool> {
        let result = self
            .call("sales_order_invoice.void", json!([invoice_increment_id]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn cancel(&self, invoice_increment_id: &str) -> Result<bool> {
        let result = self
            .call("sales_order_invoice.cancel", json!([invoice_increment_id]))
            .await?;
        Ok(truthy(&result))
    }
}

sub_api! {
    /// `sales_order_shipment.*` methods
    SalesOrderShipment => sales_order_shipment
}

impl SalesOrderShipment {
    pub async fn list(&self, filters: Option<Value>) -> Result<Value> {
        self.call("sales_order_shipment.list", json!([filters_or_empty(filters)]))
            .await
    }

    pub async fn info(&self, shipment_increment_id: &str) -> Result<Value> {
        self.call("sales_order_shipment.info", json!([shipment_increment_id]))
            .await
    }

    /// Ship an order and return the shipment increment id.
    ///
    /// An empty `items_qty` ships every remaining item.
    pub async fn create(
        &self,
        order_increment_id: &str,
        items_qty: &ItemQuantities,
        comment: Option<&str>,
        email: bool,
        include_comment: bool,
    ) -> Result<String> {
        let result = self
            .call(
                "sales_order_shipment.create",
                json!([order_increment_id, items_qty, comment, email, include_comment]),
            )
            .await?;
        Ok(increment_id(result))
    }

    pub async fn add_comment(
        &self,
        shipment_increment_id: &str,
        comment: &str,
        email: bool,
        include_in_email: bool,
    ) -> Result<bool> {
        let result = self
            .call(
                "sales_order_shipment.addComment",
                json!([shipment_increment_id, comment, email, include_in_email]),
            )
            .await?;
        Ok(truthy(&result))
    }

    /// Attach a tracking number and return the track id
    pub async fn add_track(
        &self,
        shipment_increment_id: &str,
        carrier: &str,
        title: &str,
        track_number: &str,
    ) -> Result<i64> {
        to_id(
            self.call(
                "sales_order_shipment.addTrack",
                json!([shipment_increment_id, carrier, title, track_number]),
            )
            .await?,
        )
    }

    pub async fn remove_track(&self, shipment_increment_id: &str, track_id: i64) -> Result<bool> {
        let result = self
            .call(
                "sales_order_shipment.removeTrack",
                json!([shipment_increment_id, track_id]),
            )
            .await?;
        Ok(truthy(&result))
    }

    /// Carriers allowed for an order
    pub async fn get_carriers(&self, order_increment_id: &str) -> Result<Value> {
        self.call("sales_order_shipment.getCarriers", json!([order_increment_id]))
            .await
    }
}

fn increment_id(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

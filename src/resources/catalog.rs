//! Catalog resources: categories, products, attribute sets, product types
//! and stock items

use super::{filters_or_empty, positional, to_id, truthy};
use crate::error::Result;
use crate::registry::sub_api;
use serde_json::{json, Value};

/// Store view argument (code or id) accepted by the catalog methods
pub type StoreView = Option<Value>;

fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

sub_api! {
    /// `catalog_category.*` methods
    Category => category
}

impl Category {
    /// Set (or read, with `None`) the store view used by later category calls
    pub async fn current_store(&self, store_view: StoreView) -> Result<i64> {
        to_id(
            self.call("catalog_category.currentStore", positional(vec![opt(store_view)]))
                .await?,
        )
    }

    /// Category tree below `parent_id` (the root when `None`)
    pub async fn tree(&self, parent_id: Option<i64>, store_view: StoreView) -> Result<Value> {
        self.call(
            "catalog_category.tree",
            positional(vec![opt(parent_id), opt(store_view)]),
        )
        .await
    }

    /// One level of categories
    pub async fn level(
        &self,
        website: Option<Value>,
        store_view: StoreView,
        parent_category: Option<i64>,
    ) -> Result<Value> {
        self.call(
            "catalog_category.level",
            positional(vec![opt(website), opt(store_view), opt(parent_category)]),
        )
        .await
    }

    pub async fn info(
        &self,
        category_id: i64,
        store_view: StoreView,
        attributes: Option<Vec<String>>,
    ) -> Result<Value> {
        self.call(
            "catalog_category.info",
            positional(vec![
                json!(category_id),
                opt(store_view),
                opt(attributes.map(|a| json!(a))),
            ]),
        )
        .await
    }

    /// Create a category below `parent_id` and return its id
    pub async fn create(&self, parent_id: i64, data: Value, store_view: StoreView) -> Result<i64> {
        to_id(
            self.call(
                "catalog_category.create",
                positional(vec![json!(parent_id), data, opt(store_view)]),
            )
            .await?,
        )
    }

    pub async fn update(&self, category_id: i64, data: Value, store_view: StoreView) -> Result<bool> {
        let result = self
            .call(
                "catalog_category.update",
                positional(vec![json!(category_id), data, opt(store_view)]),
            )
            .await?;
        Ok(truthy(&result))
    }

    /// Move a category under `parent_id`, after sibling `after_id` if given
    pub async fn move_category(
        &self,
        category_id: i64,
        parent_id: i64,
        after_id: Option<i64>,
    ) -> Result<bool> {
        let result = self
            .call(
                "catalog_category.move",
                positional(vec![json!(category_id), json!(parent_id), opt(after_id)]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn delete(&self, category_id: i64) -> Result<bool> {
        let result = self
            .call("catalog_category.delete", json!([category_id]))
            .await?;
        Ok(truthy(&result))
    }

    pub async fn assigned_products(&self, category_id: i64, store: Option<Value>) -> Result<Value> {
        self.call(
            "catalog_category.assignedProducts",
            positional(vec![json!(category_id), opt(store)]),
        )
        .await
    }

    pub async fn assign_product(
        &self,
        category_id: i64,
        product: impl Into<Value>,
        position: Option<i64>,
    ) -> Result<bool> {
        let result = self
            .call(
                "catalog_category.assignProduct",
                positional(vec![json!(category_id), product.into(), opt(position)]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn update_product(
        &self,
        category_id: i64,
        product: impl Into<Value>,
        position: Option<i64>,
    ) -> Result<bool> {
        let result = self
            .call(
                "catalog_category.updateProduct",
                positional(vec![json!(category_id), product.into(), opt(position)]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn remove_product(&self, category_id: i64, product: impl Into<Value>) -> Result<bool> {
        let result = self
            .call(
                "catalog_category.removeProduct",
                json!([category_id, product.into()]),
            )
            .await?;
        Ok(truthy(&result))
    }
}

sub_api! {
    /// `catalog_product.*` methods.
    ///
    /// Products are identified by id or SKU; pass `identifier_type` (`"sku"`
    /// or `"id"`) when a numeric SKU would otherwise be read as an id.
    Product => product
}

impl Product {
    pub async fn current_store(&self, store_view: StoreView) -> Result<i64> {
        to_id(
            self.call("catalog_product.currentStore", positional(vec![opt(store_view)]))
                .await?,
        )
    }

    pub async fn list(&self, filters: Option<Value>, store_view: StoreView) -> Result<Value> {
        self.call(
            "catalog_product.list",
            positional(vec![filters_or_empty(filters), opt(store_view)]),
        )
        .await
    }

    pub async fn info(
        &self,
        product: impl Into<Value>,
        store_view: StoreView,
        attributes: Option<Vec<String>>,
        identifier_type: Option<&str>,
    ) -> Result<Value> {
        self.call(
            "catalog_product.info",
            positional(vec![
                product.into(),
                opt(store_view),
                opt(attributes.map(|a| json!(a))),
                opt(identifier_type),
            ]),
        )
        .await
    }

    /// Create a product and return its id
    pub async fn create(
        &self,
        product_type: &str,
        attribute_set_id: i64,
        sku: &str,
        data: Value,
    ) -> Result<i64> {
        to_id(
            self.call(
                "catalog_product.create",
                json!([product_type, attribute_set_id, sku, data]),
            )
            .await?,
        )
    }

    pub async fn update(
        &self,
        product: impl Into<Value>,
        data: Value,
        store_view: StoreView,
        identifier_type: Option<&str>,
    ) -> Result<bool> {
        let result = self
            .call(
                "catalog_product.update",
                positional(vec![product.into(), data, opt(store_view), opt(identifier_type)]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn delete(&self, product: impl Into<Value>, identifier_type: Option<&str>) -> Result<bool> {
        let result = self
            .call(
                "catalog_product.delete",
                positional(vec![product.into(), opt(identifier_type)]),
            )
            .await?;
        Ok(truthy(&result))
    }

    pub async fn get_special_price(
        &self,
        product: impl Into<Value>,
        store_view: StoreView,
        identifier_type: Option<&str>,
    ) -> Result<Value> {
        self.call(
            "catalog_product.getSpecialPrice",
            positional(vec![product.into(), opt(store_view), opt(identifier_type)]),
        )
        .await
    }

    /// Set a special price valid between the optional dates (`YYYY-MM-DD`)
    pub async fn set_special_price(
        &self,
        product: impl Into<Value>,
        special_price: Option<f64>,
        from_date: Option<&str>,
        to_date: Option<&str>,
        store_view: StoreView,
        identifier_type: Option<&str>,
    ) -> Result<bool> {
        let result = self
            .call(
                "catalog_product.setSpecialPrice",
                positional(vec![
                    product.into(),
                    opt(special_price),
                    opt(from_date),
                    opt(to_date),
                    opt(store_view),
                    opt(identifier_type),
                ]),
            )
            .await?;
        Ok(truthy(&result))
    }
}

sub_api! {
    /// `catalog_product_attribute_set.*` methods
    ProductAttributeSet => product_attribute_set
}

impl ProductAttributeSet {
    pub async fn list(&self) -> Result<Value> {
        self.call("catalog_product_attribute_set.list", json!([]))
            .await
    }
}

sub_api! {
    /// `catalog_product_type.*` methods
    ProductTypes => product_types
}

impl ProductTypes {
    pub async fn list(&self) -> Result<Value> {
        self.call("catalog_product_type.list", json!([])).await
    }
}

sub_api! {
    /// `cataloginventory_stock_item.*` methods
    Inventory => inventory
}

impl Inventory {
    /// Stock data of the given product ids or SKUs
    pub async fn list(&self, products: &[Value]) -> Result<Value> {
        self.call("cataloginventory_stock_item.list", json!([products]))
            .await
    }

    pub async fn update(&self, product: impl Into<Value>, data: Value) -> Result<bool> {
        let result = self
            .call(
                "cataloginventory_stock_item.update",
                json!([product.into(), data]),
            )
            .await?;
        Ok(truthy(&result))
    }
}

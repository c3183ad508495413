use async_trait::async_trait;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::dao::table::{hydrate, Table, TableError};

/// One row of the `products` table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: i32,
    pub product_name: String,
    pub product_description: String,
    #[serde(deserialize_with = "decimal")]
    pub product_price: f64,
    pub product_img_url: String,
    pub product_status: String,
}

/// Prices come back as text or as a number depending on the column type.
fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("price out of range")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid price: {s}"))),
        other => Err(D::Error::custom(format!("invalid price: {other}"))),
    }
}

/// Everything the maintenance screens need from storage. Writes report the
/// number of affected rows.
#[async_trait]
pub trait ProductsDao: Send + Sync {
    async fn get_products(&self) -> Result<Vec<ProductRecord>, TableError>;

    async fn get_product_by_id(&self, product_id: i32) -> Result<Option<ProductRecord>, TableError>;

    async fn insert_product(
        &self,
        name: &str,
        description: &str,
        price: f64,
        img_url: &str,
        status: &str,
    ) -> Result<u64, TableError>;

    async fn update_product(
        &self,
        product_id: i32,
        name: &str,
        description: &str,
        price: f64,
        img_url: &str,
        status: &str,
    ) -> Result<u64, TableError>;

    async fn delete_product(&self, product_id: i32) -> Result<u64, TableError>;
}

const SELECT_PRODUCTS: &str = "SELECT product_id, product_name, product_description, \
     product_price, product_img_url, product_status FROM products";

pub struct SqlProductsDao {
    table: Table,
}

impl SqlProductsDao {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

#[async_trait]
impl ProductsDao for SqlProductsDao {
    async fn get_products(&self) -> Result<Vec<ProductRecord>, TableError> {
        let sql = format!("{SELECT_PRODUCTS} ORDER BY product_id");
        self.table
            .fetch_all(&sql, &[])
            .await?
            .into_iter()
            .map(hydrate)
            .collect()
    }

    async fn get_product_by_id(&self, product_id: i32) -> Result<Option<ProductRecord>, TableError> {
        let sql = format!("{SELECT_PRODUCTS} WHERE product_id = :product_id");
        match self
            .table
            .fetch_one(&sql, &[("product_id", json!(product_id))])
            .await?
        {
            Some(row) => Ok(Some(hydrate(row)?)),
            None => Ok(None),
        }
    }

    async fn insert_product(
        &self,
        name: &str,
        description: &str,
        price: f64,
        img_url: &str,
        status: &str,
    ) -> Result<u64, TableError> {
        self.table
            .execute_non_query(
                "INSERT INTO products (product_name, product_description, product_price, \
                 product_img_url, product_status) \
                 VALUES (:product_name, :product_description, :product_price, \
                 :product_img_url, :product_status)",
                &[
                    ("product_name", json!(name)),
                    ("product_description", json!(description)),
                    ("product_price", json!(price)),
                    ("product_img_url", json!(img_url)),
                    ("product_status", json!(status)),
                ],
            )
            .await
    }

    async fn update_product(
        &self,
        product_id: i32,
        name: &str,
        description: &str,
        price: f64,
        img_url: &str,
        status: &str,
    ) -> Result<u64, TableError> {
        self.table
            .execute_non_query(
                "UPDATE products SET product_name = :product_name, \
                 product_description = :product_description, product_price = :product_price, \
                 product_img_url = :product_img_url, product_status = :product_status \
                 WHERE product_id = :product_id",
                &[
                    ("product_id", json!(product_id)),
                    ("product_name", json!(name)),
                    ("product_description", json!(description)),
                    ("product_price", json!(price)),
                    ("product_img_url", json!(img_url)),
                    ("product_status", json!(status)),
                ],
            )
            .await
    }

    async fn delete_product(&self, product_id: i32) -> Result<u64, TableError> {
        self.table
            .execute_non_query(
                "DELETE FROM products WHERE product_id = :product_id",
                &[("product_id", json!(product_id))],
            )
            .await
    }
}

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::controllers::products::mode::Mode;
use crate::dao::ProductRecord;
use crate::entities::product::ProductStatus;

/// Messages per scope: a form field name or `global`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Everything handed to the maintenance template for one response.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductViewModel {
    pub mode: Mode,
    pub product_id: i32,
    pub product_name: String,
    pub product_description: String,
    pub product_price: f64,
    pub product_img_url: String,
    pub product_status: String,
    pub form_title: String,
    pub readonly: bool,
    pub show_commit_btn: bool,
    #[serde(rename = "product_xss_token")]
    pub xss_token: String,
    pub errors: FieldErrors,
    /// `productStatus_<code>` and `<scope>_error` entries.
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
}

impl ProductViewModel {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            product_id: 0,
            product_name: String::new(),
            product_description: String::new(),
            product_price: 0.0,
            product_img_url: String::new(),
            product_status: ProductStatus::default().code().to_string(),
            form_title: String::new(),
            readonly: false,
            show_commit_btn: true,
            xss_token: String::new(),
            errors: FieldErrors::new(),
            fields: BTreeMap::new(),
            timestamp: None,
            product: None,
        }
    }

    pub fn load(&mut self, record: ProductRecord) {
        self.product_name = record.product_name;
        self.product_description = record.product_description;
        self.product_price = record.product_price;
        self.product_img_url = record.product_img_url;
        self.product_status = record.product_status;
    }

    pub fn add_error(&mut self, scope: &str, message: impl Into<String>) {
        self.errors
            .entry(scope.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn status_key(&self) -> String {
        format!("productStatus_{}", self.product_status.to_lowercase())
    }

    /// Template lookup for flattened entries; absent keys read as empty.
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Nested copy of the product fields kept for templates that address them as
/// `product.*`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: i32,
    pub product_name: String,
    pub product_description: String,
    pub product_price: f64,
    pub product_img_url: String,
    pub product_status: String,
    pub mode: Mode,
    #[serde(rename = "product_xss_token")]
    pub xss_token: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ProductSnapshot {
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Hex SHA-256 over the JSON form of `view`.
pub fn anti_forgery_token<T: Serialize>(view: &T) -> Result<String, serde_json::Error> {
    let snapshot = serde_json::to_string(view)?;
    let mut hasher = Sha256::new();
    hasher.update(snapshot.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

use std::collections::HashMap;

use validator::{Validate, ValidationError};

use crate::controllers::products::{error::ControllerError, mode::Mode};
use crate::entities::product::ProductStatus;

pub type Params = HashMap<String, String>;

/// Query string of the maintenance page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProductQuery {
    pub mode: Mode,
    /// Always present unless the mode is INSERT.
    pub product_id: Option<i32>,
}

impl ProductQuery {
    pub fn parse(params: &Params) -> Result<Self, ControllerError> {
        let raw_mode = params.get("mode").ok_or(ControllerError::MissingMode)?;
        let mode =
            Mode::from_code(raw_mode).ok_or_else(|| ControllerError::InvalidMode(raw_mode.clone()))?;

        if !mode.needs_existing() {
            return Ok(Self { mode, product_id: None });
        }

        let raw_id = params
            .get("productId")
            .ok_or(ControllerError::MissingProductId)?;
        let product_id = parse_id(raw_id)
            .ok_or_else(|| ControllerError::InvalidProductId(raw_id.clone()))?;

        Ok(Self {
            mode,
            product_id: Some(product_id),
        })
    }
}

/// Editable fields as posted. Missing keys fall back to blanks so that
/// validation reports them.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub img_url: String,
    pub status: String,
}

/// A checked form post-back. Parsing fails on a missing id or token, on an id
/// that differs from the query, and on a token that differs from the stored one.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductPost {
    pub product_id: Option<i32>,
    pub token: String,
    /// Only read for modes that accept edits.
    pub fields: Option<ProductFields>,
}

impl ProductPost {
    pub fn parse(
        query: &ProductQuery,
        body: &Params,
        stored_token: Option<&str>,
    ) -> Result<Self, ControllerError> {
        let raw_id = match query.product_id {
            Some(_) => Some(
                body.get("productId")
                    .ok_or(ControllerError::MissingBodyProductId)?,
            ),
            None => None,
        };

        let token = body.get("token").ok_or(ControllerError::MissingToken)?;

        let product_id = match (query.product_id, raw_id) {
            (Some(expected), Some(raw)) => match parse_id(raw) {
                Some(received) if received == expected => Some(received),
                _ => {
                    return Err(ControllerError::InconsistentProductId {
                        expected,
                        received: raw.clone(),
                    })
                }
            },
            _ => None,
        };

        if stored_token != Some(token.as_str()) {
            return Err(ControllerError::InvalidToken {
                expected: stored_token.unwrap_or_default().to_string(),
                received: token.clone(),
            });
        }

        let fields = query.mode.accepts_edits().then(|| ProductFields {
            name: body.get("productName").cloned().unwrap_or_default(),
            description: body.get("productDescription").cloned().unwrap_or_default(),
            price: body
                .get("productPrice")
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|price| price.is_finite())
                .unwrap_or(0.0),
            img_url: body.get("productImgUrl").cloned().unwrap_or_default(),
            status: body
                .get("productStatus")
                .cloned()
                .unwrap_or_else(|| ProductStatus::default().code().to_string()),
        });

        Ok(Self {
            product_id,
            token: token.clone(),
            fields,
        })
    }
}

fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

#[derive(Debug, Validate)]
pub struct ProductForm {
    #[validate(custom(
        function = "not_blank",
        message = "El nombre del producto es requerido"
    ))]
    pub name: String,
    #[validate(custom(
        function = "not_blank",
        message = "La descripción del producto es requerida"
    ))]
    pub description: String,
    #[validate(range(
        exclusive_min = 0.0,
        message = "El precio del producto es requerido y debe ser un valor mayor a cero"
    ))]
    pub price: f64,
    #[validate(custom(function = "not_blank", message = "La imagen del producto es requerida"))]
    pub img_url: String,
    #[validate(custom(function = "known_status", message = "El estado del producto es invalido"))]
    pub status: String,
}

impl ProductForm {
    /// Runs every rule and groups the messages by form field name.
    pub fn errors(&self) -> Vec<(&'static str, String)> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            let field: &str = field.as_ref();
            let scope = form_field(field);
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_deref()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.code.to_string());
                found.push((scope, message));
            }
        }
        found.sort_by_key(|(scope, _)| field_order(scope));
        found
    }
}

const FIELD_ORDER: [&str; 5] = [
    "productName",
    "productDescription",
    "productPrice",
    "productImgUrl",
    "productStatus",
];

fn form_field(field: &str) -> &'static str {
    match field {
        "name" => FIELD_ORDER[0],
        "description" => FIELD_ORDER[1],
        "price" => FIELD_ORDER[2],
        "img_url" => FIELD_ORDER[3],
        _ => FIELD_ORDER[4],
    }
}

fn field_order(scope: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|known| *known == scope)
        .unwrap_or(FIELD_ORDER.len())
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn known_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<ProductStatus>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("status"))
}

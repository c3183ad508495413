use thiserror::Error;

use crate::dao::TableError;

const GENERIC_MESSAGE: &str = "Algo salió mal, intenta de nuevo.";

/// Errors that end the request with a redirect to the product list.
/// `Display` is the diagnostic line for the log; `user_message` is what the
/// user reads in the flash message.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Attempt to load controller without the required query parameter MODE")]
    MissingMode,
    #[error("Attempt to load controller with wrong value on query parameter MODE - {0}")]
    InvalidMode(String),
    #[error("Attempt to load controller without the required query parameter PRODUCTID")]
    MissingProductId,
    #[error("Attempt to load controller with wrong value on query parameter PRODUCTID - {0}")]
    InvalidProductId(String),
    #[error("Record for productId {0} not found")]
    ProductNotFound(i32),
    #[error("Failed to load productId {product_id}: {source}")]
    Load {
        product_id: i32,
        #[source]
        source: TableError,
    },
    #[error("Trying to post without parameter PRODUCTID on body")]
    MissingBodyProductId,
    #[error("Trying to post without parameter TOKEN on body")]
    MissingToken,
    #[error("Inconsistent PRODUCTID value. Expected: {expected}, Received: {received}")]
    InconsistentProductId { expected: i32, received: String },
    #[error("Invalid XSSToken. Expected: {expected}, Received: {received}")]
    InvalidToken { expected: String, received: String },
    #[error("Malformed request parameters: {0}")]
    MalformedRequest(String),
    #[error("Failed to serialize view data: {0}")]
    ViewData(#[from] serde_json::Error),
}

impl ControllerError {
    pub fn user_message(&self) -> String {
        match self {
            ControllerError::InvalidMode(_) => "Formulario cargado en modalidad invalida".into(),
            ControllerError::MissingProductId => "ID de producto no proporcionado".into(),
            ControllerError::InvalidProductId(_) => "ID de producto inválido".into(),
            ControllerError::ProductNotFound(id) => {
                format!("No se encontró el Producto con ID: {}", id)
            }
            _ => GENERIC_MESSAGE.into(),
        }
    }
}

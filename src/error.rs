use crate::model::{AttributeId, ProductId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacetError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Attribute not found: {0}")]
    AttributeNotFound(AttributeId),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Search backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, FacetError>;

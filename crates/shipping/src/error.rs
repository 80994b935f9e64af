use thiserror::Error;

use storefront_core::{DomainError, ProductId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShippingError {
    #[error("product {product} has no value for attribute '{code}'")]
    MissingAttribute { product: ProductId, code: String },

    #[error("product {product} has a non-numeric '{code}' value: {value}")]
    InvalidWeight {
        product: ProductId,
        code: String,
        value: String,
    },

    #[error("product {0} is not in the catalogue")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type ShippingResult<T> = Result<T, ShippingError>;

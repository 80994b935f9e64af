use thiserror::Error;

use storefront_core::{DomainError, PartnerId, StockRecordId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: u32, available: u32 },

    #[error("partner {partner} already has a stock record with SKU '{sku}'")]
    DuplicateSku { partner: PartnerId, sku: String },

    #[error("stock record {0} not found")]
    RecordNotFound(StockRecordId),

    #[error("partner {0} not found")]
    PartnerNotFound(PartnerId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type StockResult<T> = Result<T, StockError>;

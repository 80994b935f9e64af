use thiserror::Error;

use storefront_core::{DomainError, FieldErrors};
use storefront_partner::StockError;

/// Message shown alongside form errors.
pub const INVALID_SUBMISSION: &str =
    "Your submitted data was not valid - please correct the errors below";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// The submission failed validation; nothing was stored.
    #[error("invalid submission: {0}")]
    Invalid(FieldErrors),

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Stock(#[from] StockError),
}

impl From<FieldErrors> for DashboardError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

impl DashboardError {
    /// Field errors of an invalid submission.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

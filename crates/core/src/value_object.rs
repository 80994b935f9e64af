//! Money: an immutable value compared by amount and currency.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// An amount in the smallest currency unit (e.g. pence) tagged with an ISO
/// currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: u64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: u64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    /// Multiply by a quantity, failing on overflow.
    pub fn times(&self, quantity: u32) -> Result<Self, DomainError> {
        let amount = self
            .amount
            .checked_mul(u64::from(quantity))
            .ok_or_else(|| DomainError::validation("amount overflow"))?;
        Ok(Self::new(amount, self.currency.clone()))
    }

    /// Add two amounts of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Self, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::invariant(format!(
                "currency mismatch ({} vs {})",
                self.currency, other.currency
            )));
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::validation("amount overflow"))?;
        Ok(Self::new(amount, self.currency.clone()))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}.{:02}", self.currency, self.amount / 100, self.amount % 100)
    }
}

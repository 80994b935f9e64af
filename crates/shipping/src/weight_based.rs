//! Shipping charged by basket weight, in bands.

use serde::{Deserialize, Serialize};

use storefront_basket::Basket;
use storefront_catalogue::Catalogue;
use storefront_config::DEFAULT_WEIGHT_ATTRIBUTE;
use storefront_core::{DomainError, DomainResult, Money};

use crate::error::ShippingResult;
use crate::scale::Scale;

/// Charge for weights up to and including `upper_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBand {
    pub upper_limit: f64,
    /// Minor units.
    pub charge: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBased {
    pub name: String,
    pub currency: String,
    pub weight_attribute: String,
    /// Weight assumed for products without a weight value.
    pub default_weight: f64,
    bands: Vec<WeightBand>,
}

impl WeightBased {
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: currency.into(),
            weight_attribute: DEFAULT_WEIGHT_ATTRIBUTE.to_string(),
            default_weight: 0.0,
            bands: Vec::new(),
        }
    }

    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    /// Bands ordered by upper limit.
    pub fn bands(&self) -> &[WeightBand] {
        &self.bands
    }

    pub fn add_band(&mut self, upper_limit: f64, charge: u64) -> DomainResult<()> {
        if !(upper_limit > 0.0 && upper_limit.is_finite()) {
            return Err(DomainError::validation("upper limit must be a positive number"));
        }
        if self.bands.iter().any(|b| b.upper_limit == upper_limit) {
            return Err(DomainError::conflict(format!(
                "a band with upper limit {upper_limit} already exists"
            )));
        }
        self.bands.push(WeightBand { upper_limit, charge });
        self.bands
            .sort_by(|a, b| a.upper_limit.total_cmp(&b.upper_limit));
        Ok(())
    }

    pub fn top_band(&self) -> Option<&WeightBand> {
        self.bands.last()
    }

    /// The smallest band covering `weight`.
    pub fn band_for_weight(&self, weight: f64) -> Option<&WeightBand> {
        self.bands.iter().find(|b| b.upper_limit >= weight)
    }

    /// Charge for a weight. Weights beyond the top band are charged as
    /// whole multiples of the top band plus the band covering the remainder.
    pub fn charge_for_weight(&self, weight: f64) -> DomainResult<Money> {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(DomainError::validation(format!(
                "weight must be a finite, non-negative number, got {weight}"
            )));
        }
        let Some(top) = self.top_band() else {
            return Ok(Money::zero(self.currency.clone()));
        };
        if weight < top.upper_limit {
            let charge = self.band_for_weight(weight).map_or(0, |b| b.charge);
            return Ok(Money::new(charge, self.currency.clone()));
        }

        let quotient = (weight / top.upper_limit).floor();
        let remainder = weight - quotient * top.upper_limit;
        let mut charge = (quotient as u64).saturating_mul(top.charge);
        if remainder > 0.0 {
            charge = charge.saturating_add(self.band_for_weight(remainder).map_or(0, |b| b.charge));
        }
        Ok(Money::new(charge, self.currency.clone()))
    }

    pub fn scale(&self) -> Scale {
        Scale::new(self.weight_attribute.clone()).with_default_weight(self.default_weight)
    }

    /// Charge for a basket's total weight.
    pub fn calculate(&self, basket: &Basket, catalogue: &Catalogue) -> ShippingResult<Money> {
        let weight = self.scale().weigh_basket(basket, catalogue)?;
        let charge = self.charge_for_weight(weight)?;
        tracing::debug!(method = %self.name, weight, charge = charge.amount, "shipping calculated");
        Ok(charge)
    }
}

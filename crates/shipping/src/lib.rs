//! `storefront-shipping`: weighing baskets and charging by weight.

pub mod error;
pub mod scale;
pub mod weight_based;

pub use error::{ShippingError, ShippingResult};
pub use scale::Scale;
pub use weight_based::{WeightBand, WeightBased};

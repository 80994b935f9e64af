//! `storefront-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every storefront
//! bounded context (no storage, no HTTP).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod slug;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{
    AttributeId, BasketId, CategoryId, OrderId, PartnerId, ProductClassId, ProductId, RangeId,
    StockRecordId, UserId,
};
pub use slug::{slugify, unique_slug};
pub use value_object::Money;

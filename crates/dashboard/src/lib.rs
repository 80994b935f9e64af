//! `storefront-dashboard`: staff and partner back-office workflows.
//!
//! The dashboard ties the catalogue, stock and range stores together:
//! permission-filtered product lists, all-or-nothing product saves with
//! their dependent formsets, cascading deletes, and bulk range uploads.

pub mod access;
pub mod error;
pub mod formsets;
pub mod products;
pub mod ranges;
pub mod store;

pub use access::{DashboardUser, can_access_product, can_use_partner, filter_products, partner_scope, partners_for};
pub use error::{DashboardError, DashboardResult, INVALID_SUBMISSION};
pub use formsets::{CategoryFormData, ImageFormData, StockRecordFormData};
pub use products::{Deleted, NextPage, ProductEditor, ProductSubmission, SaveAction, Saved};
pub use ranges::{RangeEditor, UploadReport};
pub use store::Store;

//! `storefront-partner`: fulfilment partners, stock records and the
//! purchase strategy that turns them into prices and availability.

pub mod error;
pub mod partner;
pub mod stock_book;
pub mod stock_record;
pub mod strategy;

pub use error::{StockError, StockResult};
pub use partner::Partner;
pub use stock_book::StockBook;
pub use stock_record::StockRecord;
pub use strategy::{Availability, PurchaseInfo, Strategy, UseFirstStockRecord};

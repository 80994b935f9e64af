//! `storefront-order`: placed orders and the basket-to-order workflow.

pub mod creator;
pub mod order;

pub use creator::{OrderCreator, OrderError};
pub use order::{Order, OrderLine};

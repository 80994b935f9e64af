//! `storefront-basket`: the basket aggregate.

pub mod basket;

pub use basket::{
    AddProduct, Basket, BasketCommand, BasketCreated, BasketEvent, BasketStatus, ChangeStatus,
    CreateBasket, Line, LineAdded, LineQuantityChanged, LineRemoved, StatusChanged,
    UpdateLineQuantity,
};

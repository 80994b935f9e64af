//! Turning a basket into an order.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use storefront_basket::{Basket, BasketCommand, BasketEvent, BasketStatus, ChangeStatus};
use storefront_catalogue::Catalogue;
use storefront_core::{Aggregate, DomainError, Money, ProductId, StockRecordId};
use storefront_events::EventLog;
use storefront_partner::{StockBook, StockError};

use crate::order::{Order, OrderLine};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Empty baskets cannot be submitted")]
    EmptyBasket,

    #[error("basket has already been submitted")]
    BasketSubmitted,

    #[error("product {0} no longer exists")]
    ProductNotFound(ProductId),

    #[error("stock record {0} no longer exists")]
    StockRecordNotFound(StockRecordId),

    #[error("stock record {stockrecord} does not belong to product {product}")]
    StockRecordMismatch {
        product: ProductId,
        stockrecord: StockRecordId,
    },

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Places orders and hands out sequential order numbers.
#[derive(Debug, Clone)]
pub struct OrderCreator {
    next_number: u64,
    basket_events: EventLog<BasketEvent>,
}

impl Default for OrderCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderCreator {
    pub const FIRST_NUMBER: u64 = 100_000;

    pub fn new() -> Self {
        Self {
            next_number: Self::FIRST_NUMBER,
            basket_events: EventLog::new(),
        }
    }

    /// Submission events of the baskets turned into orders so far.
    pub fn basket_events(&self) -> &EventLog<BasketEvent> {
        &self.basket_events
    }

    /// Snapshot the basket into an order, allocate stock for classes that
    /// track it, and submit the basket.
    ///
    /// Nothing is changed unless every step can succeed: stock levels are
    /// checked for all lines before any allocation is made.
    pub fn place_order(
        &mut self,
        basket: &mut Basket,
        catalogue: &Catalogue,
        stock: &mut StockBook,
        shipping_charge: Money,
    ) -> Result<Order, OrderError> {
        if basket.status() == BasketStatus::Submitted {
            return Err(OrderError::BasketSubmitted);
        }
        if basket.is_empty() {
            return Err(OrderError::EmptyBasket);
        }

        let mut lines = Vec::with_capacity(basket.num_lines());
        let mut allocations: HashMap<StockRecordId, u32> = HashMap::new();
        let mut total = shipping_charge.clone();

        for line in basket.lines() {
            let product = catalogue
                .product(line.product_id)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            let record = stock
                .record(line.stockrecord_id)
                .ok_or(OrderError::StockRecordNotFound(line.stockrecord_id))?;
            if record.product_id() != line.product_id {
                return Err(OrderError::StockRecordMismatch {
                    product: line.product_id,
                    stockrecord: line.stockrecord_id,
                });
            }
            let partner_name = stock
                .partner(record.partner_id())
                .map(|p| p.name.clone())
                .unwrap_or_default();

            if catalogue.tracks_stock(product) {
                let available = record.net_stock_level();
                let wanted = allocations.entry(record.id_typed()).or_default();
                *wanted = wanted
                    .checked_add(line.quantity)
                    .filter(|total| *total <= available)
                    .ok_or(StockError::Insufficient {
                        requested: wanted.saturating_add(line.quantity),
                        available,
                    })?;
            }

            let line_price = line.line_price()?;
            total = total.checked_add(&line_price)?;
            lines.push(OrderLine {
                product_id: product.id_typed(),
                title: catalogue.display_title(product),
                upc: product.upc().map(str::to_string),
                partner_id: record.partner_id(),
                partner_name,
                stockrecord_id: record.id_typed(),
                partner_sku: record.partner_sku().to_string(),
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
                line_price,
            });
        }

        for (record, quantity) in &allocations {
            stock.allocate(*record, *quantity)?;
        }
        let events = basket.execute(&BasketCommand::Submit(ChangeStatus {
            basket_id: basket.id_typed(),
            occurred_at: Utc::now(),
        }))?;
        self.basket_events.record(events);

        let number = self.next_number.to_string();
        self.next_number += 1;
        let order = Order::new(number, basket.id_typed(), basket.owner(), lines, shipping_charge, total);
        tracing::info!(
            order_number = %order.number,
            basket_id = %order.basket_id,
            lines = order.lines.len(),
            "order placed"
        );
        Ok(order)
    }
}

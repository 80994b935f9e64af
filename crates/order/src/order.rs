use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{BasketId, Money, OrderId, PartnerId, ProductId, StockRecordId, UserId};

/// A placed order line.
///
/// Product and partner details are copied at placement time so the order
/// still reads correctly after the catalogue changes or the product is
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub upc: Option<String>,
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub stockrecord_id: StockRecordId,
    pub partner_sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    pub number: String,
    pub basket_id: BasketId,
    pub user: Option<UserId>,
    pub lines: Vec<OrderLine>,
    pub shipping_charge: Money,
    pub total_excl_tax: Money,
    pub date_placed: DateTime<Utc>,
}

impl Order {
    pub(crate) fn new(
        number: String,
        basket_id: BasketId,
        user: Option<UserId>,
        lines: Vec<OrderLine>,
        shipping_charge: Money,
        total_excl_tax: Money,
    ) -> Self {
        Self {
            id: OrderId::new(),
            number,
            basket_id,
            user,
            lines,
            shipping_charge,
            total_excl_tax,
            date_placed: Utc::now(),
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn num_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn currency(&self) -> &str {
        &self.total_excl_tax.currency
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Money, PartnerId, ProductId, StockRecordId};

use crate::error::{StockError, StockResult};

/// A partner's offer for one sellable (child or standalone) product: SKU,
/// price and stock levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: StockRecordId,
    product: ProductId,
    partner: PartnerId,
    partner_sku: String,
    /// Minor units (pence, cents).
    pub price_excl_tax: u64,
    pub price_currency: String,
    pub num_in_stock: u32,
    /// Units reserved by placed orders but not yet shipped.
    num_allocated: u32,
    pub low_stock_threshold: Option<u32>,
    date_created: DateTime<Utc>,
    date_updated: DateTime<Utc>,
}

impl StockRecord {
    pub fn new(
        product: ProductId,
        partner: PartnerId,
        partner_sku: impl Into<String>,
        price: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StockRecordId::new(),
            product,
            partner,
            partner_sku: partner_sku.into().trim().to_string(),
            price_excl_tax: price.amount,
            price_currency: price.currency,
            num_in_stock: 0,
            num_allocated: 0,
            low_stock_threshold: None,
            date_created: now,
            date_updated: now,
        }
    }

    pub fn with_stock(mut self, num_in_stock: u32) -> Self {
        self.num_in_stock = num_in_stock;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn id_typed(&self) -> StockRecordId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product
    }

    pub fn partner_id(&self) -> PartnerId {
        self.partner
    }

    pub fn partner_sku(&self) -> &str {
        &self.partner_sku
    }

    pub fn set_partner_sku(&mut self, sku: impl Into<String>) {
        self.partner_sku = sku.into().trim().to_string();
    }

    pub fn num_allocated(&self) -> u32 {
        self.num_allocated
    }

    pub fn price(&self) -> Money {
        Money::new(self.price_excl_tax, self.price_currency.clone())
    }

    /// Units that can still be sold.
    pub fn net_stock_level(&self) -> u32 {
        self.num_in_stock.saturating_sub(self.num_allocated)
    }

    pub fn is_low_stock(&self) -> bool {
        self.low_stock_threshold
            .is_some_and(|threshold| self.net_stock_level() <= threshold)
    }

    pub fn date_updated(&self) -> DateTime<Utc> {
        self.date_updated
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    /// Reserve stock for a placed order.
    pub fn allocate(&mut self, quantity: u32) -> StockResult<()> {
        let available = self.net_stock_level();
        if quantity > available {
            return Err(StockError::Insufficient {
                requested: quantity,
                available,
            });
        }
        self.num_allocated += quantity;
        self.date_updated = Utc::now();
        Ok(())
    }

    /// Release a reservation (e.g. the order was cancelled).
    pub fn cancel_allocation(&mut self, quantity: u32) {
        self.num_allocated = self.num_allocated.saturating_sub(quantity);
        self.date_updated = Utc::now();
    }

    /// Ship allocated units: both stock and allocation go down.
    pub fn consume_allocation(&mut self, quantity: u32) -> StockResult<()> {
        if quantity > self.num_allocated {
            return Err(StockError::Insufficient {
                requested: quantity,
                available: self.num_allocated,
            });
        }
        self.num_allocated -= quantity;
        self.num_in_stock = self.num_in_stock.saturating_sub(quantity);
        self.date_updated = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StockRecord {
        StockRecord::new(ProductId::new(), PartnerId::new(), " SKU-1 ", Money::new(999, "GBP"))
            .with_stock(10)
            .with_low_stock_threshold(3)
    }

    #[test]
    fn allocation_reduces_net_stock() {
        let mut record = record();
        assert_eq!(record.partner_sku(), "SKU-1");
        record.allocate(6).unwrap();
        assert_eq!(record.net_stock_level(), 4);
        assert!(!record.is_low_stock());
        record.allocate(1).unwrap();
        assert!(record.is_low_stock());
    }

    #[test]
    fn over_allocation_is_rejected() {
        let mut record = record();
        let err = record.allocate(11).unwrap_err();
        assert_eq!(
            err,
            StockError::Insufficient {
                requested: 11,
                available: 10
            }
        );
        assert_eq!(record.num_allocated(), 0);
    }

    #[test]
    fn consuming_and_cancelling_allocations() {
        let mut record = record();
        record.allocate(5).unwrap();
        record.consume_allocation(2).unwrap();
        assert_eq!(record.num_in_stock, 8);
        assert_eq!(record.num_allocated(), 3);
        record.cancel_allocation(3);
        assert_eq!(record.net_stock_level(), 8);
        assert!(record.consume_allocation(1).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn allocations_never_exceed_stock(
                stock in 0u32..50,
                requests in proptest::collection::vec(0u32..20, 0..10),
            ) {
                let mut record = StockRecord::new(ProductId::new(), PartnerId::new(), "SKU", Money::new(1, "GBP"))
                    .with_stock(stock);
                let mut granted = 0;
                for quantity in requests {
                    if record.allocate(quantity).is_ok() {
                        granted += quantity;
                    }
                }
                prop_assert!(record.num_allocated() <= stock);
                prop_assert_eq!(record.num_allocated(), granted);
                prop_assert_eq!(record.net_stock_level(), stock - granted);
            }
        }
    }
}

//! In-memory store of partners and their stock records.

use std::collections::HashMap;

use storefront_core::{PartnerId, ProductId, StockRecordId, UserId};

use crate::error::{StockError, StockResult};
use crate::partner::Partner;
use crate::stock_record::StockRecord;

#[derive(Debug, Clone, Default)]
pub struct StockBook {
    partners: HashMap<PartnerId, Partner>,
    records: HashMap<StockRecordId, StockRecord>,
}

impl StockBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_partner(&mut self, partner: Partner) -> PartnerId {
        let id = partner.id_typed();
        self.partners.insert(id, partner);
        id
    }

    pub fn partner(&self, id: PartnerId) -> Option<&Partner> {
        self.partners.get(&id)
    }

    pub fn partner_mut(&mut self, id: PartnerId) -> Option<&mut Partner> {
        self.partners.get_mut(&id)
    }

    pub fn partners(&self) -> impl Iterator<Item = &Partner> {
        self.partners.values()
    }

    /// Partners `user` belongs to.
    pub fn partners_for_user(&self, user: UserId) -> Vec<&Partner> {
        self.partners.values().filter(|p| p.has_user(user)).collect()
    }

    pub fn record(&self, id: StockRecordId) -> Option<&StockRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &StockRecord> {
        self.records.values()
    }

    /// A product's stock records, oldest first.
    pub fn records_for(&self, product: ProductId) -> Vec<&StockRecord> {
        let mut records: Vec<&StockRecord> = self
            .records
            .values()
            .filter(|r| r.product_id() == product)
            .collect();
        records.sort_by_key(|r| r.id_typed());
        records
    }

    pub fn has_records(&self, product: ProductId) -> bool {
        self.records.values().any(|r| r.product_id() == product)
    }

    pub fn record_by_sku(&self, partner: PartnerId, sku: &str) -> Option<&StockRecord> {
        self.records
            .values()
            .find(|r| r.partner_id() == partner && r.partner_sku() == sku)
    }

    /// Records with `sku` across every partner.
    pub fn records_with_sku<'a>(&'a self, sku: &'a str) -> impl Iterator<Item = &'a StockRecord> + 'a {
        self.records.values().filter(move |r| r.partner_sku() == sku)
    }

    /// Whether `(partner, sku)` is used by a record other than `except`.
    pub fn sku_taken(&self, partner: PartnerId, sku: &str, except: Option<StockRecordId>) -> bool {
        self.record_by_sku(partner, sku)
            .is_some_and(|r| Some(r.id_typed()) != except)
    }

    pub fn add_record(&mut self, record: StockRecord) -> StockResult<StockRecordId> {
        self.check_record(&record)?;
        let id = record.id_typed();
        tracing::info!(
            stockrecord_id = %id,
            product_id = %record.product_id(),
            partner_sku = record.partner_sku(),
            "stock record added"
        );
        self.records.insert(id, record);
        Ok(id)
    }

    /// Insert or replace a record by id.
    pub fn save_record(&mut self, record: StockRecord) -> StockResult<StockRecordId> {
        self.check_record(&record)?;
        let id = record.id_typed();
        self.records.insert(id, record);
        Ok(id)
    }

    fn check_record(&self, record: &StockRecord) -> StockResult<()> {
        if !self.partners.contains_key(&record.partner_id()) {
            return Err(StockError::PartnerNotFound(record.partner_id()));
        }
        if self.sku_taken(record.partner_id(), record.partner_sku(), Some(record.id_typed())) {
            return Err(StockError::DuplicateSku {
                partner: record.partner_id(),
                sku: record.partner_sku().to_string(),
            });
        }
        Ok(())
    }

    pub fn remove_record(&mut self, id: StockRecordId) -> StockResult<StockRecord> {
        self.records.remove(&id).ok_or(StockError::RecordNotFound(id))
    }

    /// Drop every record belonging to `products`; returns how many went.
    pub fn remove_for_products(&mut self, products: &[ProductId]) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| !products.contains(&r.product_id()));
        before - self.records.len()
    }

    pub fn allocate(&mut self, id: StockRecordId, quantity: u32) -> StockResult<()> {
        let record = self.records.get_mut(&id).ok_or(StockError::RecordNotFound(id))?;
        record.allocate(quantity)?;
        tracing::debug!(stockrecord_id = %id, quantity, "stock allocated");
        Ok(())
    }

    pub fn low_stock(&self) -> Vec<&StockRecord> {
        self.records.values().filter(|r| r.is_low_stock()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Money;

    fn book() -> (StockBook, PartnerId) {
        let mut book = StockBook::new();
        let partner = book.add_partner(Partner::new("Acme"));
        (book, partner)
    }

    #[test]
    fn skus_are_unique_per_partner() {
        let (mut book, acme) = book();
        let other = book.add_partner(Partner::new("Other"));
        let product = ProductId::new();
        book.add_record(StockRecord::new(product, acme, "SKU", Money::new(100, "GBP")))
            .unwrap();

        let err = book
            .add_record(StockRecord::new(ProductId::new(), acme, "SKU", Money::new(100, "GBP")))
            .unwrap_err();
        assert!(matches!(err, StockError::DuplicateSku { .. }));

        book.add_record(StockRecord::new(ProductId::new(), other, "SKU", Money::new(100, "GBP")))
            .unwrap();
        assert_eq!(book.records_with_sku("SKU").count(), 2);
    }

    #[test]
    fn records_need_a_known_partner() {
        let (mut book, _) = book();
        let stranger = PartnerId::new();
        let err = book
            .add_record(StockRecord::new(ProductId::new(), stranger, "SKU", Money::new(1, "GBP")))
            .unwrap_err();
        assert_eq!(err, StockError::PartnerNotFound(stranger));
    }

    #[test]
    fn a_product_can_have_records_from_several_partners() {
        let (mut book, acme) = book();
        let other = book.add_partner(Partner::new("Other"));
        let product = ProductId::new();
        book.add_record(StockRecord::new(product, acme, "A", Money::new(100, "GBP")))
            .unwrap();
        book.add_record(StockRecord::new(product, other, "B", Money::new(90, "GBP")))
            .unwrap();
        assert_eq!(book.records_for(product).len(), 2);

        assert_eq!(book.remove_for_products(&[product]), 2);
        assert!(!book.has_records(product));
    }

    #[test]
    fn allocation_goes_through_the_book() {
        let (mut book, acme) = book();
        let id = book
            .add_record(
                StockRecord::new(ProductId::new(), acme, "A", Money::new(100, "GBP"))
                    .with_stock(2)
                    .with_low_stock_threshold(0),
            )
            .unwrap();
        book.allocate(id, 2).unwrap();
        assert!(book.allocate(id, 1).is_err());
        assert_eq!(book.low_stock().len(), 1);
    }

    #[test]
    fn partners_are_found_by_user() {
        let (mut book, acme) = book();
        let user = UserId::new();
        book.partner_mut(acme).unwrap().add_user(user);
        let partners = book.partners_for_user(user);
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].id_typed(), acme);
        assert!(book.partners_for_user(UserId::new()).is_empty());
    }
}

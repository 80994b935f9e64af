//! Pricing and availability policies.
//!
//! A `Strategy` picks the stock record a product is bought from and derives
//! its price and availability from it.

use serde::{Deserialize, Serialize};

use storefront_catalogue::{Catalogue, Product};
use storefront_core::{Money, StockRecordId};

use crate::stock_book::StockBook;
use crate::stock_record::StockRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Availability {
    /// Stock is not tracked; any quantity can be bought.
    Available,
    /// Stock is tracked; `num_available` units can be bought.
    InStock { num_available: u32 },
    Unavailable,
}

impl Availability {
    pub fn is_available_to_buy(&self) -> bool {
        match self {
            Availability::Available => true,
            Availability::InStock { num_available } => *num_available > 0,
            Availability::Unavailable => false,
        }
    }

    /// Whether `quantity` units may be bought, with the reason when not.
    pub fn is_purchase_permitted(&self, quantity: u32) -> Result<(), String> {
        match self {
            Availability::Available => Ok(()),
            Availability::Unavailable => Err("unavailable".to_string()),
            Availability::InStock { num_available: 0 } => Err("no stock available".to_string()),
            Availability::InStock { num_available } if quantity > *num_available => {
                Err(format!("a maximum of {num_available} can be bought"))
            }
            Availability::InStock { .. } => Ok(()),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Availability::Available => "Available".to_string(),
            Availability::InStock { num_available } if *num_available > 0 => {
                format!("In stock ({num_available} available)")
            }
            Availability::InStock { .. } | Availability::Unavailable => "Unavailable".to_string(),
        }
    }
}

/// What a customer would pay for a product, and whether they can.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseInfo {
    pub price: Option<Money>,
    pub availability: Availability,
    pub stockrecord: Option<StockRecordId>,
}

impl PurchaseInfo {
    pub fn unavailable() -> Self {
        Self {
            price: None,
            availability: Availability::Unavailable,
            stockrecord: None,
        }
    }
}

pub trait Strategy {
    /// Choose the record a product is sold from.
    fn select_stockrecord<'a>(&self, stock: &'a StockBook, product: &Product) -> Option<&'a StockRecord>;

    /// Purchase info for a child or standalone product. Parents are
    /// delegated to `fetch_for_parent`.
    fn fetch_for_product(&self, catalogue: &Catalogue, stock: &StockBook, product: &Product) -> PurchaseInfo {
        if product.is_parent() {
            return self.fetch_for_parent(catalogue, stock, product);
        }
        let Some(record) = self.select_stockrecord(stock, product) else {
            return PurchaseInfo::unavailable();
        };
        let availability = if catalogue.tracks_stock(product) {
            Availability::InStock {
                num_available: record.net_stock_level(),
            }
        } else {
            Availability::Available
        };
        PurchaseInfo {
            price: Some(record.price()),
            availability,
            stockrecord: Some(record.id_typed()),
        }
    }

    /// Purchase info for a parent: the cheapest child that can be bought,
    /// or the cheapest child at all when none can.
    fn fetch_for_parent(&self, catalogue: &Catalogue, stock: &StockBook, parent: &Product) -> PurchaseInfo {
        let infos: Vec<PurchaseInfo> = catalogue
            .children(parent.id_typed())
            .into_iter()
            .map(|child| self.fetch_for_product(catalogue, stock, child))
            .filter(|info| info.price.is_some())
            .collect();

        let cheapest = |available: bool| {
            infos
                .iter()
                .filter(|info| info.availability.is_available_to_buy() == available)
                .min_by_key(|info| info.price.as_ref().map(|p| p.amount))
                .cloned()
        };
        match cheapest(true).or_else(|| cheapest(false)) {
            Some(info) => PurchaseInfo {
                stockrecord: None,
                ..info
            },
            None => PurchaseInfo::unavailable(),
        }
    }
}

/// Sell from the product's first (oldest) stock record.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseFirstStockRecord;

impl Strategy for UseFirstStockRecord {
    fn select_stockrecord<'a>(&self, stock: &'a StockBook, product: &Product) -> Option<&'a StockRecord> {
        stock.records_for(product.id_typed()).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partner::Partner;
    use storefront_catalogue::ProductClass;

    struct Fixture {
        catalogue: Catalogue,
        stock: StockBook,
        partner: storefront_core::PartnerId,
    }

    fn fixture(track_stock: bool) -> (Fixture, storefront_core::ProductClassId) {
        let mut catalogue = Catalogue::new();
        let mut class = ProductClass::new("Books");
        class.track_stock = track_stock;
        let class = catalogue.add_class(class).unwrap();
        let mut stock = StockBook::new();
        let partner = stock.add_partner(Partner::new("Acme"));
        (
            Fixture {
                catalogue,
                stock,
                partner,
            },
            class,
        )
    }

    #[test]
    fn products_without_records_are_unavailable() {
        let (mut f, class) = fixture(true);
        let id = f.catalogue.insert_product(Product::standalone("Dune", class)).unwrap();
        let info = UseFirstStockRecord.fetch_for_product(&f.catalogue, &f.stock, f.catalogue.product(id).unwrap());
        assert_eq!(info, PurchaseInfo::unavailable());
    }

    #[test]
    fn tracked_products_depend_on_net_stock() {
        let (mut f, class) = fixture(true);
        let id = f.catalogue.insert_product(Product::standalone("Dune", class)).unwrap();
        f.stock
            .add_record(StockRecord::new(id, f.partner, "D1", Money::new(500, "GBP")).with_stock(3))
            .unwrap();

        let info = UseFirstStockRecord.fetch_for_product(&f.catalogue, &f.stock, f.catalogue.product(id).unwrap());
        assert_eq!(info.price, Some(Money::new(500, "GBP")));
        assert_eq!(info.availability, Availability::InStock { num_available: 3 });
        assert_eq!(info.availability.message(), "In stock (3 available)");
        assert!(info.availability.is_purchase_permitted(3).is_ok());
        assert_eq!(
            info.availability.is_purchase_permitted(4).unwrap_err(),
            "a maximum of 3 can be bought"
        );
    }

    #[test]
    fn untracked_products_are_always_available() {
        let (mut f, class) = fixture(false);
        let id = f.catalogue.insert_product(Product::standalone("Ebook", class)).unwrap();
        f.stock
            .add_record(StockRecord::new(id, f.partner, "E1", Money::new(300, "GBP")))
            .unwrap();
        let info = UseFirstStockRecord.fetch_for_product(&f.catalogue, &f.stock, f.catalogue.product(id).unwrap());
        assert_eq!(info.availability, Availability::Available);
        assert!(info.availability.is_purchase_permitted(1000).is_ok());
    }

    #[test]
    fn parents_use_their_cheapest_available_child() {
        let (mut f, class) = fixture(true);
        let parent = f.catalogue.insert_product(Product::parent("Tee", class)).unwrap();
        let small = f.catalogue.insert_product(Product::child(parent, "S")).unwrap();
        let large = f.catalogue.insert_product(Product::child(parent, "L")).unwrap();
        f.stock
            .add_record(StockRecord::new(small, f.partner, "S", Money::new(800, "GBP")))
            .unwrap();
        f.stock
            .add_record(StockRecord::new(large, f.partner, "L", Money::new(1200, "GBP")).with_stock(1))
            .unwrap();

        let info = UseFirstStockRecord.fetch_for_product(&f.catalogue, &f.stock, f.catalogue.product(parent).unwrap());
        assert_eq!(info.price, Some(Money::new(1200, "GBP")));
        assert!(info.availability.is_available_to_buy());
        assert_eq!(info.stockrecord, None);
    }
}

#![allow(dead_code)]

use storefront_catalogue::{AttributeType, Product, ProductAttribute, ProductClass};
use storefront_core::{CategoryId, Money, PartnerId, ProductClassId, ProductId, UserId};
use storefront_dashboard::{DashboardUser, Store};
use storefront_partner::{Partner, StockRecord};

pub struct World {
    pub store: Store,
    pub class: ProductClassId,
    pub category: CategoryId,
    pub partner: PartnerId,
    pub partner_user: DashboardUser,
}

impl World {
    pub fn new() -> Self {
        storefront_observability::init();

        let mut store = Store::default();
        let class = store
            .catalogue
            .add_class(ProductClass::new("Book"))
            .expect("class");
        let category = store
            .catalogue
            .categories_mut()
            .add_root("Books")
            .expect("category");
        let partner_user = DashboardUser::partner_user(UserId::new());
        let partner = store
            .stock
            .add_partner(Partner::new("Acme").with_user(partner_user.id));
        Self {
            store,
            class,
            category,
            partner,
            partner_user,
        }
    }

    pub fn class_slug(&self) -> String {
        self.store.catalogue.class(self.class).expect("class").slug.clone()
    }

    /// Add a required integer `weight` attribute to the class.
    pub fn require_weight(&mut self) {
        self.store
            .catalogue
            .add_attribute(
                self.class,
                ProductAttribute::new("Weight", "weight", AttributeType::Integer).required(),
            )
            .expect("attribute");
    }

    pub fn standalone(&mut self, title: &str) -> ProductId {
        self.store
            .catalogue
            .insert_product(Product::standalone(title, self.class).with_categories([self.category]))
            .expect("product")
    }

    pub fn parent(&mut self, title: &str) -> ProductId {
        self.store
            .catalogue
            .insert_product(Product::parent(title, self.class).with_categories([self.category]))
            .expect("parent")
    }

    pub fn child(&mut self, parent: ProductId, title: &str) -> ProductId {
        self.store
            .catalogue
            .insert_product(Product::child(parent, title))
            .expect("child")
    }

    pub fn stock(&mut self, product: ProductId, partner: PartnerId, sku: &str) {
        self.store
            .stock
            .add_record(StockRecord::new(product, partner, sku, Money::new(999, "GBP")).with_stock(5))
            .expect("stock record");
    }
}

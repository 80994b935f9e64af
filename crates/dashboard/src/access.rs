//! Who may see and edit what in the dashboard.
//!
//! Staff users see the whole catalogue. Other dashboard users act on behalf
//! of the partners they belong to: they see a product only when the product,
//! or one of its variants, has a stock record from one of those partners.

use serde::{Deserialize, Serialize};

use storefront_catalogue::{Catalogue, Product};
use storefront_core::{PartnerId, UserId};
use storefront_partner::{Partner, StockBook};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardUser {
    pub id: UserId,
    pub is_staff: bool,
}

impl DashboardUser {
    pub fn staff() -> Self {
        Self {
            id: UserId::new(),
            is_staff: true,
        }
    }

    pub fn partner_user(id: UserId) -> Self {
        Self { id, is_staff: false }
    }
}

/// Whether `user` may manage stock records of `partner`.
pub fn can_use_partner(user: &DashboardUser, partner: &Partner) -> bool {
    user.is_staff || partner.has_user(user.id)
}

/// Partners `user` may assign stock records to.
pub fn partners_for<'a>(stock: &'a StockBook, user: &DashboardUser) -> Vec<&'a Partner> {
    let mut partners: Vec<&Partner> = stock.partners().filter(|p| can_use_partner(user, p)).collect();
    partners.sort_by(|a, b| a.name.cmp(&b.name));
    partners
}

fn manages(stock: &StockBook, user: &DashboardUser, product: &Product) -> bool {
    stock.records_for(product.id_typed()).iter().any(|record| {
        stock
            .partner(record.partner_id())
            .is_some_and(|partner| partner.has_user(user.id))
    })
}

pub fn can_access_product(
    catalogue: &Catalogue,
    stock: &StockBook,
    user: &DashboardUser,
    product: &Product,
) -> bool {
    if user.is_staff {
        return true;
    }
    manages(stock, user, product)
        || catalogue
            .children(product.id_typed())
            .into_iter()
            .any(|child| manages(stock, user, child))
}

/// The products `user` may see, ordered by display title.
pub fn filter_products<'a>(
    catalogue: &'a Catalogue,
    stock: &StockBook,
    user: &DashboardUser,
) -> Vec<&'a Product> {
    let mut products: Vec<&Product> = catalogue
        .products()
        .filter(|p| can_access_product(catalogue, stock, user, p))
        .collect();
    products.sort_by_cached_key(|p| (catalogue.display_title(p), p.id_typed()));
    products
}

/// Ids of partners whose records `user` may edit; `None` means any partner.
pub fn partner_scope(stock: &StockBook, user: &DashboardUser) -> Option<Vec<PartnerId>> {
    if user.is_staff {
        return None;
    }
    Some(stock.partners_for_user(user.id).into_iter().map(Partner::id_typed).collect())
}

//! Dependent forms submitted together with a product form.
//!
//! Each formset validates its rows into field errors prefixed the way the
//! rows are named on the page (`stockrecords-0-partner_sku`), and yields the
//! cleaned values for the editor to store once everything is valid.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storefront_catalogue::{Catalogue, ProductImage, ProductStructure};
use storefront_core::{CategoryId, FieldErrors, Money, PartnerId, ProductId, StockRecordId};
use storefront_partner::{StockBook, StockRecord, StockResult};

use crate::access::{DashboardUser, can_use_partner};

pub const CATEGORY_PREFIX: &str = "productcategory_set";
pub const IMAGE_PREFIX: &str = "images";
pub const STOCKRECORD_PREFIX: &str = "stockrecords";

pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const NEEDS_CATEGORY: &str = "Your product must have at least one category.";
pub const CHILD_CATEGORY: &str = "A child product should not have categories.";
pub const PARENT_STOCKRECORD: &str = "A parent product can't have stockrecords.";
pub const NEEDS_OWN_PARTNER: &str =
    "At least one stock record must be set to a partner that you're associated with.";
pub const DUPLICATE_SKU: &str = "Stock record with this Partner and Partner sku already exists.";
pub const DUPLICATE_DISPLAY_ORDER: &str = "Display order must be unique.";

fn row_prefix(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index}")
}

// -- categories -------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryFormData {
    pub category: Option<CategoryId>,
    pub delete: bool,
}

impl CategoryFormData {
    pub fn new(category: CategoryId) -> Self {
        Self {
            category: Some(category),
            delete: false,
        }
    }
}

/// The categories to file the product under, in submission order.
pub fn clean_categories(
    catalogue: &Catalogue,
    structure: ProductStructure,
    rows: &[CategoryFormData],
    errors: &mut FieldErrors,
) -> Vec<CategoryId> {
    let mut categories = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if row.delete {
            continue;
        }
        let Some(category) = row.category else {
            continue;
        };
        if !catalogue.categories().contains(category) {
            let mut row_errors = FieldErrors::new();
            row_errors.add("category", INVALID_CHOICE);
            errors.merge_prefixed(&row_prefix(CATEGORY_PREFIX, index), row_errors);
            continue;
        }
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    match structure {
        ProductStructure::Child if !categories.is_empty() => errors.add_non_field(CHILD_CATEGORY),
        ProductStructure::Standalone | ProductStructure::Parent if categories.is_empty() => {
            errors.add_non_field(NEEDS_CATEGORY);
        }
        _ => {}
    }
    categories
}

// -- images -----------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFormData {
    pub original: String,
    pub caption: String,
    pub display_order: u32,
    pub delete: bool,
}

impl ImageFormData {
    pub fn new(original: impl Into<String>, display_order: u32) -> Self {
        Self {
            original: original.into(),
            display_order,
            ..Self::default()
        }
    }
}

/// Rows with neither a path nor a caption are blank extra forms and skipped.
pub fn clean_images(rows: &[ImageFormData], errors: &mut FieldErrors) -> Vec<ProductImage> {
    let mut images = Vec::new();
    let mut orders = BTreeSet::new();
    for (index, row) in rows.iter().enumerate() {
        if row.delete || (row.original.trim().is_empty() && row.caption.trim().is_empty()) {
            continue;
        }
        let mut row_errors = FieldErrors::new();
        if row.original.trim().is_empty() {
            row_errors.add_required("original");
        }
        if !orders.insert(row.display_order) {
            row_errors.add("display_order", DUPLICATE_DISPLAY_ORDER);
        }
        if row_errors.is_empty() {
            images.push(ProductImage {
                original: row.original.trim().to_string(),
                caption: row.caption.trim().to_string(),
                display_order: row.display_order,
            });
        } else {
            errors.merge_prefixed(&row_prefix(IMAGE_PREFIX, index), row_errors);
        }
    }
    images
}

// -- stock records ----------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockRecordFormData {
    /// Set when editing an existing record.
    pub id: Option<StockRecordId>,
    pub partner: Option<PartnerId>,
    pub partner_sku: String,
    /// Minor units.
    pub price_excl_tax: Option<u64>,
    /// Blank means the configured default currency.
    pub price_currency: String,
    pub num_in_stock: Option<u32>,
    pub low_stock_threshold: Option<u32>,
    pub delete: bool,
}

impl StockRecordFormData {
    pub fn new(partner: PartnerId, partner_sku: impl Into<String>, price_excl_tax: u64) -> Self {
        Self {
            partner: Some(partner),
            partner_sku: partner_sku.into(),
            price_excl_tax: Some(price_excl_tax),
            ..Self::default()
        }
    }

    pub fn with_stock(mut self, num_in_stock: u32) -> Self {
        self.num_in_stock = Some(num_in_stock);
        self
    }

    fn is_blank(&self) -> bool {
        self.id.is_none()
            && self.partner.is_none()
            && self.partner_sku.trim().is_empty()
            && self.price_excl_tax.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CleanStockRecord {
    id: Option<StockRecordId>,
    partner: PartnerId,
    partner_sku: String,
    price: Money,
    num_in_stock: u32,
    low_stock_threshold: Option<u32>,
}

/// Validated stock-record rows, applied with [`StockRecordChanges::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockRecordChanges {
    rows: Vec<CleanStockRecord>,
    delete: Vec<StockRecordId>,
}

impl StockRecordChanges {
    /// Whether the product will have any stock records once applied.
    pub fn leaves_records(&self, stock: &StockBook, product: Option<ProductId>) -> bool {
        if !self.rows.is_empty() {
            return true;
        }
        product.is_some_and(|product| {
            stock
                .records_for(product)
                .iter()
                .any(|r| !self.delete.contains(&r.id_typed()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.delete.is_empty()
    }

    /// Write the changes for `product`. Deletions go first so a SKU can move
    /// from a deleted row to a new one.
    pub fn apply(self, product: ProductId, stock: &mut StockBook) -> StockResult<()> {
        for id in &self.delete {
            stock.remove_record(*id)?;
        }
        for row in self.rows {
            let existing = row.id.and_then(|id| stock.record(id)).cloned();
            let mut record = match existing {
                Some(record) if record.partner_id() == row.partner => record,
                Some(record) => {
                    stock.remove_record(record.id_typed())?;
                    StockRecord::new(product, row.partner, row.partner_sku.clone(), row.price.clone())
                }
                None => StockRecord::new(product, row.partner, row.partner_sku.clone(), row.price.clone()),
            };
            record.set_partner_sku(row.partner_sku);
            record.price_excl_tax = row.price.amount;
            record.price_currency = row.price.currency;
            record.num_in_stock = row.num_in_stock;
            record.low_stock_threshold = row.low_stock_threshold;
            stock.save_record(record)?;
        }
        Ok(())
    }
}

/// Context the stock-record formset validates against.
#[derive(Debug, Clone, Copy)]
pub struct StockRecordFormset<'a> {
    pub stock: &'a StockBook,
    pub user: &'a DashboardUser,
    /// The product being edited, if it already exists.
    pub product: Option<ProductId>,
    pub structure: ProductStructure,
    pub default_currency: &'a str,
}

impl StockRecordFormset<'_> {
    pub fn clean(&self, rows: &[StockRecordFormData], errors: &mut FieldErrors) -> StockRecordChanges {
        let mut changes = StockRecordChanges::default();
        let mut seen: BTreeSet<(PartnerId, String)> = BTreeSet::new();
        let mut has_own_partner = false;

        for (index, row) in rows.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            let mut row_errors = FieldErrors::new();

            let mut existing_partner = None;
            if let Some(id) = row.id {
                let Some(record) = self.editable_record(id) else {
                    row_errors.add("id", INVALID_CHOICE);
                    errors.merge_prefixed(&row_prefix(STOCKRECORD_PREFIX, index), row_errors);
                    continue;
                };
                if row.delete {
                    changes.delete.push(id);
                    continue;
                }
                existing_partner = Some(record.partner_id());
            } else if row.delete {
                continue;
            }

            let partner = match row.partner.and_then(|id| self.stock.partner(id)) {
                // Partner users cannot move an existing record to another partner.
                Some(partner)
                    if !self.user.is_staff
                        && existing_partner.is_some_and(|p| p != partner.id_typed()) =>
                {
                    row_errors.add("partner", INVALID_CHOICE);
                    None
                }
                Some(partner) if can_use_partner(self.user, partner) => {
                    has_own_partner |= partner.has_user(self.user.id);
                    Some(partner.id_typed())
                }
                Some(_) => {
                    row_errors.add("partner", INVALID_CHOICE);
                    None
                }
                None if row.partner.is_some() => {
                    row_errors.add("partner", INVALID_CHOICE);
                    None
                }
                None => {
                    row_errors.add_required("partner");
                    None
                }
            };

            let sku = row.partner_sku.trim();
            if sku.is_empty() {
                row_errors.add_required("partner_sku");
            } else if let Some(partner) = partner {
                let taken_elsewhere = self
                    .stock
                    .record_by_sku(partner, sku)
                    .is_some_and(|r| Some(r.id_typed()) != row.id && !changes.delete.contains(&r.id_typed()));
                if taken_elsewhere || !seen.insert((partner, sku.to_string())) {
                    row_errors.add("partner_sku", DUPLICATE_SKU);
                }
            }

            if row.price_excl_tax.is_none() {
                row_errors.add_required("price_excl_tax");
            }

            match (partner, row.price_excl_tax, row_errors.is_empty()) {
                (Some(partner), Some(amount), true) => {
                    let currency = match row.price_currency.trim() {
                        "" => self.default_currency,
                        currency => currency,
                    };
                    changes.rows.push(CleanStockRecord {
                        id: row.id,
                        partner,
                        partner_sku: sku.to_string(),
                        price: Money::new(amount, currency),
                        num_in_stock: row.num_in_stock.unwrap_or(0),
                        low_stock_threshold: row.low_stock_threshold,
                    });
                }
                _ => errors.merge_prefixed(&row_prefix(STOCKRECORD_PREFIX, index), row_errors),
            }
        }

        if self.structure == ProductStructure::Parent && !changes.rows.is_empty() {
            errors.add_non_field(PARENT_STOCKRECORD);
        }
        if !self.user.is_staff && !has_own_partner && !self.keeps_own_record(&changes) {
            errors.add_non_field(NEEDS_OWN_PARTNER);
        }
        changes
    }

    /// An existing record of the product being edited that the user may
    /// change. Partner users only see their own partners' records.
    fn editable_record(&self, id: StockRecordId) -> Option<&StockRecord> {
        let record = self.stock.record(id)?;
        if Some(record.product_id()) != self.product {
            return None;
        }
        if self.user.is_staff {
            return Some(record);
        }
        self.stock
            .partner(record.partner_id())
            .filter(|partner| can_use_partner(self.user, partner))
            .map(|_| record)
    }

    /// A partner user's existing record that this submission leaves alone.
    fn keeps_own_record(&self, changes: &StockRecordChanges) -> bool {
        let Some(product) = self.product else {
            return false;
        };
        self.stock.records_for(product).iter().any(|record| {
            !changes.delete.contains(&record.id_typed())
                && !changes.rows.iter().any(|row| row.id == Some(record.id_typed()))
                && self
                    .stock
                    .partner(record.partner_id())
                    .is_some_and(|p| p.has_user(self.user.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalogue::{Product, ProductClass};
    use storefront_core::UserId;
    use storefront_partner::Partner;

    fn formset<'a>(
        stock: &'a StockBook,
        user: &'a DashboardUser,
        product: Option<ProductId>,
    ) -> StockRecordFormset<'a> {
        StockRecordFormset {
            stock,
            user,
            product,
            structure: ProductStructure::Standalone,
            default_currency: "GBP",
        }
    }

    #[test]
    fn categories_are_required_for_top_level_products() {
        let mut catalogue = Catalogue::new();
        let books = catalogue.categories_mut().add_root("Books").unwrap();

        let mut errors = FieldErrors::new();
        assert!(clean_categories(&catalogue, ProductStructure::Standalone, &[], &mut errors).is_empty());
        assert_eq!(errors.non_field(), [NEEDS_CATEGORY]);

        let mut errors = FieldErrors::new();
        let rows = [CategoryFormData::new(books), CategoryFormData::new(books)];
        let categories = clean_categories(&catalogue, ProductStructure::Parent, &rows, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(categories, vec![books]);
    }

    #[test]
    fn children_take_no_categories() {
        let mut catalogue = Catalogue::new();
        let books = catalogue.categories_mut().add_root("Books").unwrap();
        let mut errors = FieldErrors::new();
        clean_categories(&catalogue, ProductStructure::Child, &[CategoryFormData::new(books)], &mut errors);
        assert_eq!(errors.non_field(), [CHILD_CATEGORY]);

        let mut errors = FieldErrors::new();
        clean_categories(&catalogue, ProductStructure::Child, &[], &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_categories_are_invalid_choices() {
        let catalogue = Catalogue::new();
        let mut errors = FieldErrors::new();
        let rows = [CategoryFormData::new(CategoryId::new())];
        clean_categories(&catalogue, ProductStructure::Standalone, &rows, &mut errors);
        assert_eq!(errors.field("productcategory_set-0-category"), [INVALID_CHOICE]);
    }

    #[test]
    fn images_need_a_path_and_distinct_orders() {
        let mut errors = FieldErrors::new();
        let rows = [
            ImageFormData::new("a.jpg", 0),
            ImageFormData::new("b.jpg", 0),
            ImageFormData {
                caption: "no file".into(),
                display_order: 2,
                ..ImageFormData::default()
            },
            ImageFormData::default(),
        ];
        let images = clean_images(&rows, &mut errors);
        assert_eq!(images.len(), 1);
        assert_eq!(errors.field("images-1-display_order"), [DUPLICATE_DISPLAY_ORDER]);
        assert!(errors.has_field("images-2-original"));
        assert!(!errors.has_field("images-3-original"));
    }

    #[test]
    fn stock_rows_require_partner_sku_and_price() {
        let stock = StockBook::new();
        let staff = DashboardUser::staff();
        let mut errors = FieldErrors::new();
        let rows = [StockRecordFormData {
            partner_sku: " ".into(),
            price_excl_tax: Some(100),
            ..StockRecordFormData::default()
        }];
        let changes = formset(&stock, &staff, None).clean(&rows, &mut errors);
        assert!(changes.is_empty());
        assert!(errors.has_field("stockrecords-0-partner"));
        assert!(errors.has_field("stockrecords-0-partner_sku"));
    }

    #[test]
    fn skus_are_unique_per_partner() {
        let mut catalogue = Catalogue::new();
        let class = catalogue.add_class(ProductClass::new("Books")).unwrap();
        let other = catalogue.insert_product(Product::standalone("Other", class)).unwrap();
        let mut stock = StockBook::new();
        let partner = stock.add_partner(Partner::new("Acme"));
        let second = stock.add_partner(Partner::new("Beta"));
        stock
            .add_record(StockRecord::new(other, partner, "SKU-1", Money::new(100, "GBP")))
            .unwrap();
        let staff = DashboardUser::staff();

        let mut errors = FieldErrors::new();
        let rows = [
            StockRecordFormData::new(partner, "SKU-1", 100),
            StockRecordFormData::new(second, "SKU-1", 100),
            StockRecordFormData::new(second, "SKU-1", 100),
        ];
        formset(&stock, &staff, None).clean(&rows, &mut errors);
        assert_eq!(errors.field("stockrecords-0-partner_sku"), [DUPLICATE_SKU]);
        assert!(!errors.has_field("stockrecords-1-partner_sku"));
        assert_eq!(errors.field("stockrecords-2-partner_sku"), [DUPLICATE_SKU]);
    }

    #[test]
    fn partner_users_must_stock_through_their_own_partner() {
        let mut stock = StockBook::new();
        let user = DashboardUser::partner_user(UserId::new());
        let own = stock.add_partner(Partner::new("Ours").with_user(user.id));
        let foreign = stock.add_partner(Partner::new("Theirs"));

        let mut errors = FieldErrors::new();
        formset(&stock, &user, None).clean(&[StockRecordFormData::new(foreign, "X", 1)], &mut errors);
        assert_eq!(errors.field("stockrecords-0-partner"), [INVALID_CHOICE]);
        assert!(errors.non_field().contains(&NEEDS_OWN_PARTNER.to_string()));

        let mut errors = FieldErrors::new();
        let changes = formset(&stock, &user, None).clean(&[StockRecordFormData::new(own, "X", 1)], &mut errors);
        assert!(errors.is_empty());
        assert!(changes.leaves_records(&stock, None));
    }

    #[test]
    fn parents_refuse_stock_records() {
        let mut stock = StockBook::new();
        let partner = stock.add_partner(Partner::new("Acme"));
        let staff = DashboardUser::staff();
        let mut errors = FieldErrors::new();
        StockRecordFormset {
            structure: ProductStructure::Parent,
            ..formset(&stock, &staff, None)
        }
        .clean(&[StockRecordFormData::new(partner, "P-1", 500)], &mut errors);
        assert_eq!(errors.non_field(), [PARENT_STOCKRECORD]);
    }

    #[test]
    fn applying_changes_updates_deletes_and_creates() {
        let mut catalogue = Catalogue::new();
        let class = catalogue.add_class(ProductClass::new("Books")).unwrap();
        let product = catalogue.insert_product(Product::standalone("Book", class)).unwrap();
        let mut stock = StockBook::new();
        let partner = stock.add_partner(Partner::new("Acme"));
        let kept = stock
            .add_record(StockRecord::new(product, partner, "KEEP", Money::new(100, "GBP")))
            .unwrap();
        let dropped = stock
            .add_record(StockRecord::new(product, partner, "DROP", Money::new(100, "GBP")))
            .unwrap();
        let staff = DashboardUser::staff();

        let rows = [
            StockRecordFormData {
                id: Some(kept),
                ..StockRecordFormData::new(partner, "KEEP", 250).with_stock(7)
            },
            StockRecordFormData {
                id: Some(dropped),
                delete: true,
                ..StockRecordFormData::default()
            },
            StockRecordFormData::new(partner, "DROP", 300),
        ];
        let mut errors = FieldErrors::new();
        let changes = formset(&stock, &staff, Some(product)).clean(&rows, &mut errors);
        assert!(errors.is_empty(), "{errors}");
        changes.apply(product, &mut stock).unwrap();

        let records = stock.records_for(product);
        assert_eq!(records.len(), 2);
        let kept = stock.record(kept).unwrap();
        assert_eq!(kept.price(), Money::new(250, "GBP"));
        assert_eq!(kept.num_in_stock, 7);
        assert!(stock.record(dropped).is_none());
        assert!(stock.record_by_sku(partner, "DROP").is_some());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn each_display_order_is_accepted_once(orders in proptest::collection::vec(0u32..6, 0..12)) {
                let rows: Vec<ImageFormData> = orders
                    .iter()
                    .enumerate()
                    .map(|(i, order)| ImageFormData::new(format!("{i}.jpg"), *order))
                    .collect();
                let mut errors = FieldErrors::new();
                let images = clean_images(&rows, &mut errors);

                let distinct: BTreeSet<u32> = orders.iter().copied().collect();
                prop_assert_eq!(images.len(), distinct.len());
                prop_assert_eq!(errors.fields().count(), orders.len() - distinct.len());
            }
        }
    }
}

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalogue::{Catalogue, Product};
use storefront_core::{CategoryId, ProductClassId, ProductId, RangeId};

/// A named selection of products, used to scope offers.
///
/// Membership is rule based (whole catalogue, product classes, categories)
/// plus explicit include and exclude lists; see `contains_product`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    id: RangeId,
    pub name: String,
    slug: String,
    pub description: String,
    pub is_public: bool,
    pub includes_all_products: bool,
    included_products: Vec<ProductId>,
    excluded_products: BTreeSet<ProductId>,
    classes: BTreeSet<ProductClassId>,
    included_categories: BTreeSet<CategoryId>,
    date_created: DateTime<Utc>,
}

impl Range {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RangeId::new(),
            name: name.into(),
            slug: String::new(),
            description: String::new(),
            is_public: false,
            includes_all_products: false,
            included_products: Vec::new(),
            excluded_products: BTreeSet::new(),
            classes: BTreeSet::new(),
            included_categories: BTreeSet::new(),
            date_created: Utc::now(),
        }
    }

    /// A range covering the whole catalogue.
    pub fn all_products(name: impl Into<String>) -> Self {
        let mut range = Self::new(name);
        range.includes_all_products = true;
        range
    }

    pub fn id_typed(&self) -> RangeId {
        self.id
    }

    /// Assigned once by `RangeBook::create`; renaming keeps it.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub(crate) fn set_slug(&mut self, slug: String) {
        self.slug = slug;
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    /// Explicitly included products, in the order they were added.
    pub fn included_products(&self) -> &[ProductId] {
        &self.included_products
    }

    pub fn excluded_products(&self) -> &BTreeSet<ProductId> {
        &self.excluded_products
    }

    pub fn classes(&self) -> &BTreeSet<ProductClassId> {
        &self.classes
    }

    pub fn included_categories(&self) -> &BTreeSet<CategoryId> {
        &self.included_categories
    }

    /// Include a product. Including a parent includes all its children;
    /// including a child includes that child only. A previously excluded
    /// product is un-excluded.
    pub fn add_product(&mut self, product: ProductId) {
        self.excluded_products.remove(&product);
        if !self.included_products.contains(&product) {
            self.included_products.push(product);
        }
    }

    /// Remove a product from the include list and exclude it, so that class
    /// or category rules no longer pull it in either.
    pub fn remove_product(&mut self, product: ProductId) {
        self.included_products.retain(|p| *p != product);
        self.excluded_products.insert(product);
    }

    pub fn exclude_product(&mut self, product: ProductId) {
        self.excluded_products.insert(product);
    }

    pub fn add_class(&mut self, class: ProductClassId) {
        self.classes.insert(class);
    }

    pub fn remove_class(&mut self, class: ProductClassId) {
        self.classes.remove(&class);
    }

    pub fn add_category(&mut self, category: CategoryId) {
        self.included_categories.insert(category);
    }

    pub fn remove_category(&mut self, category: CategoryId) {
        self.included_categories.remove(&category);
    }

    /// Drop every reference to `products` (they were deleted).
    pub fn forget_products(&mut self, products: &[ProductId]) {
        self.included_products.retain(|p| !products.contains(p));
        self.excluded_products.retain(|p| !products.contains(p));
    }

    /// Whether `product` is in this range.
    ///
    /// Rules, first match wins:
    /// 1. the product (or a child's parent) is excluded: not contained;
    /// 2. the range includes all products;
    /// 3. the product's class (a child's parent's class) is included;
    /// 4. the product (or a child's parent) is explicitly included;
    /// 5. one of its categories lies in an included category's subtree.
    pub fn contains_product(&self, catalogue: &Catalogue, product: &Product) -> bool {
        let id = product.id_typed();
        let parent = product.parent_id();

        if self.excluded_products.contains(&id)
            || parent.is_some_and(|p| self.excluded_products.contains(&p))
        {
            return false;
        }
        if self.includes_all_products {
            return true;
        }
        if catalogue
            .effective_class(product)
            .is_some_and(|class| self.classes.contains(&class.id_typed()))
        {
            return true;
        }
        if self.included_products.contains(&id)
            || parent.is_some_and(|p| self.included_products.contains(&p))
        {
            return true;
        }
        self.in_included_category(catalogue, product)
    }

    fn in_included_category(&self, catalogue: &Catalogue, product: &Product) -> bool {
        if self.included_categories.is_empty() {
            return false;
        }
        let tree = catalogue.categories();
        catalogue.effective_categories(product).iter().any(|category| {
            self.included_categories
                .iter()
                .any(|included| tree.is_in_subtree(*included, *category))
        })
    }

    /// Every catalogue product in the range.
    pub fn products<'a>(&self, catalogue: &'a Catalogue) -> Vec<&'a Product> {
        catalogue
            .products()
            .filter(|p| self.contains_product(catalogue, p))
            .collect()
    }

    /// Whether membership is purely the explicit include list, so its order
    /// is meaningful.
    pub fn is_reorderable(&self) -> bool {
        !self.includes_all_products && self.classes.is_empty() && self.included_categories.is_empty()
    }
}

//! In-memory catalogue repository.
//!
//! Holds product classes, products and the category tree, and enforces the
//! storage-level rules: UPC uniqueness, valid references, and cascading
//! deletes from parents to their children.

use std::collections::HashMap;

use storefront_core::{
    CategoryId, DomainError, DomainResult, ProductClassId, ProductId, slugify, unique_slug,
};

use crate::attribute::ProductAttribute;
use crate::category::CategoryTree;
use crate::product::{CleanContext, Product};
use crate::product_class::ProductClass;

pub const DUPLICATE_UPC: &str = "Product with this UPC already exists.";

#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    classes: HashMap<ProductClassId, ProductClass>,
    products: HashMap<ProductId, Product>,
    categories: CategoryTree,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    // -- product classes ---------------------------------------------------

    /// Register a product class. A blank slug is derived from the name and
    /// made unique among existing classes.
    pub fn add_class(&mut self, mut class: ProductClass) -> DomainResult<ProductClassId> {
        if class.name.trim().is_empty() {
            return Err(DomainError::validation("A product class must have a name."));
        }
        let base = if class.slug.trim().is_empty() {
            slugify(&class.name)
        } else {
            class.slug.trim().to_string()
        };
        class.slug = unique_slug(&base, |s| self.classes.values().any(|c| c.slug == s));

        let id = class.id_typed();
        tracing::info!(class_id = %id, slug = %class.slug, "product class added");
        self.classes.insert(id, class);
        Ok(id)
    }

    pub fn class(&self, id: ProductClassId) -> Option<&ProductClass> {
        self.classes.get(&id)
    }

    pub fn class_by_slug(&self, slug: &str) -> Option<&ProductClass> {
        self.classes.values().find(|c| c.slug == slug)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ProductClass> {
        self.classes.values()
    }

    pub fn add_attribute(&mut self, class: ProductClassId, attribute: ProductAttribute) -> DomainResult<()> {
        self.classes
            .get_mut(&class)
            .ok_or_else(DomainError::not_found)?
            .add_attribute(attribute)
    }

    // -- products ----------------------------------------------------------

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn contains_product(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Children of `parent`, oldest first.
    pub fn children(&self, parent: ProductId) -> Vec<&Product> {
        let mut children: Vec<&Product> = self
            .products
            .values()
            .filter(|p| p.parent_id() == Some(parent))
            .collect();
        children.sort_by_key(|p| p.id_typed());
        children
    }

    pub fn has_children(&self, parent: ProductId) -> bool {
        self.products.values().any(|p| p.parent_id() == Some(parent))
    }

    pub fn parent_of(&self, product: &Product) -> Option<&Product> {
        product.parent_id().and_then(|id| self.products.get(&id))
    }

    pub fn product_by_upc(&self, upc: &str) -> Option<&Product> {
        let upc = upc.trim();
        self.products.values().find(|p| p.upc() == Some(upc))
    }

    /// Whether another product (not `except`) already uses `upc`.
    pub fn upc_taken(&self, upc: &str, except: Option<ProductId>) -> bool {
        self.product_by_upc(upc)
            .is_some_and(|p| Some(p.id_typed()) != except)
    }

    pub fn insert_product(&mut self, mut product: Product) -> DomainResult<ProductId> {
        let id = product.id_typed();
        if self.products.contains_key(&id) {
            return Err(DomainError::conflict(format!("product {id} already exists")));
        }
        self.check_references(&product)?;

        let title = self.display_title(&product);
        product.ensure_slug(&title);
        tracing::info!(product_id = %id, structure = %product.structure(), "product added");
        self.products.insert(id, product);
        Ok(id)
    }

    pub fn update_product(&mut self, mut product: Product) -> DomainResult<()> {
        let id = product.id_typed();
        if !self.products.contains_key(&id) {
            return Err(DomainError::not_found());
        }
        self.check_references(&product)?;

        let title = self.display_title(&product);
        product.ensure_slug(&title);
        product.touch();
        tracing::info!(product_id = %id, "product updated");
        self.products.insert(id, product);
        Ok(())
    }

    fn check_references(&self, product: &Product) -> DomainResult<()> {
        if let Some(upc) = product.upc() {
            if self.upc_taken(upc, Some(product.id_typed())) {
                return Err(DomainError::conflict(DUPLICATE_UPC));
            }
        }
        if let Some(parent) = product.parent_id() {
            match self.products.get(&parent) {
                Some(p) if p.is_child() => {
                    return Err(DomainError::invariant(
                        "The specified parent product is a child product.",
                    ));
                }
                Some(p) if !p.is_parent() => {
                    return Err(DomainError::invariant(
                        "You can only assign child products to parent products.",
                    ));
                }
                Some(_) => {}
                None => return Err(DomainError::not_found()),
            }
        }
        if let Some(class) = product.product_class_id() {
            if !self.classes.contains_key(&class) {
                return Err(DomainError::not_found());
            }
        }
        if product.categories().iter().any(|c| !self.categories.contains(*c)) {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    /// Delete a product. Deleting a parent deletes its children too; the
    /// removed ids are returned, the requested product first.
    pub fn remove_product(&mut self, id: ProductId) -> DomainResult<Vec<ProductId>> {
        if self.products.remove(&id).is_none() {
            return Err(DomainError::not_found());
        }
        let mut removed = vec![id];
        let children: Vec<ProductId> = self
            .products
            .values()
            .filter(|p| p.parent_id() == Some(id))
            .map(Product::id_typed)
            .collect();
        for child in children {
            self.products.remove(&child);
            removed.push(child);
        }
        for product in self.products.values_mut() {
            product.drop_recommended(&removed);
        }
        tracing::info!(product_id = %id, removed = removed.len(), "product removed");
        Ok(removed)
    }

    /// Turn a standalone product into a parent so it can receive children.
    ///
    /// Returns `true` when the structure actually changed.
    pub fn promote_to_parent(&mut self, id: ProductId, has_stockrecords: bool) -> DomainResult<bool> {
        let product = self.products.get_mut(&id).ok_or_else(DomainError::not_found)?;
        product.can_be_parent(has_stockrecords)?;
        if product.is_standalone() {
            product.promote_to_parent();
            product.touch();
            return Ok(true);
        }
        Ok(false)
    }

    /// Undo `promote_to_parent`. Refused while the product still has children.
    pub fn demote_to_standalone(&mut self, id: ProductId) -> DomainResult<()> {
        if self.has_children(id) {
            return Err(DomainError::invariant(
                "A product with children can't become standalone.",
            ));
        }
        let product = self.products.get_mut(&id).ok_or_else(DomainError::not_found)?;
        if product.is_parent() {
            product.demote_to_standalone();
        }
        Ok(())
    }

    // -- inherited values --------------------------------------------------

    /// The product's class; children use their parent's.
    pub fn effective_class(&self, product: &Product) -> Option<&ProductClass> {
        let class = if product.is_child() {
            self.parent_of(product)?.product_class_id()
        } else {
            product.product_class_id()
        };
        class.and_then(|id| self.classes.get(&id))
    }

    /// Categories the product is filed under; children use their parent's.
    pub fn effective_categories<'a>(&'a self, product: &'a Product) -> &'a [CategoryId] {
        if product.is_child() {
            if let Some(parent) = self.parent_of(product) {
                return parent.categories();
            }
        }
        product.categories()
    }

    /// Own title, or the parent's title for an untitled child.
    pub fn display_title(&self, product: &Product) -> String {
        let title = product.title().trim();
        if title.is_empty() && product.is_child() {
            if let Some(parent) = self.parent_of(product) {
                return parent.title().to_string();
            }
        }
        title.to_string()
    }

    pub fn is_shipping_required(&self, product: &Product) -> bool {
        self.effective_class(product)
            .map(|c| c.requires_shipping)
            .unwrap_or(true)
    }

    pub fn tracks_stock(&self, product: &Product) -> bool {
        self.effective_class(product)
            .map(|c| c.track_stock)
            .unwrap_or(true)
    }

    pub fn is_discountable(&self, product: &Product) -> bool {
        match self.parent_of(product) {
            Some(parent) if product.is_child() => parent.is_discountable,
            _ => product.is_discountable,
        }
    }

    /// `"Name: value, Name: value"` for the attributes the product has set.
    pub fn attribute_summary(&self, product: &Product) -> String {
        let Some(class) = self.effective_class(product) else {
            return String::new();
        };
        class
            .attributes()
            .iter()
            .filter_map(|attr| {
                product
                    .attribute(&attr.code)
                    .map(|value| format!("{}: {}", attr.name, value.as_text()))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Run `Product::clean` with the related records looked up here.
    pub fn clean_product(&self, product: &Product, has_stockrecords: bool) -> DomainResult<()> {
        let ctx = CleanContext {
            parent: self.parent_of(product),
            class: self.effective_class(product),
            has_stockrecords,
        };
        product.clean(&ctx)
    }

    // -- categories --------------------------------------------------------

    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryTree {
        &mut self.categories
    }

    /// Delete a category subtree and unlink it from every product.
    pub fn remove_category(&mut self, id: CategoryId) -> DomainResult<Vec<CategoryId>> {
        let removed = self.categories.remove(id)?;
        for product in self.products.values_mut() {
            product.drop_categories(&removed);
        }
        Ok(removed)
    }

    /// Products filed (directly or through their parent) under `category`
    /// or any of its descendants.
    pub fn products_in_category(&self, category: CategoryId) -> Vec<&Product> {
        self.products
            .values()
            .filter(|p| {
                self.effective_categories(p)
                    .iter()
                    .any(|c| self.categories.is_in_subtree(category, *c))
            })
            .collect()
    }
}

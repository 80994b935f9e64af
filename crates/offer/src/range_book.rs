//! In-memory range registry.

use std::collections::HashMap;

use storefront_catalogue::{Catalogue, Product};
use storefront_core::{DomainError, DomainResult, ProductId, RangeId, slugify, unique_slug};

use crate::range::Range;

#[derive(Debug, Clone, Default)]
pub struct RangeBook {
    ranges: HashMap<RangeId, Range>,
}

impl RangeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new range, giving it a slug derived from its name that no
    /// other range uses (`foo`, `foo-2`, ...).
    pub fn create(&mut self, mut range: Range) -> DomainResult<RangeId> {
        if range.name.trim().is_empty() {
            return Err(DomainError::validation("A range must have a name."));
        }
        let id = range.id_typed();
        if self.ranges.contains_key(&id) {
            return Err(DomainError::conflict(format!("range {id} already exists")));
        }
        let base = match slugify(&range.name) {
            s if s.is_empty() => "range".to_string(),
            s => s,
        };
        range.set_slug(unique_slug(&base, |s| self.by_slug(s).is_some()));

        tracing::info!(range_id = %id, slug = range.slug(), "range created");
        self.ranges.insert(id, range);
        Ok(id)
    }

    pub fn get(&self, id: RangeId) -> Option<&Range> {
        self.ranges.get(&id)
    }

    pub fn get_mut(&mut self, id: RangeId) -> Option<&mut Range> {
        self.ranges.get_mut(&id)
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Range> {
        self.ranges.values().find(|r| r.slug() == slug)
    }

    /// Rename a range. Its slug is unchanged.
    pub fn rename(&mut self, id: RangeId, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("A range must have a name."));
        }
        let range = self.ranges.get_mut(&id).ok_or_else(DomainError::not_found)?;
        range.name = name;
        Ok(())
    }

    pub fn delete(&mut self, id: RangeId) -> DomainResult<Range> {
        let range = self.ranges.remove(&id).ok_or_else(DomainError::not_found)?;
        tracing::info!(range_id = %id, "range deleted");
        Ok(range)
    }

    /// All ranges sorted by name.
    pub fn list(&self) -> Vec<&Range> {
        let mut ranges: Vec<&Range> = self.ranges.values().collect();
        ranges.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.slug().cmp(b.slug())));
        ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ranges that contain `product`.
    pub fn ranges_containing(&self, catalogue: &Catalogue, product: &Product) -> Vec<&Range> {
        self.ranges
            .values()
            .filter(|r| r.contains_product(catalogue, product))
            .collect()
    }

    /// Drop references to deleted products from every range.
    pub fn forget_products(&mut self, products: &[ProductId]) {
        for range in self.ranges.values_mut() {
            range.forget_products(products);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_slugs_are_used() {
        let mut book = RangeBook::new();
        let first = book.create(Range::new("Foo")).unwrap();
        book.rename(first, "Bar").unwrap();
        let second = book.create(Range::new("Foo")).unwrap();

        assert_eq!(book.get(first).unwrap().slug(), "foo");
        assert_eq!(book.get(first).unwrap().name, "Bar");
        assert_eq!(book.get(second).unwrap().slug(), "foo-2");
    }

    #[test]
    fn nameless_ranges_are_rejected() {
        let mut book = RangeBook::new();
        assert!(book.create(Range::new("  ")).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn deleted_ranges_disappear() {
        let mut book = RangeBook::new();
        let id = book.create(Range::new("Sale")).unwrap();
        assert!(book.by_slug("sale").is_some());
        book.delete(id).unwrap();
        assert!(book.get(id).is_none());
        assert_eq!(book.delete(id).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn forgetting_products_cleans_every_range() {
        let mut book = RangeBook::new();
        let product = ProductId::new();
        let mut a = Range::new("A");
        a.add_product(product);
        let mut b = Range::new("B");
        b.exclude_product(product);
        let a = book.create(a).unwrap();
        let b = book.create(b).unwrap();

        book.forget_products(&[product]);
        assert!(book.get(a).unwrap().included_products().is_empty());
        assert!(book.get(b).unwrap().excluded_products().is_empty());
        assert_eq!(book.list().iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["A", "B"]);
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{
    CategoryId, DomainError, DomainResult, ProductClassId, ProductId, slugify,
};

use crate::attribute::AttributeValue;
use crate::product_class::ProductClass;

/// How a product relates to its variants.
///
/// - `Standalone`: a regular product that lives by itself.
/// - `Parent`: represents a set of variants; never sold directly.
/// - `Child`: a specific variant of a parent (e.g. size 4 of a T-shirt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStructure {
    Standalone,
    Parent,
    Child,
}

impl ProductStructure {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStructure::Standalone => "standalone",
            ProductStructure::Parent => "parent",
            ProductStructure::Child => "child",
        }
    }
}

impl core::fmt::Display for ProductStructure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub original: String,
    pub caption: String,
    /// Lowest display order is the primary image.
    pub display_order: u32,
}

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    structure: ProductStructure,
    upc: Option<String>,
    parent: Option<ProductId>,
    title: String,
    slug: String,
    pub description: String,
    /// `None` for child products, which inherit their parent's class.
    product_class: Option<ProductClassId>,
    attributes: BTreeMap<String, AttributeValue>,
    categories: Vec<CategoryId>,
    images: Vec<ProductImage>,
    recommended: Vec<ProductId>,
    /// Ignored for child products; they inherit it from the parent.
    pub is_discountable: bool,
    date_created: DateTime<Utc>,
    date_updated: DateTime<Utc>,
}

impl Product {
    fn blank(structure: ProductStructure, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            structure,
            upc: None,
            parent: None,
            title,
            slug: String::new(),
            description: String::new(),
            product_class: None,
            attributes: BTreeMap::new(),
            categories: Vec::new(),
            images: Vec::new(),
            recommended: Vec::new(),
            is_discountable: true,
            date_created: now,
            date_updated: now,
        }
    }

    pub fn standalone(title: impl Into<String>, class: ProductClassId) -> Self {
        let mut product = Self::blank(ProductStructure::Standalone, title.into());
        product.product_class = Some(class);
        product
    }

    pub fn parent(title: impl Into<String>, class: ProductClassId) -> Self {
        let mut product = Self::blank(ProductStructure::Parent, title.into());
        product.product_class = Some(class);
        product
    }

    pub fn child(parent: ProductId, title: impl Into<String>) -> Self {
        let mut product = Self::blank(ProductStructure::Child, title.into());
        product.parent = Some(parent);
        product
    }

    /// Builder-style UPC assignment (blank becomes `None`).
    pub fn with_upc(mut self, upc: impl Into<String>) -> Self {
        self.set_upc(Some(upc.into()));
        self
    }

    pub fn with_attribute(mut self, code: impl Into<String>, value: AttributeValue) -> Self {
        self.set_attribute(code, value);
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = CategoryId>) -> Self {
        self.set_categories(categories);
        self
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn structure(&self) -> ProductStructure {
        self.structure
    }

    pub fn is_standalone(&self) -> bool {
        self.structure == ProductStructure::Standalone
    }

    pub fn is_parent(&self) -> bool {
        self.structure == ProductStructure::Parent
    }

    pub fn is_child(&self) -> bool {
        self.structure == ProductStructure::Child
    }

    pub fn upc(&self) -> Option<&str> {
        self.upc.as_deref()
    }

    /// Set the UPC. Blank values are stored as `None` so that any number of
    /// products may lack a UPC without tripping uniqueness.
    pub fn set_upc(&mut self, upc: Option<String>) {
        self.upc = upc
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
    }

    pub fn parent_id(&self) -> Option<ProductId> {
        self.parent
    }

    /// Own title only; see `Catalogue::display_title` for the child fallback.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub(crate) fn ensure_slug(&mut self, display_title: &str) {
        if self.slug.is_empty() {
            self.slug = slugify(display_title);
        }
    }

    pub fn product_class_id(&self) -> Option<ProductClassId> {
        self.product_class
    }

    pub fn set_product_class(&mut self, class: Option<ProductClassId>) {
        self.product_class = class;
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, code: &str) -> Option<&AttributeValue> {
        self.attributes.get(code)
    }

    pub fn set_attribute(&mut self, code: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(code.into(), value);
    }

    pub fn clear_attribute(&mut self, code: &str) {
        self.attributes.remove(code);
    }

    /// Own categories; children inherit their parent's through the catalogue.
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    pub fn set_categories(&mut self, categories: impl IntoIterator<Item = CategoryId>) {
        self.categories.clear();
        for category in categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
    }

    pub(crate) fn drop_categories(&mut self, removed: &[CategoryId]) {
        self.categories.retain(|c| !removed.contains(c));
    }

    pub fn images(&self) -> &[ProductImage] {
        &self.images
    }

    pub fn set_images(&mut self, mut images: Vec<ProductImage>) {
        images.sort_by_key(|i| i.display_order);
        self.images = images;
    }

    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    pub fn recommended(&self) -> &[ProductId] {
        &self.recommended
    }

    pub fn set_recommended(&mut self, recommended: Vec<ProductId>) {
        self.recommended = recommended;
    }

    pub(crate) fn drop_recommended(&mut self, removed: &[ProductId]) {
        self.recommended.retain(|p| !removed.contains(p));
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn date_updated(&self) -> DateTime<Utc> {
        self.date_updated
    }

    pub(crate) fn touch(&mut self) {
        self.date_updated = Utc::now();
    }

    /// Turn a standalone product into a parent (first child being created).
    pub(crate) fn promote_to_parent(&mut self) {
        self.structure = ProductStructure::Parent;
    }

    pub(crate) fn demote_to_standalone(&mut self) {
        self.structure = ProductStructure::Standalone;
    }

    /// Whether this product may receive child products.
    pub fn can_be_parent(&self, has_stockrecords: bool) -> DomainResult<()> {
        if self.is_child() {
            return Err(DomainError::invariant(
                "The specified parent product is a child product.",
            ));
        }
        if has_stockrecords {
            return Err(DomainError::invariant(
                "One can't add a child product to a product with stock records.",
            ));
        }
        Ok(())
    }

    /// Validate the product against its structure rules.
    ///
    /// | field         | standalone | parent    | child        |
    /// |---------------|------------|-----------|--------------|
    /// | title         | required   | required  | optional     |
    /// | product class | required   | required  | must be None |
    /// | parent        | forbidden  | forbidden | required     |
    /// | stock records | 0 or more  | forbidden | 0 or more    |
    /// | categories    | any        | any       | forbidden    |
    ///
    /// Non-parent products also have their attribute values checked against
    /// the effective class.
    pub fn clean(&self, ctx: &CleanContext<'_>) -> DomainResult<()> {
        match self.structure {
            ProductStructure::Standalone => self.clean_standalone()?,
            ProductStructure::Parent => self.clean_parent(ctx)?,
            ProductStructure::Child => self.clean_child(ctx)?,
        }

        if !self.is_parent() {
            if let Some(class) = ctx.class {
                class.validate_attributes(&self.attributes)?;
            }
        }
        Ok(())
    }

    fn clean_standalone(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("Your product must have a title."));
        }
        if self.product_class.is_none() {
            return Err(DomainError::validation(
                "Your product must have a product class.",
            ));
        }
        if self.parent.is_some() {
            return Err(DomainError::validation(
                "Only child products can have a parent.",
            ));
        }
        Ok(())
    }

    fn clean_parent(&self, ctx: &CleanContext<'_>) -> DomainResult<()> {
        self.clean_standalone()?;
        if ctx.has_stockrecords {
            return Err(DomainError::validation(
                "A parent product can't have stockrecords.",
            ));
        }
        Ok(())
    }

    fn clean_child(&self, ctx: &CleanContext<'_>) -> DomainResult<()> {
        if self.parent.is_none() {
            return Err(DomainError::validation("A child product needs a parent."));
        }
        match ctx.parent {
            Some(parent) if parent.is_parent() => {}
            _ => {
                return Err(DomainError::validation(
                    "You can only assign child products to parent products.",
                ));
            }
        }
        if self.product_class.is_some() {
            return Err(DomainError::validation(
                "A child product can't have a product class.",
            ));
        }
        if !self.categories.is_empty() {
            return Err(DomainError::validation(
                "A child product can't have a category assigned.",
            ));
        }
        Ok(())
    }
}

/// Related records needed to validate a product.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanContext<'a> {
    /// The product's parent (children only).
    pub parent: Option<&'a Product>,
    /// The effective product class (the parent's, for children).
    pub class: Option<&'a ProductClass>,
    pub has_stockrecords: bool,
}

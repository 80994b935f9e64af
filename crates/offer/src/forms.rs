//! Range editing and bulk product upload forms.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use storefront_catalogue::{Catalogue, Product};
use storefront_core::{CategoryId, FieldErrors, ProductId};
use storefront_partner::StockBook;

use crate::range::Range;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w-]+").expect("valid regex"));

/// Split pasted text or an uploaded file into SKU/UPC tokens. Commas,
/// whitespace and newlines all separate tokens.
pub fn tokenise(raw: &str) -> BTreeSet<String> {
    IDENTIFIER_RE
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFormData {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub includes_all_products: bool,
    pub included_categories: Vec<CategoryId>,
}

/// Create or edit a range's descriptive fields and rules.
#[derive(Debug, Clone, Copy)]
pub struct RangeForm<'a> {
    catalogue: &'a Catalogue,
    instance: Option<&'a Range>,
}

impl<'a> RangeForm<'a> {
    pub fn new(catalogue: &'a Catalogue) -> Self {
        Self {
            catalogue,
            instance: None,
        }
    }

    pub fn instance(mut self, range: &'a Range) -> Self {
        self.instance = Some(range);
        self
    }

    pub fn clean(&self, data: &RangeFormData) -> Result<Range, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = data.name.trim();
        if name.is_empty() {
            errors.add_required("name");
        }
        for category in &data.included_categories {
            if !self.catalogue.categories().contains(*category) {
                errors.add(
                    "included_categories",
                    format!("Select a valid choice. {category} is not one of the available choices."),
                );
            }
        }
        errors.into_result()?;

        let mut range = match self.instance {
            Some(existing) => existing.clone(),
            None => Range::new(name),
        };
        range.name = name.to_string();
        range.description = data.description.clone();
        range.is_public = data.is_public;
        range.includes_all_products = data.includes_all_products;
        for category in range.included_categories().clone() {
            range.remove_category(category);
        }
        for category in &data.included_categories {
            range.add_category(*category);
        }
        Ok(range)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeProductFormData {
    /// Pasted SKUs/UPCs.
    pub query: String,
    /// Contents of an uploaded file: comma separated, or one per line.
    pub file_upload: Option<String>,
}

impl RangeProductFormData {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            file_upload: None,
        }
    }
}

/// Outcome of a valid bulk upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeProductUpload {
    products: Vec<ProductId>,
    missing_skus: BTreeSet<String>,
    duplicate_skus: BTreeSet<String>,
}

impl RangeProductUpload {
    /// Top-level products (standalone or parent) to add to the range.
    pub fn get_products(&self) -> &[ProductId] {
        &self.products
    }

    /// Submitted identifiers that matched nothing.
    pub fn get_missing_skus(&self) -> &BTreeSet<String> {
        &self.missing_skus
    }

    /// Submitted identifiers already covered by the range.
    pub fn get_duplicate_skus(&self) -> &BTreeSet<String> {
        &self.duplicate_skus
    }
}

/// Add products to a range by pasting SKUs/UPCs or uploading a file.
///
/// An identifier matches a product through the product's own UPC or one of
/// its stock records' partner SKUs; matches on a child resolve to its
/// parent, since including a parent includes all its variants.
#[derive(Debug, Clone, Copy)]
pub struct RangeProductForm<'a> {
    range: &'a Range,
    catalogue: &'a Catalogue,
    stock: &'a StockBook,
}

impl<'a> RangeProductForm<'a> {
    pub fn new(range: &'a Range, catalogue: &'a Catalogue, stock: &'a StockBook) -> Self {
        Self {
            range,
            catalogue,
            stock,
        }
    }

    pub fn clean(&self, data: &RangeProductFormData) -> Result<RangeProductUpload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let file = data.file_upload.as_deref().unwrap_or("");
        if data.query.trim().is_empty() && file.trim().is_empty() {
            errors.add_non_field("You must submit either a list of SKU/UPCs or a file");
            return Err(errors);
        }
        let field = if data.query.trim().is_empty() { "file_upload" } else { "query" };

        let mut ids = tokenise(&data.query);
        ids.extend(tokenise(file));
        let listed = ids.iter().cloned().collect::<Vec<_>>().join(", ");

        let existing = self.existing_identifiers();
        let duplicate_skus: BTreeSet<String> = ids.intersection(&existing).cloned().collect();
        let new_ids: BTreeSet<String> = ids.difference(&existing).cloned().collect();
        if new_ids.is_empty() {
            errors.add(
                field,
                format!("The products with SKUs or UPCs matching {listed} are already in this range"),
            );
            return Err(errors);
        }

        let index = self.identifier_index();
        let mut products = Vec::new();
        let mut missing_skus = BTreeSet::new();
        for id in &new_ids {
            match index.get(id.as_str()) {
                Some(matches) => {
                    for product in matches {
                        if !products.contains(product) {
                            products.push(*product);
                        }
                    }
                }
                None => {
                    missing_skus.insert(id.clone());
                }
            }
        }
        if products.is_empty() {
            errors.add(
                field,
                format!("No products exist with a SKU or UPC matching {listed}"),
            );
            return Err(errors);
        }

        tracing::debug!(
            range_id = %self.range.id_typed(),
            matched = products.len(),
            missing = missing_skus.len(),
            "range upload parsed"
        );
        Ok(RangeProductUpload {
            products,
            missing_skus,
            duplicate_skus,
        })
    }

    fn identifiers_of(&self, product: &'a Product) -> impl Iterator<Item = &'a str> + 'a {
        product.upc().into_iter().chain(
            self.stock
                .records_for(product.id_typed())
                .into_iter()
                .map(|r| r.partner_sku()),
        )
    }

    /// SKUs and UPCs of the explicitly included products and their children.
    fn existing_identifiers(&self) -> BTreeSet<String> {
        let mut existing = BTreeSet::new();
        for id in self.range.included_products() {
            let Some(product) = self.catalogue.product(*id) else {
                continue;
            };
            let family = std::iter::once(product).chain(self.catalogue.children(*id));
            for member in family {
                existing.extend(self.identifiers_of(member).map(str::to_string));
            }
        }
        existing
    }

    /// Identifier to top-level product ids.
    fn identifier_index(&self) -> BTreeMap<&'a str, Vec<ProductId>> {
        let mut index: BTreeMap<&'a str, Vec<ProductId>> = BTreeMap::new();
        for product in self.catalogue.products() {
            let top = product.parent_id().unwrap_or_else(|| product.id_typed());
            for identifier in self.identifiers_of(product) {
                let entry = index.entry(identifier).or_default();
                if !entry.contains(&top) {
                    entry.push(top);
                }
            }
        }
        index
    }
}

//! Range management: editing ranges and adding products to them in bulk.
//! Staff only.

use storefront_core::{ProductId, RangeId};
use storefront_offer::{Range, RangeForm, RangeFormData, RangeProductForm, RangeProductFormData};

use crate::access::DashboardUser;
use crate::error::{DashboardError, DashboardResult};
use crate::store::Store;

/// Result of a bulk product upload: one success message and any warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub added: Vec<ProductId>,
    pub message: String,
    pub warnings: Vec<String>,
}

pub struct RangeEditor<'a> {
    store: &'a mut Store,
}

impl<'a> RangeEditor<'a> {
    pub fn new(store: &'a mut Store, user: &DashboardUser) -> DashboardResult<Self> {
        if !user.is_staff {
            return Err(DashboardError::Forbidden);
        }
        Ok(Self { store })
    }

    pub fn list(&self) -> Vec<&Range> {
        self.store.ranges.list()
    }

    pub fn create(&mut self, data: &RangeFormData) -> DashboardResult<RangeId> {
        let range = RangeForm::new(&self.store.catalogue).clean(data)?;
        Ok(self.store.ranges.create(range)?)
    }

    pub fn update(&mut self, id: RangeId, data: &RangeFormData) -> DashboardResult<()> {
        let existing = self.store.ranges.get(id).ok_or(DashboardError::NotFound)?;
        let range = RangeForm::new(&self.store.catalogue).instance(existing).clean(data)?;
        let slot = self.store.ranges.get_mut(id).ok_or(DashboardError::NotFound)?;
        *slot = range;
        tracing::info!(range_id = %id, "range updated");
        Ok(())
    }

    pub fn delete(&mut self, id: RangeId) -> DashboardResult<Range> {
        Ok(self.store.ranges.delete(id)?)
    }

    /// Add the products matching pasted or uploaded SKUs/UPCs.
    pub fn upload_products(&mut self, id: RangeId, data: &RangeProductFormData) -> DashboardResult<UploadReport> {
        let range = self.store.ranges.get(id).ok_or(DashboardError::NotFound)?;
        let upload = RangeProductForm::new(range, &self.store.catalogue, &self.store.stock).clean(data)?;

        let range = self.store.ranges.get_mut(id).ok_or(DashboardError::NotFound)?;
        for product in upload.get_products() {
            range.add_product(*product);
        }

        let added = upload.get_products().to_vec();
        let message = match added.len() {
            1 => "1 product added to range".to_string(),
            n => format!("{n} products added to range"),
        };
        let mut warnings = Vec::new();
        if !upload.get_duplicate_skus().is_empty() {
            warnings.push(format!(
                "The products with SKUs or UPCs matching {} are already in this range",
                join(upload.get_duplicate_skus())
            ));
        }
        if !upload.get_missing_skus().is_empty() {
            warnings.push(format!(
                "No product(s) were found with SKU or UPC matching {}",
                join(upload.get_missing_skus())
            ));
        }
        tracing::info!(range_id = %id, added = added.len(), warnings = warnings.len(), "range products uploaded");
        Ok(UploadReport {
            added,
            message,
            warnings,
        })
    }

    /// Take products off the range's include list.
    pub fn remove_products(&mut self, id: RangeId, products: &[ProductId]) -> DashboardResult<String> {
        let range = self.store.ranges.get_mut(id).ok_or(DashboardError::NotFound)?;
        for product in products {
            range.remove_product(*product);
        }
        Ok(format!("Removed {} products from range", products.len()))
    }
}

fn join<'s>(ids: impl IntoIterator<Item = &'s String>) -> String {
    ids.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

//! Creating, editing and deleting products from the dashboard.
//!
//! A save validates the product form together with its category, image and
//! stock-record formsets. When creating, the product is inserted before the
//! formsets are checked so they can bind to it; if anything then fails the
//! product is removed again, and a standalone product promoted to parent for
//! the occasion is turned back. Either every change is stored or none is.

use serde::{Deserialize, Serialize};

use storefront_catalogue::{ChildProductForm, Product, ProductForm, ProductFormData, ProductStructure};
use storefront_core::{CategoryId, FieldErrors, ProductId};
use storefront_partner::StockRecord;

use crate::access::{DashboardUser, can_access_product, filter_products};
use crate::error::{DashboardError, DashboardResult, INVALID_SUBMISSION};
use crate::formsets::{
    CategoryFormData, ImageFormData, StockRecordFormData, StockRecordFormset, clean_categories, clean_images,
};
use crate::store::Store;

/// Which save button was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveAction {
    #[default]
    Save,
    Continue,
    CreateChild,
    CreateAnotherChild,
}

/// Where the caller should go after a successful save or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    ProductList,
    EditProduct(ProductId),
    EditChild(ProductId),
    CreateChild { parent: ProductId },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSubmission {
    pub form: ProductFormData,
    pub categories: Vec<CategoryFormData>,
    pub images: Vec<ImageFormData>,
    pub stockrecords: Vec<StockRecordFormData>,
    pub action: SaveAction,
}

impl ProductSubmission {
    pub fn new(form: ProductFormData) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.categories.push(CategoryFormData::new(category));
        self
    }

    pub fn with_stockrecord(mut self, row: StockRecordFormData) -> Self {
        self.stockrecords.push(row);
        self
    }

    pub fn with_image(mut self, row: ImageFormData) -> Self {
        self.images.push(row);
        self
    }

    pub fn action(mut self, action: SaveAction) -> Self {
        self.action = action;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub product: ProductId,
    pub next: NextPage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    /// The deleted product first, then any variants deleted with it.
    pub removed: Vec<ProductId>,
    pub next: NextPage,
    pub message: String,
}

/// What a submission is saving.
#[derive(Debug, Clone, Copy)]
struct Target {
    structure: ProductStructure,
    parent: Option<ProductId>,
    creating: bool,
}

#[derive(Debug, Clone)]
struct Snapshot {
    product: Product,
    records: Vec<StockRecord>,
}

/// Writes to undo when a save cannot complete.
#[derive(Debug, Default)]
struct Rollback {
    created: Option<ProductId>,
    promoted_parent: Option<ProductId>,
    original: Option<Snapshot>,
}

impl Rollback {
    fn undo(self, store: &mut Store) {
        if let Some(id) = self.created {
            store.stock.remove_for_products(&[id]);
            if let Err(err) = store.catalogue.remove_product(id) {
                tracing::warn!(product_id = %id, error = %err, "could not remove unsaved product");
            }
        }
        if let Some(parent) = self.promoted_parent {
            if let Err(err) = store.catalogue.demote_to_standalone(parent) {
                tracing::warn!(product_id = %parent, error = %err, "could not revert parent promotion");
            }
        }
        if let Some(snapshot) = self.original {
            let id = snapshot.product.id_typed();
            if let Err(err) = store.catalogue.update_product(snapshot.product) {
                tracing::warn!(product_id = %id, error = %err, "could not restore product");
            }
            store.stock.remove_for_products(&[id]);
            for record in snapshot.records {
                if let Err(err) = store.stock.save_record(record) {
                    tracing::warn!(product_id = %id, error = %err, "could not restore stock record");
                }
            }
        }
    }
}

/// Product workflows for one dashboard user.
pub struct ProductEditor<'a> {
    store: &'a mut Store,
    user: DashboardUser,
}

impl<'a> ProductEditor<'a> {
    pub fn new(store: &'a mut Store, user: DashboardUser) -> Self {
        Self { store, user }
    }

    pub fn user(&self) -> &DashboardUser {
        &self.user
    }

    /// Products this user may manage.
    pub fn list(&self) -> Vec<&Product> {
        filter_products(&self.store.catalogue, &self.store.stock, &self.user)
    }

    /// A product this user may manage. Others are reported as missing.
    pub fn get(&self, id: ProductId) -> DashboardResult<&Product> {
        let product = self.store.catalogue.product(id).ok_or(DashboardError::NotFound)?;
        if !can_access_product(&self.store.catalogue, &self.store.stock, &self.user, product) {
            return Err(DashboardError::NotFound);
        }
        Ok(product)
    }

    /// Create a standalone product of the class with slug `class_slug`.
    pub fn create_product(&mut self, class_slug: &str, submission: &ProductSubmission) -> DashboardResult<Saved> {
        self.create_top_level(class_slug, ProductStructure::Standalone, submission)
    }

    /// Create a parent product, to receive variants later.
    pub fn create_parent(&mut self, class_slug: &str, submission: &ProductSubmission) -> DashboardResult<Saved> {
        self.create_top_level(class_slug, ProductStructure::Parent, submission)
    }

    fn create_top_level(
        &mut self,
        class_slug: &str,
        structure: ProductStructure,
        submission: &ProductSubmission,
    ) -> DashboardResult<Saved> {
        let class = self
            .store
            .catalogue
            .class_by_slug(class_slug)
            .cloned()
            .ok_or(DashboardError::NotFound)?;
        let mut form = ProductForm::new(&self.store.catalogue, &class);
        if structure == ProductStructure::Parent {
            form = form.as_parent();
        }
        let cleaned = form.clean(&submission.form);

        let mut errors = FieldErrors::new();
        let mut rollback = Rollback::default();
        let draft = match cleaned {
            Ok(product) => {
                let id = self.store.catalogue.insert_product(product)?;
                rollback.created = Some(id);
                self.store.catalogue.product(id).cloned()
            }
            Err(form_errors) => {
                errors.merge_prefixed("", form_errors);
                None
            }
        };
        let target = Target {
            structure,
            parent: None,
            creating: true,
        };
        self.finish(draft, target, submission, errors, rollback)
    }

    /// Create a variant of `parent_id`. A standalone product becomes a
    /// parent when its first variant is saved.
    pub fn create_child(&mut self, parent_id: ProductId, submission: &ProductSubmission) -> DashboardResult<Saved> {
        if !self.user.is_staff {
            return Err(DashboardError::Forbidden);
        }
        let parent = self
            .store
            .catalogue
            .product(parent_id)
            .cloned()
            .ok_or(DashboardError::NotFound)?;
        let has_records = self.store.stock.has_records(parent_id);

        let mut errors = FieldErrors::new();
        if let Err(err) = parent.can_be_parent(has_records) {
            errors.add_non_field(err.message());
        }
        let cleaned = ChildProductForm::new(&self.store.catalogue, &parent).clean(&submission.form);

        let mut rollback = Rollback::default();
        let draft = match cleaned {
            Ok(product) if errors.is_empty() => {
                if self.store.catalogue.promote_to_parent(parent_id, has_records)? {
                    rollback.promoted_parent = Some(parent_id);
                }
                match self.store.catalogue.insert_product(product) {
                    Ok(id) => {
                        rollback.created = Some(id);
                        self.store.catalogue.product(id).cloned()
                    }
                    Err(err) => {
                        rollback.undo(self.store);
                        return Err(err.into());
                    }
                }
            }
            Ok(_) => None,
            Err(form_errors) => {
                errors.merge_prefixed("", form_errors);
                None
            }
        };
        let target = Target {
            structure: ProductStructure::Child,
            parent: Some(parent_id),
            creating: true,
        };
        self.finish(draft, target, submission, errors, rollback)
    }

    pub fn update(&mut self, id: ProductId, submission: &ProductSubmission) -> DashboardResult<Saved> {
        let product = self.get(id)?.clone();
        let catalogue = &self.store.catalogue;
        let cleaned = if product.is_child() {
            let parent = catalogue.parent_of(&product).ok_or(DashboardError::NotFound)?;
            ChildProductForm::new(catalogue, parent)
                .instance(&product)
                .clean(&submission.form)
        } else {
            let class = catalogue.effective_class(&product).ok_or(DashboardError::NotFound)?;
            ProductForm::new(catalogue, class)
                .instance(&product)
                .clean(&submission.form)
        };

        let mut errors = FieldErrors::new();
        let draft = match cleaned {
            Ok(draft) => Some(draft),
            Err(form_errors) => {
                errors.merge_prefixed("", form_errors);
                None
            }
        };
        let target = Target {
            structure: product.structure(),
            parent: product.parent_id(),
            creating: false,
        };
        self.finish(draft, target, submission, errors, Rollback::default())
    }

    fn finish(
        &mut self,
        draft: Option<Product>,
        target: Target,
        submission: &ProductSubmission,
        mut errors: FieldErrors,
        mut rollback: Rollback,
    ) -> DashboardResult<Saved> {
        let product_id = draft.as_ref().map(Product::id_typed);
        let categories = clean_categories(
            &self.store.catalogue,
            target.structure,
            &submission.categories,
            &mut errors,
        );
        let images = clean_images(&submission.images, &mut errors);
        let changes = StockRecordFormset {
            stock: &self.store.stock,
            user: &self.user,
            product: product_id,
            structure: target.structure,
            default_currency: &self.store.settings.default_currency,
        }
        .clean(&submission.stockrecords, &mut errors);

        let mut product = match draft {
            Some(product) if errors.is_empty() => product,
            _ => return self.reject(errors, rollback),
        };
        product.set_categories(categories);
        product.set_images(images);

        let has_records = changes.leaves_records(&self.store.stock, product_id);
        if let Err(err) = self.store.catalogue.clean_product(&product, has_records) {
            errors.add_non_field(err.message());
            return self.reject(errors, rollback);
        }

        let id = product.id_typed();
        if !target.creating {
            rollback.original = self.snapshot(id);
        }
        let title = self.store.catalogue.display_title(&product);
        let stored = self
            .store
            .catalogue
            .update_product(product)
            .map_err(DashboardError::from)
            .and_then(|()| changes.apply(id, &mut self.store.stock).map_err(DashboardError::from));
        if let Err(err) = stored {
            tracing::warn!(product_id = %id, error = %err, "product save failed; rolling back");
            rollback.undo(self.store);
            return Err(err);
        }

        tracing::info!(
            product_id = %id,
            structure = %target.structure,
            creating = target.creating,
            "product saved"
        );
        let noun = if target.structure == ProductStructure::Child { "variant" } else { "product" };
        let verb = if target.creating { "Created" } else { "Updated" };
        Ok(Saved {
            product: id,
            next: next_page(submission.action, id, target),
            message: format!("{verb} {noun} '{title}'"),
        })
    }

    fn snapshot(&self, id: ProductId) -> Option<Snapshot> {
        let product = self.store.catalogue.product(id)?.clone();
        let records = self.store.stock.records_for(id).into_iter().cloned().collect();
        Some(Snapshot { product, records })
    }

    fn reject(&mut self, errors: FieldErrors, rollback: Rollback) -> DashboardResult<Saved> {
        tracing::warn!(errors = %errors, "{}", INVALID_SUBMISSION);
        rollback.undo(self.store);
        Err(DashboardError::Invalid(errors))
    }

    /// Delete a product with its variants, their stock records and any
    /// range references. Deleting the last variant leaves the parent as an
    /// empty parent.
    pub fn delete(&mut self, id: ProductId) -> DashboardResult<Deleted> {
        let product = self.get(id)?;
        let title = self.store.catalogue.display_title(product);
        let parent = product.parent_id();

        let removed = self.store.catalogue.remove_product(id)?;
        let records = self.store.stock.remove_for_products(&removed);
        self.store.ranges.forget_products(&removed);
        tracing::info!(product_id = %id, products = removed.len(), records, "product deleted");

        let (next, message) = match parent {
            Some(parent) => (NextPage::EditProduct(parent), format!("Deleted variant '{title}'")),
            None => (NextPage::ProductList, format!("Deleted product '{title}'")),
        };
        Ok(Deleted {
            removed,
            next,
            message,
        })
    }
}

fn next_page(action: SaveAction, id: ProductId, target: Target) -> NextPage {
    let is_child = target.structure == ProductStructure::Child;
    match (action, target.parent) {
        (SaveAction::Continue, _) if is_child => NextPage::EditChild(id),
        (SaveAction::Continue, _) => NextPage::EditProduct(id),
        (SaveAction::CreateAnotherChild, Some(parent)) => NextPage::CreateChild { parent },
        (SaveAction::CreateChild, _) if !is_child => NextPage::CreateChild { parent: id },
        _ => NextPage::ProductList,
    }
}

mod common;

use common::World;
use storefront_catalogue::{DUPLICATE_UPC, ProductFormData, ProductStructure};
use storefront_core::error::REQUIRED;
use storefront_dashboard::formsets::{DUPLICATE_SKU, NEEDS_CATEGORY};
use storefront_dashboard::{
    DashboardError, DashboardUser, ImageFormData, NextPage, ProductEditor, ProductSubmission, SaveAction,
    StockRecordFormData,
};
use storefront_offer::Range;

fn invalid(err: DashboardError) -> storefront_core::FieldErrors {
    match err {
        DashboardError::Invalid(errors) => errors,
        other => panic!("expected invalid submission, got {other:?}"),
    }
}

#[test]
fn staff_can_create_a_product_without_stock_records() {
    let mut world = World::new();
    let slug = world.class_slug();
    let submission = ProductSubmission::new(ProductFormData::titled("new product")).with_category(world.category);

    let mut editor = ProductEditor::new(&mut world.store, DashboardUser::staff());
    let saved = editor.create_product(&slug, &submission).unwrap();

    assert_eq!(saved.next, NextPage::ProductList);
    assert_eq!(saved.message, "Created product 'new product'");
    let product = world.store.catalogue.product(saved.product).unwrap();
    assert_eq!(product.structure(), ProductStructure::Standalone);
    assert_eq!(product.categories(), [world.category]);
    assert_eq!(product.slug(), "new-product");
}

#[test]
fn continue_stays_on_the_new_product() {
    let mut world = World::new();
    let slug = world.class_slug();
    let submission = ProductSubmission::new(ProductFormData::titled("new product"))
        .with_category(world.category)
        .action(SaveAction::Continue);

    let saved = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_product(&slug, &submission)
        .unwrap();
    assert_eq!(saved.next, NextPage::EditProduct(saved.product));
    assert_eq!(world.store.catalogue.len(), 1);
}

#[test]
fn unknown_classes_are_not_found() {
    let mut world = World::new();
    let submission = ProductSubmission::new(ProductFormData::titled("x")).with_category(world.category);
    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_product("no-such-class", &submission)
        .unwrap_err();
    assert_eq!(err, DashboardError::NotFound);
}

#[test]
fn a_product_without_categories_is_rolled_back() {
    let mut world = World::new();
    let slug = world.class_slug();
    let submission = ProductSubmission::new(ProductFormData::titled("lonely"));

    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_product(&slug, &submission)
        .unwrap_err();
    let errors = invalid(err);
    assert_eq!(errors.non_field(), [NEEDS_CATEGORY]);
    assert!(world.store.catalogue.is_empty());
}

#[test]
fn form_and_formset_errors_are_reported_together() {
    let mut world = World::new();
    let slug = world.class_slug();
    let submission = ProductSubmission::new(ProductFormData::default())
        .with_image(ImageFormData {
            caption: "missing file".into(),
            ..ImageFormData::default()
        });

    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_product(&slug, &submission)
        .unwrap_err();
    let errors = invalid(err);
    assert_eq!(errors.field("title"), [REQUIRED]);
    assert_eq!(errors.field("images-0-original"), [REQUIRED]);
    assert!(errors.non_field().contains(&NEEDS_CATEGORY.to_string()));
    assert!(world.store.catalogue.is_empty());
}

#[test]
fn a_bad_stock_record_leaves_no_orphan_product() {
    let mut world = World::new();
    let existing = world.standalone("Existing");
    let partner = world.partner;
    world.stock(existing, partner, "SKU-1");
    let slug = world.class_slug();
    let records_before = world.store.stock.records().count();

    let submission = ProductSubmission::new(ProductFormData::titled("Clash"))
        .with_category(world.category)
        .with_stockrecord(StockRecordFormData::new(partner, "SKU-1", 500));
    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_product(&slug, &submission)
        .unwrap_err();

    assert_eq!(invalid(err).field("stockrecords-0-partner_sku"), [DUPLICATE_SKU]);
    assert_eq!(world.store.catalogue.len(), 1);
    assert_eq!(world.store.stock.records().count(), records_before);
}

#[test]
fn stock_records_are_saved_with_the_product() {
    let mut world = World::new();
    let slug = world.class_slug();
    let submission = ProductSubmission::new(ProductFormData::titled("Stocked").with_upc("9780000000001"))
        .with_category(world.category)
        .with_stockrecord(StockRecordFormData::new(world.partner, "ST-1", 1250).with_stock(4))
        .with_image(ImageFormData::new("covers/stocked.jpg", 0));

    let saved = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_product(&slug, &submission)
        .unwrap();

    let records = world.store.stock.records_for(saved.product);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].partner_sku(), "ST-1");
    assert_eq!(records[0].price_currency, "GBP");
    assert_eq!(records[0].num_in_stock, 4);
    let product = world.store.catalogue.product(saved.product).unwrap();
    assert_eq!(product.upc(), Some("9780000000001"));
    assert_eq!(product.primary_image().unwrap().original, "covers/stocked.jpg");
}

#[test]
fn parents_cannot_carry_stock_records() {
    let mut world = World::new();
    let slug = world.class_slug();
    let submission = ProductSubmission::new(ProductFormData::titled("Shirt"))
        .with_category(world.category)
        .with_stockrecord(StockRecordFormData::new(world.partner, "SHIRT", 1500));

    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_parent(&slug, &submission)
        .unwrap_err();
    assert!(invalid(err).mentions("A parent product can't have stockrecords."));
    assert!(world.store.catalogue.is_empty());
}

#[test]
fn staff_can_create_a_child_with_required_attributes() {
    let mut world = World::new();
    world.require_weight();
    let parent = world.parent("T-shirt");

    let submission = ProductSubmission::new(
        ProductFormData::titled("new product")
            .with_upc("123456")
            .with_attribute("weight", "5"),
    )
    .with_stockrecord(StockRecordFormData::new(world.partner, "TS-S", 1000))
    .action(SaveAction::CreateAnotherChild);
    let saved = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_child(parent, &submission)
        .unwrap();

    assert_eq!(saved.message, "Created variant 'new product'");
    assert_eq!(saved.next, NextPage::CreateChild { parent });
    assert_eq!(world.store.catalogue.children(parent).len(), 1);
}

#[test]
fn a_child_missing_a_required_attribute_is_refused() {
    let mut world = World::new();
    world.require_weight();
    let parent = world.parent("T-shirt");

    let submission = ProductSubmission::new(ProductFormData::titled("Small"));
    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_child(parent, &submission)
        .unwrap_err();
    assert_eq!(invalid(err).field("attr_weight"), [REQUIRED]);
    assert!(world.store.catalogue.children(parent).is_empty());
}

#[test]
fn children_need_no_title() {
    let mut world = World::new();
    let parent = world.parent("Mug");
    let saved = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_child(parent, &ProductSubmission::default())
        .unwrap();
    assert_eq!(saved.message, "Created variant 'Mug'");
}

#[test]
fn duplicate_child_upcs_are_refused_but_blank_ones_are_not() {
    let mut world = World::new();
    let parent = world.parent("Mug");
    let mut editor = ProductEditor::new(&mut world.store, DashboardUser::staff());

    let with_upc = ProductSubmission::new(ProductFormData::titled("Red").with_upc("MUG-1"));
    editor.create_child(parent, &with_upc).unwrap();
    let err = editor.create_child(parent, &with_upc).unwrap_err();
    assert_eq!(invalid(err).field("upc"), [DUPLICATE_UPC]);

    editor
        .create_child(parent, &ProductSubmission::new(ProductFormData::titled("Blue")))
        .unwrap();
    editor
        .create_child(parent, &ProductSubmission::new(ProductFormData::titled("Green")))
        .unwrap();
    assert_eq!(world.store.catalogue.children(parent).len(), 3);
}

#[test]
fn the_first_child_promotes_a_standalone_product() {
    let mut world = World::new();
    let product = world.standalone("Poster");
    ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_child(product, &ProductSubmission::new(ProductFormData::titled("A2")))
        .unwrap();
    assert!(world.store.catalogue.product(product).unwrap().is_parent());
}

#[test]
fn a_failed_first_child_leaves_the_product_standalone() {
    let mut world = World::new();
    let product = world.standalone("Poster");
    let other = world.standalone("Other");
    let partner = world.partner;
    world.stock(other, partner, "TAKEN");

    let submission = ProductSubmission::new(ProductFormData::titled("A2"))
        .with_stockrecord(StockRecordFormData::new(partner, "TAKEN", 100));
    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_child(product, &submission)
        .unwrap_err();

    assert!(matches!(err, DashboardError::Invalid(_)));
    let product = world.store.catalogue.product(product).unwrap();
    assert!(product.is_standalone());
    assert_eq!(world.store.catalogue.len(), 2);
}

#[test]
fn products_with_stock_records_cannot_take_children() {
    let mut world = World::new();
    let product = world.standalone("Poster");
    let partner = world.partner;
    world.stock(product, partner, "POSTER");

    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .create_child(product, &ProductSubmission::new(ProductFormData::titled("A2")))
        .unwrap_err();
    assert_eq!(
        invalid(err).non_field(),
        ["One can't add a child product to a product with stock records."]
    );
    assert!(world.store.catalogue.product(product).unwrap().is_standalone());
}

#[test]
fn staff_can_update_a_product() {
    let mut world = World::new();
    let product = world.standalone("Old title");
    let submission = ProductSubmission::new(ProductFormData::titled("foobar")).with_category(world.category);

    let saved = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .update(product, &submission)
        .unwrap();
    assert_eq!(saved.message, "Updated product 'foobar'");
    assert_eq!(world.store.catalogue.product(product).unwrap().title(), "foobar");
}

#[test]
fn an_invalid_update_changes_nothing() {
    let mut world = World::new();
    let product = world.standalone("Keep me");
    let before = world.store.catalogue.product(product).unwrap().clone();

    let submission = ProductSubmission::new(ProductFormData::titled("Changed"));
    let err = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .update(product, &submission)
        .unwrap_err();
    assert!(invalid(err).mentions("at least one category"));
    assert_eq!(world.store.catalogue.product(product), Some(&before));
}

#[test]
fn deleting_a_standalone_product_cascades() {
    let mut world = World::new();
    let product = world.standalone("Doomed");
    let partner = world.partner;
    world.stock(product, partner, "DOOMED");
    let mut range = Range::new("Everything doomed");
    range.add_product(product);
    let range = world.store.ranges.create(range).unwrap();

    let deleted = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .delete(product)
        .unwrap();

    assert_eq!(deleted.next, NextPage::ProductList);
    assert_eq!(deleted.message, "Deleted product 'Doomed'");
    assert!(world.store.catalogue.is_empty());
    assert_eq!(world.store.stock.records().count(), 0);
    assert!(world.store.catalogue.categories().contains(world.category));
    assert!(world.store.ranges.get(range).unwrap().included_products().is_empty());
}

#[test]
fn deleting_a_parent_deletes_its_variants() {
    let mut world = World::new();
    let parent = world.parent("Shirt");
    let child = world.child(parent, "Small");

    let deleted = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .delete(parent)
        .unwrap();
    assert_eq!(deleted.removed, vec![parent, child]);
    assert!(world.store.catalogue.is_empty());
}

#[test]
fn deleting_the_last_variant_returns_to_the_parent() {
    let mut world = World::new();
    let parent = world.parent("Shirt");
    let child = world.child(parent, "");

    let deleted = ProductEditor::new(&mut world.store, DashboardUser::staff())
        .delete(child)
        .unwrap();
    assert_eq!(deleted.next, NextPage::EditProduct(parent));
    assert_eq!(deleted.message, "Deleted variant 'Shirt'");
    assert!(world.store.catalogue.product(parent).unwrap().is_parent());
}

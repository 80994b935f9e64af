//! `storefront-catalogue`: products, variants, classes and categories.

pub mod attribute;
pub mod catalogue;
pub mod category;
pub mod forms;
pub mod product;
pub mod product_class;

pub use attribute::{AttributeOptionGroup, AttributeType, AttributeValue, EntityRef, ProductAttribute};
pub use catalogue::{Catalogue, DUPLICATE_UPC};
pub use category::{Category, CategoryTree, MovePosition};
pub use forms::{
    ChildProductForm, ProductAttributeForm, ProductAttributeFormData, ProductForm, ProductFormData,
};
pub use product::{CleanContext, Product, ProductImage, ProductStructure};
pub use product_class::ProductClass;

//! Form binding and validation for products, variants and attributes.
//!
//! Forms take raw submitted strings and either produce a ready-to-store
//! record or a set of field-scoped errors. They never write to the
//! catalogue themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storefront_core::{FieldErrors, ProductId};

use crate::attribute::{AttributeOptionGroup, AttributeType, INVALID_CODE, ProductAttribute, code_from_name, is_valid_code};
use crate::catalogue::{Catalogue, DUPLICATE_UPC};
use crate::product::Product;
use crate::product_class::ProductClass;

/// Raw product submission. Attribute values are keyed by attribute code;
/// their errors are reported under `attr_<code>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFormData {
    pub title: String,
    pub upc: String,
    pub description: String,
    pub is_discountable: bool,
    pub attributes: BTreeMap<String, String>,
}

impl Default for ProductFormData {
    fn default() -> Self {
        Self {
            title: String::new(),
            upc: String::new(),
            description: String::new(),
            is_discountable: true,
            attributes: BTreeMap::new(),
        }
    }
}

impl ProductFormData {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_upc(mut self, upc: impl Into<String>) -> Self {
        self.upc = upc.into();
        self
    }

    pub fn with_attribute(mut self, code: impl Into<String>, raw: impl Into<String>) -> Self {
        self.attributes.insert(code.into(), raw.into());
        self
    }
}

/// Form for standalone and parent products.
#[derive(Debug, Clone, Copy)]
pub struct ProductForm<'a> {
    catalogue: &'a Catalogue,
    class: &'a ProductClass,
    instance: Option<&'a Product>,
    parent: bool,
}

impl<'a> ProductForm<'a> {
    pub fn new(catalogue: &'a Catalogue, class: &'a ProductClass) -> Self {
        Self {
            catalogue,
            class,
            instance: None,
            parent: false,
        }
    }

    /// Create a parent product instead of a standalone one.
    pub fn as_parent(mut self) -> Self {
        self.parent = true;
        self
    }

    /// Edit an existing product.
    pub fn instance(mut self, product: &'a Product) -> Self {
        self.parent = product.is_parent();
        self.instance = Some(product);
        self
    }

    pub fn clean(&self, data: &ProductFormData) -> Result<Product, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = data.title.trim();
        if title.is_empty() {
            errors.add_required("title");
        }
        let instance_id = self.instance.map(Product::id_typed);
        clean_upc(self.catalogue, &data.upc, instance_id, &mut errors);

        let mut product = match self.instance {
            Some(existing) => existing.clone(),
            None if self.parent => Product::parent(title, self.class.id_typed()),
            None => Product::standalone(title, self.class.id_typed()),
        };
        // Parents are never sold, so their attribute values are optional.
        bind_attributes(self.class, data, !self.parent, &mut product, &mut errors);
        errors.into_result()?;

        product.set_title(title);
        product.set_upc(Some(data.upc.clone()));
        product.set_product_class(Some(self.class.id_typed()));
        product.description = data.description.clone();
        product.is_discountable = data.is_discountable;
        Ok(product)
    }
}

/// Form for child products (variants). Binds attributes against the
/// parent's class and leaves the title optional.
#[derive(Debug, Clone, Copy)]
pub struct ChildProductForm<'a> {
    catalogue: &'a Catalogue,
    parent: &'a Product,
    instance: Option<&'a Product>,
}

impl<'a> ChildProductForm<'a> {
    pub fn new(catalogue: &'a Catalogue, parent: &'a Product) -> Self {
        Self {
            catalogue,
            parent,
            instance: None,
        }
    }

    pub fn instance(mut self, product: &'a Product) -> Self {
        self.instance = Some(product);
        self
    }

    pub fn clean(&self, data: &ProductFormData) -> Result<Product, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = data.title.trim();
        let instance_id = self.instance.map(Product::id_typed);
        clean_upc(self.catalogue, &data.upc, instance_id, &mut errors);

        let mut product = match self.instance {
            Some(existing) => existing.clone(),
            None => Product::child(self.parent.id_typed(), title),
        };
        match self.catalogue.effective_class(self.parent) {
            Some(class) => bind_attributes(class, data, true, &mut product, &mut errors),
            None => errors.add_non_field("Your product must have a product class."),
        }
        errors.into_result()?;

        product.set_title(title);
        product.set_upc(Some(data.upc.clone()));
        product.description = data.description.clone();
        Ok(product)
    }
}

fn clean_upc(catalogue: &Catalogue, upc: &str, except: Option<ProductId>, errors: &mut FieldErrors) {
    let upc = upc.trim();
    if !upc.is_empty() && catalogue.upc_taken(upc, except) {
        errors.add("upc", DUPLICATE_UPC);
    }
}

fn bind_attributes(
    class: &ProductClass,
    data: &ProductFormData,
    enforce_required: bool,
    product: &mut Product,
    errors: &mut FieldErrors,
) {
    for attribute in class.attributes() {
        let raw = data.attributes.get(&attribute.code).map(String::as_str).unwrap_or("");
        match attribute.parse_raw(raw) {
            Ok(Some(value)) => product.set_attribute(attribute.code.clone(), value),
            Ok(None) if attribute.required && enforce_required => {
                errors.add_required(attribute.field_name());
            }
            Ok(None) => product.clear_attribute(&attribute.code),
            Err(message) => errors.add(attribute.field_name(), message),
        }
    }
}

/// Raw attribute-definition submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAttributeFormData {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub option_group: Option<AttributeOptionGroup>,
}

impl ProductAttributeFormData {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            code: String::new(),
            attribute_type,
            required: false,
            option_group: None,
        }
    }
}

/// Form for adding an attribute to a product class.
///
/// A blank code is generated from the name and suffixed (`_2`, `_3`, ...)
/// until it is unique within the class.
#[derive(Debug, Clone, Copy)]
pub struct ProductAttributeForm<'a> {
    class: &'a ProductClass,
}

impl<'a> ProductAttributeForm<'a> {
    pub fn new(class: &'a ProductClass) -> Self {
        Self { class }
    }

    pub fn clean(&self, data: &ProductAttributeFormData) -> Result<ProductAttribute, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = data.name.trim();
        if name.is_empty() {
            errors.add_required("name");
        }

        let code = data.code.trim();
        let code = if code.is_empty() {
            let base = code_from_name(name);
            let mut candidate = base.clone();
            let mut n = 2;
            while self.class.attribute(&candidate).is_some() {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            candidate
        } else {
            if !is_valid_code(code) {
                errors.add("code", INVALID_CODE);
            } else if self.class.attribute(code).is_some() {
                errors.add("code", "An attribute with this code already exists.");
            }
            code.to_string()
        };

        if data.attribute_type.is_option() && data.option_group.is_none() {
            errors.add_required("option_group");
        }
        errors.into_result()?;

        let mut attribute = ProductAttribute::new(name, code, data.attribute_type);
        attribute.required = data.required;
        attribute.option_group = data.option_group.clone();
        Ok(attribute)
    }
}

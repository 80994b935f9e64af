use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, ProductClassId};

use crate::attribute::{AttributeValue, ProductAttribute, INVALID_CODE, is_valid_code};

/// "Kind" of product (books, T-shirts, ...): the attribute schema shared by
/// a parent and its children, plus shipping/stock behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductClass {
    id: ProductClassId,
    pub name: String,
    pub slug: String,
    /// Digital products and the like skip shipping.
    pub requires_shipping: bool,
    /// Whether stock levels are tracked (and allocated on order placement).
    pub track_stock: bool,
    attributes: Vec<ProductAttribute>,
}

impl ProductClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProductClassId::new(),
            name: name.into(),
            slug: String::new(),
            requires_shipping: true,
            track_stock: true,
            attributes: Vec::new(),
        }
    }

    pub fn id_typed(&self) -> ProductClassId {
        self.id
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn without_shipping(mut self) -> Self {
        self.requires_shipping = false;
        self
    }

    pub fn without_stock_tracking(mut self) -> Self {
        self.track_stock = false;
        self
    }

    pub fn attributes(&self) -> &[ProductAttribute] {
        &self.attributes
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn attribute(&self, code: &str) -> Option<&ProductAttribute> {
        self.attributes.iter().find(|a| a.code == code)
    }

    /// Add an attribute definition. Codes are unique within a class.
    pub fn add_attribute(&mut self, attribute: ProductAttribute) -> DomainResult<()> {
        if !is_valid_code(&attribute.code) {
            return Err(DomainError::validation(INVALID_CODE));
        }
        if self.attribute(&attribute.code).is_some() {
            return Err(DomainError::conflict(format!(
                "attribute with code '{}' already exists on {}",
                attribute.code, self.name
            )));
        }
        self.attributes.push(attribute);
        self.attributes.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(())
    }

    /// Validate a product's attribute values against this class: required
    /// attributes must be present and present values must fit their type.
    pub fn validate_attributes(&self, values: &BTreeMap<String, AttributeValue>) -> DomainResult<()> {
        for attribute in &self.attributes {
            match values.get(&attribute.code) {
                None if attribute.required => {
                    return Err(DomainError::validation(format!(
                        "{} attribute cannot be blank",
                        attribute.code
                    )));
                }
                None => {}
                Some(value) => {
                    attribute.validate_value(value).map_err(|err| {
                        DomainError::validation(format!("{} attribute {}", attribute.code, err))
                    })?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeType;

    fn books() -> ProductClass {
        let mut class = ProductClass::new("Books");
        class
            .add_attribute(ProductAttribute::new("Pages", "num_pages", AttributeType::Integer).required())
            .unwrap();
        class
            .add_attribute(ProductAttribute::new("Weight", "weight", AttributeType::Float))
            .unwrap();
        class
    }

    #[test]
    fn attribute_codes_are_unique_per_class() {
        let mut class = books();
        let err = class
            .add_attribute(ProductAttribute::new("Pages again", "num_pages", AttributeType::Integer))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn invalid_codes_are_rejected() {
        let mut class = books();
        let err = class
            .add_attribute(ProductAttribute::new("Bad", "9lives", AttributeType::Text))
            .unwrap_err();
        assert_eq!(err, DomainError::validation(INVALID_CODE));
    }

    #[test]
    fn required_attributes_must_be_present() {
        let class = books();
        let err = class.validate_attributes(&BTreeMap::new()).unwrap_err();
        assert_eq!(err, DomainError::validation("num_pages attribute cannot be blank"));

        let mut values = BTreeMap::new();
        values.insert("num_pages".to_string(), AttributeValue::Integer(100));
        assert!(class.validate_attributes(&values).is_ok());
    }

    #[test]
    fn present_values_must_fit_their_type() {
        let class = books();
        let mut values = BTreeMap::new();
        values.insert("num_pages".to_string(), AttributeValue::Integer(100));
        values.insert("weight".to_string(), AttributeValue::Text("heavy".into()));
        let err = class.validate_attributes(&values).unwrap_err();
        assert_eq!(err, DomainError::validation("weight attribute Must be a float"));
    }

    #[test]
    fn classes_require_shipping_and_track_stock_by_default() {
        let class = ProductClass::new("Clothing");
        assert!(class.requires_shipping);
        assert!(class.track_stock);
        let ebooks = ProductClass::new("Ebooks").without_shipping().without_stock_tracking();
        assert!(!ebooks.requires_shipping);
        assert!(!ebooks.track_stock);
    }
}

use serde::{Deserialize, Serialize};

use storefront_basket::Basket;
use storefront_catalogue::{Catalogue, Product};
use storefront_config::Settings;

use crate::error::{ShippingError, ShippingResult};

/// Weighs products and baskets using a product attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub attribute_code: String,
    /// Used for products that have no value for the attribute.
    pub default_weight: Option<f64>,
}

impl Scale {
    pub fn new(attribute_code: impl Into<String>) -> Self {
        Self {
            attribute_code: attribute_code.into(),
            default_weight: None,
        }
    }

    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = Some(weight);
        self
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            attribute_code: settings.weight_attribute.clone(),
            default_weight: settings.default_weight,
        }
    }

    /// The product's own attribute value; a child does not fall back to its
    /// parent's weight.
    pub fn weigh_product(&self, product: &Product) -> ShippingResult<f64> {
        match product.attribute(&self.attribute_code) {
            Some(value) => value.as_f64().ok_or_else(|| ShippingError::InvalidWeight {
                product: product.id_typed(),
                code: self.attribute_code.clone(),
                value: value.as_text(),
            }),
            None => self.default_weight.ok_or_else(|| ShippingError::MissingAttribute {
                product: product.id_typed(),
                code: self.attribute_code.clone(),
            }),
        }
    }

    /// Sum of line quantity times product weight. An empty basket weighs 0.
    pub fn weigh_basket(&self, basket: &Basket, catalogue: &Catalogue) -> ShippingResult<f64> {
        let mut weight = 0.0;
        for line in basket.lines() {
            let product = catalogue
                .product(line.product_id)
                .ok_or(ShippingError::ProductNotFound(line.product_id))?;
            weight += f64::from(line.quantity) * self.weigh_product(product)?;
        }
        tracing::debug!(basket_id = %basket.id_typed(), weight, "basket weighed");
        Ok(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_basket::{AddProduct, BasketCommand};
    use storefront_catalogue::{AttributeType, AttributeValue, ProductAttribute, ProductClass};
    use storefront_core::{Aggregate, Money, ProductClassId, ProductId, StockRecordId};

    struct Fixture {
        catalogue: Catalogue,
        class: ProductClassId,
        scale: Scale,
    }

    impl Fixture {
        fn new() -> Self {
            let mut catalogue = Catalogue::new();
            let class = catalogue.add_class(ProductClass::new("Parcels")).unwrap();
            catalogue
                .add_attribute(class, ProductAttribute::new("Weight", "weight", AttributeType::Float))
                .unwrap();
            Self {
                catalogue,
                class,
                scale: Scale::new("weight"),
            }
        }

        fn product_with_weight(&mut self, weight: Option<AttributeValue>) -> ProductId {
            let mut product = Product::standalone("Parcel", self.class);
            if let Some(weight) = weight {
                product.set_attribute("weight", weight);
            }
            self.catalogue.insert_product(product).unwrap()
        }

        fn weigh(&self, scale: &Scale, id: ProductId) -> ShippingResult<f64> {
            scale.weigh_product(self.catalogue.product(id).unwrap())
        }
    }

    fn add_line(basket: &mut Basket, product: ProductId, quantity: u32) {
        let cmd = BasketCommand::AddProduct(AddProduct {
            basket_id: basket.id_typed(),
            product_id: product,
            stockrecord_id: StockRecordId::new(),
            quantity,
            unit_price: Money::new(100, "GBP"),
            occurred_at: Utc::now(),
        });
        basket.execute(&cmd).unwrap();
    }

    #[test]
    fn weighs_uses_specified_attribute() {
        let mut f = Fixture::new();
        let id = f.product_with_weight(Some(AttributeValue::Integer(1)));
        assert_eq!(f.weigh(&f.scale, id).unwrap(), 1.0);
    }

    #[test]
    fn uses_default_weight_when_attribute_is_missing() {
        let mut f = Fixture::new();
        let id = f.product_with_weight(None);
        let scale = Scale::new("weight").with_default_weight(0.5);
        assert_eq!(f.weigh(&scale, id).unwrap(), 0.5);
    }

    #[test]
    fn missing_attribute_without_default_is_an_error() {
        let mut f = Fixture::new();
        let id = f.product_with_weight(None);
        match f.weigh(&f.scale, id).unwrap_err() {
            ShippingError::MissingAttribute { code, .. } => assert_eq!(code, "weight"),
            other => panic!("expected MissingAttribute, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_weight_is_an_error() {
        let mut f = Fixture::new();
        let id = f.product_with_weight(Some(AttributeValue::Text("heavy".into())));
        let scale = Scale::new("weight").with_default_weight(0.5);
        assert!(matches!(
            f.weigh(&scale, id).unwrap_err(),
            ShippingError::InvalidWeight { .. }
        ));
    }

    #[test]
    fn non_finite_weight_is_an_error() {
        let mut f = Fixture::new();
        for weight in [AttributeValue::Text("NaN".into()), AttributeValue::Float(f64::INFINITY)] {
            let id = f.product_with_weight(Some(weight));
            assert!(matches!(
                f.weigh(&f.scale, id).unwrap_err(),
                ShippingError::InvalidWeight { .. }
            ));
        }
    }

    #[test]
    fn returns_zero_for_empty_basket() {
        let f = Fixture::new();
        let basket = Basket::open(None);
        assert_eq!(f.scale.weigh_basket(&basket, &f.catalogue).unwrap(), 0.0);
    }

    #[test]
    fn returns_correct_weight_for_nonempty_basket() {
        let mut f = Fixture::new();
        let mut basket = Basket::open(None);
        for weight in ["1", "2"] {
            let id = f.product_with_weight(Some(AttributeValue::Text(weight.into())));
            add_line(&mut basket, id, 1);
        }
        assert_eq!(f.scale.weigh_basket(&basket, &f.catalogue).unwrap(), 3.0);
    }

    #[test]
    fn returns_correct_weight_with_line_quantities() {
        let mut f = Fixture::new();
        let mut basket = Basket::open(None);
        for (weight, quantity) in [("1", 3), ("2", 4)] {
            let id = f.product_with_weight(Some(AttributeValue::Text(weight.into())));
            add_line(&mut basket, id, quantity);
        }
        assert_eq!(f.scale.weigh_basket(&basket, &f.catalogue).unwrap(), 11.0);
    }

    #[test]
    fn children_do_not_inherit_parent_weight() {
        let mut f = Fixture::new();
        let parent = Product::parent("Box", f.class).with_attribute("weight", AttributeValue::Float(2.0));
        let parent = f.catalogue.insert_product(parent).unwrap();
        let child = f.catalogue.insert_product(Product::child(parent, "Small")).unwrap();
        assert!(f.weigh(&f.scale, child).is_err());
    }

    #[test]
    fn settings_configure_the_scale() {
        let settings = Settings {
            weight_attribute: "shipping_weight".into(),
            default_weight: Some(1.5),
            ..Settings::default()
        };
        let scale = Scale::from_settings(&settings);
        assert_eq!(scale.attribute_code, "shipping_weight");
        assert_eq!(scale.default_weight, Some(1.5));
    }
}

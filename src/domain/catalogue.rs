//! Read-only product and waitlist catalogue.
//!
//! Populated once from configuration before the server accepts traffic and
//! never mutated afterwards, so it can be shared freely across request
//! handlers.

use std::collections::HashMap;

use serde::Deserialize;

/// Mailing-list and template configuration for one email touchpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EmailTouchpoint {
    #[serde(default)]
    pub list_ids: Vec<String>,
    #[serde(default)]
    pub template_id: String,
}

/// A purchasable product, keyed by the payment provider's product ID.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Product {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stripe_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub purchase_thankyou: EmailTouchpoint,
}

/// A waitlist mapping a form to its mailing lists.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Waitlist {
    #[serde(default)]
    pub name: String,
    /// Form-intake provider form ID.
    #[serde(default)]
    pub form_id: String,
    #[serde(default)]
    pub list_ids: Vec<String>,
}

/// The immutable catalogue shared by all handlers.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    products: HashMap<String, Product>,
    waitlists: Vec<Waitlist>,
}

impl Catalogue {
    pub fn new(products: Vec<Product>, waitlists: Vec<Waitlist>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|p| (p.stripe_id.clone(), p))
                .collect(),
            waitlists,
        }
    }

    /// Look up a product by the payment provider's product ID.
    ///
    /// Unknown IDs resolve to a zero-value product: purchases of unconfigured
    /// products are processed with empty template data rather than failing
    /// the whole fan-out.
    pub fn product_by_stripe_id(&self, product_id: &str) -> Product {
        self.products.get(product_id).cloned().unwrap_or_default()
    }

    /// Look up a waitlist by the form-intake provider's form ID.
    pub fn waitlist_by_form_id(&self, form_id: &str) -> Option<&Waitlist> {
        self.waitlists.iter().find(|w| w.form_id == form_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalogue() -> Catalogue {
        Catalogue::new(
            vec![Product {
                name: "Starter Kit".into(),
                stripe_id: "prod_123".into(),
                url: "https://shop.example.com/starter".into(),
                purchase_thankyou: EmailTouchpoint {
                    list_ids: vec!["list-a".into()],
                    template_id: "d-template".into(),
                },
            }],
            vec![Waitlist {
                name: "beta".into(),
                form_id: "form_abc".into(),
                list_ids: vec!["list-b".into()],
            }],
        )
    }

    #[test]
    fn product_lookup_hit() {
        let catalogue = sample_catalogue();
        let product = catalogue.product_by_stripe_id("prod_123");
        assert_eq!(product.name, "Starter Kit");
        assert_eq!(product.purchase_thankyou.template_id, "d-template");
    }

    #[test]
    fn product_lookup_miss_yields_zero_value() {
        let catalogue = sample_catalogue();
        let product = catalogue.product_by_stripe_id("prod_unknown");
        assert_eq!(product, Product::default());
    }

    #[test]
    fn waitlist_lookup_by_form_id() {
        let catalogue = sample_catalogue();
        assert_eq!(
            catalogue.waitlist_by_form_id("form_abc").unwrap().name,
            "beta"
        );
        assert!(catalogue.waitlist_by_form_id("form_zzz").is_none());
    }
}

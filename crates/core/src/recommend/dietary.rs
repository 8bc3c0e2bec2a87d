//! Strict dietary compliance.
//!
//! A product complies with a restriction when it carries the matching tag. An
//! untagged product is dropped if its text mentions any exclusion term for the
//! restriction. For vegetarian and vegan the missing tag alone is enough to drop
//! it; every other diet relies on the exclusion text.

use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryRule {
    pub label: String,
    pub exclusions: Vec<String>,
    /// Untagged products fail even when no exclusion term is present.
    pub requires_tag: bool,
}

impl DietaryRule {
    fn new(label: &str, exclusions: &[&str], requires_tag: bool) -> Self {
        Self {
            label: label.to_string(),
            exclusions: exclusions.iter().map(|term| (*term).to_string()).collect(),
            requires_tag,
        }
    }

    fn excluded_by_text(&self, searchable_text: &str) -> bool {
        self.exclusions.iter().any(|term| searchable_text.contains(term.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryFilter {
    rules: Vec<DietaryRule>,
}

impl Default for DietaryFilter {
    fn default() -> Self {
        Self::new(vec![
            DietaryRule::new(
                "vegetarian",
                &[
                    "beef", "pork", "chicken", "turkey", "fish", "seafood", "meat", "bacon", "ham",
                    "sausage",
                ],
                true,
            ),
            DietaryRule::new(
                "vegan",
                &[
                    "beef", "pork", "chicken", "turkey", "fish", "seafood", "meat", "dairy",
                    "cheese", "milk", "butter", "cream", "egg", "honey",
                ],
                true,
            ),
            DietaryRule::new(
                "gluten-free",
                &["wheat", "gluten", "bread", "pasta", "flour", "barley", "rye"],
                false,
            ),
            DietaryRule::new(
                "dairy-free",
                &["milk", "cheese", "butter", "cream", "yogurt", "dairy"],
                false,
            ),
            DietaryRule::new(
                "keto",
                &["bread", "pasta", "rice", "potato", "sugar", "flour"],
                false,
            ),
            DietaryRule::new(
                "low-carb",
                &["bread", "pasta", "rice", "potato", "sugar", "flour", "carbs"],
                false,
            ),
        ])
    }
}

impl DietaryFilter {
    pub fn new(rules: Vec<DietaryRule>) -> Self {
        Self { rules }
    }

    pub fn rule(&self, restriction: &str) -> Option<&DietaryRule> {
        let restriction = restriction.to_lowercase();
        self.rules.iter().find(|rule| rule.label == restriction)
    }

    /// Untagged and textually excluded. Restrictions without a rule never
    /// exclude anything.
    pub fn text_excludes(&self, product: &Product, restriction: &str) -> bool {
        if product.has_dietary_tag(restriction) {
            return false;
        }
        self.rule(restriction).is_some_and(|rule| rule.excluded_by_text(&product.searchable_text()))
    }

    pub fn complies(&self, product: &Product, restriction: &str) -> bool {
        if product.has_dietary_tag(restriction) {
            return true;
        }
        match self.rule(restriction) {
            Some(rule) => !rule.requires_tag && !rule.excluded_by_text(&product.searchable_text()),
            None => true,
        }
    }

    pub fn complies_with_all(&self, product: &Product, restrictions: &[String]) -> bool {
        restrictions.iter().all(|restriction| self.complies(product, restriction))
    }

    /// Keeps catalog order. An empty restriction list keeps everything.
    pub fn filter(&self, products: &[Product], restrictions: &[String]) -> Vec<Product> {
        products
            .iter()
            .filter(|product| self.complies_with_all(product, restrictions))
            .cloned()
            .collect()
    }
}

/// Standalone compliance pass used by catalog browsing.
pub fn filter_dietary(products: &[Product], restrictions: &[String]) -> Vec<Product> {
    DietaryFilter::default().filter(products, restrictions)
}

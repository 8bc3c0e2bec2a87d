//! Catalog browsing outside of a conversation.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::domain::product::Product;
use crate::recommend::DietaryFilter;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive substring of the product category.
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Every label must be satisfied, strictly.
    pub dietary: Vec<String>,
    /// Any one of these mood tags is enough.
    pub moods: Vec<String>,
}

impl CatalogQuery {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price_range(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    pub fn with_dietary(mut self, dietary: Vec<String>) -> Self {
        self.dietary = dietary;
        self
    }

    pub fn with_moods(mut self, moods: Vec<String>) -> Self {
        self.moods = moods;
        self
    }

    /// Category and price predicates only.
    pub fn matches_attributes(&self, product: &Product) -> bool {
        let category_ok = self.category.as_deref().map_or(true, |category| {
            product.category.to_lowercase().contains(&category.to_lowercase())
        });
        let min_ok = self.min_price.map_or(true, |min| product.price >= min);
        let max_ok = self.max_price.map_or(true, |max| product.price <= max);

        category_ok && min_ok && max_ok
    }

    pub fn matches_moods(&self, product: &Product) -> bool {
        self.moods.is_empty() || self.moods.iter().any(|mood| product.has_mood_tag(mood))
    }
}

/// Most popular first (unrated last), strict dietary filter, then the mood
/// filter.
pub fn browse(products: &[Product], query: &CatalogQuery, dietary: &DietaryFilter) -> Vec<Product> {
    let mut matching: Vec<Product> =
        products.iter().filter(|product| query.matches_attributes(product)).cloned().collect();
    matching.sort_by_key(|product| Reverse(product.popularity_score));

    dietary
        .filter(&matching, &query.dietary)
        .into_iter()
        .filter(|product| query.matches_moods(product))
        .collect()
}

/// Splits a comma-separated filter value into trimmed, non-empty labels.
pub fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|label| !label.is_empty()).map(str::to_string).collect()
}

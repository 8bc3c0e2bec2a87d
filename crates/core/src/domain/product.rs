use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Popularity assumed for products the catalog never rated.
pub const DEFAULT_POPULARITY: u8 = 50;

pub const MAX_SPICE_LEVEL: u8 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A menu item as published by the catalog. Never edited in place: a catalog
/// refresh replaces the whole record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub price: f64,
    pub calories: u32,
    pub dietary_tags: Vec<String>,
    pub mood_tags: Vec<String>,
    pub allergens: Vec<String>,
    pub popularity_score: Option<u8>,
    pub spice_level: u8,
    pub chef_special: bool,
    pub limited_time: bool,
}

impl Product {
    /// Lowercased name, description and ingredients joined by spaces. Dietary
    /// exclusion terms are searched for in this text.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.ingredients.join(" "))
            .to_lowercase()
    }

    pub fn has_dietary_tag(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.dietary_tags.iter().any(|tag| tag.to_lowercase() == label)
    }

    pub fn has_mood_tag(&self, mood: &str) -> bool {
        self.mood_tags.iter().any(|tag| tag == mood)
    }

    pub fn has_allergen(&self, allergen: &str) -> bool {
        self.allergens.iter().any(|entry| entry == allergen)
    }

    pub fn popularity(&self) -> f64 {
        f64::from(self.popularity_score.unwrap_or(DEFAULT_POPULARITY))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let reason = if !self.price.is_finite() || self.price < 0.0 {
            format!("price {} is negative or not a number", self.price)
        } else if self.popularity_score.is_some_and(|score| score > 100) {
            "popularity must be within 0..=100".to_string()
        } else if self.spice_level > MAX_SPICE_LEVEL {
            format!("spice level must be within 0..={MAX_SPICE_LEVEL}")
        } else {
            return Ok(());
        };
        Err(DomainError::InvalidProduct { product_id: self.id.0.clone(), reason })
    }
}

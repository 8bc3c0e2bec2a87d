//! Types for the recommendation ranker

use serde::{Deserialize, Serialize};

use crate::domain::conversation::Conversation;
use crate::domain::product::{Product, ProductId};
use crate::signals::MessageIntent;

/// Everything the ranker reads besides the catalog.
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    /// Conversation state after the current message was applied
    pub conversation: &'a Conversation,
    /// What the current message asks for
    pub intent: &'a MessageIntent,
    /// Maximum number of recommendations to return
    pub limit: usize,
}

/// Individual scoring components, each on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ComponentScores {
    /// Category, dietary and mood match against the current message
    pub current_request: f64,
    /// Overlap with preferences remembered on the conversation
    pub historical_preference: f64,
    /// Overlap with remembered mood tags
    pub mood: f64,
    /// 0 when a remembered restriction is violated, else 100
    pub dietary_compatibility: f64,
    /// Price against the budget hint
    pub budget_fit: f64,
    /// Catalog popularity
    pub popularity: f64,
}

/// A product paired with its score and explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub dietary_tags: Vec<String>,
    pub mood_tags: Vec<String>,
    pub spice_level: u8,
    pub popularity_score: Option<u8>,
    pub recommendation_score: f64,
    /// At most three, in priority order
    pub reasons: Vec<String>,
    /// Absent for fallback entries, which are not scored component-wise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_scores: Option<ComponentScores>,
}

impl RankedRecommendation {
    pub fn new(
        product: &Product,
        recommendation_score: f64,
        reasons: Vec<String>,
        component_scores: Option<ComponentScores>,
    ) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: product.price,
            dietary_tags: product.dietary_tags.clone(),
            mood_tags: product.mood_tags.clone(),
            spice_level: product.spice_level,
            popularity_score: product.popularity_score,
            recommendation_score,
            reasons,
            component_scores,
        }
    }

    /// Reasons joined for storage on a recommendation event
    pub fn reason_text(&self) -> String {
        self.reasons.join(", ")
    }
}

/// Outcome of one ranking pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationResult {
    /// The dietary filter removed every product
    NoSuitableProducts {
        restrictions: Vec<String>,
        description: String,
        reason: String,
    },
    Ranked {
        recommendations: Vec<RankedRecommendation>,
        /// Whether the popularity fallback replaced the primary ranking
        fallback_applied: bool,
    },
}

impl RecommendationResult {
    pub fn no_suitable_products(restrictions: Vec<String>) -> Self {
        let joined = restrictions.join(", ");
        Self::NoSuitableProducts {
            description: format!("Sorry, no products match your {joined} requirements."),
            reason: format!("Strict {joined} filtering applied"),
            restrictions,
        }
    }

    pub fn empty() -> Self {
        Self::Ranked { recommendations: Vec::new(), fallback_applied: false }
    }

    /// Ranked entries; the sentinel has none
    pub fn recommendations(&self) -> &[RankedRecommendation] {
        match self {
            Self::NoSuitableProducts { .. } => &[],
            Self::Ranked { recommendations, .. } => recommendations,
        }
    }

    pub fn is_no_suitable_products(&self) -> bool {
        matches!(self, Self::NoSuitableProducts { .. })
    }

    pub fn fallback_applied(&self) -> bool {
        matches!(self, Self::Ranked { fallback_applied: true, .. })
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.recommendations().iter().map(|entry| entry.product_id.clone()).collect()
    }
}

//! Scoring algorithms for product recommendations

use std::collections::BTreeSet;

use super::dietary::DietaryFilter;
use super::types::ComponentScores;
use super::{HIGH_POPULARITY, MAX_REASONS};
use crate::domain::conversation::{BudgetHint, Conversation};
use crate::domain::product::Product;
use crate::signals::{KeywordGroup, MessageIntent};

/// Weights for scoring components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    /// Weight for the current-request match (default: 0.40)
    pub current_request: f64,
    /// Weight for remembered preferences (default: 0.20)
    pub historical_preference: f64,
    /// Weight for remembered moods (default: 0.15)
    pub mood: f64,
    /// Weight for dietary compatibility (default: 0.15)
    pub dietary_compatibility: f64,
    /// Weight for budget fit (default: 0.05)
    pub budget_fit: f64,
    /// Weight for popularity (default: 0.05)
    pub popularity: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

/// Whether `product` belongs to the food category `label`: its category names
/// the label, or its name contains one of the label's keywords.
pub fn matches_category(product: &Product, label: &str, categories: &[KeywordGroup]) -> bool {
    if product.category.to_lowercase().contains(&label.to_lowercase()) {
        return true;
    }
    let name = product.name.to_lowercase();
    categories
        .iter()
        .find(|group| group.label == label)
        .is_some_and(|group| group.keywords.iter().any(|keyword| name.contains(keyword.as_str())))
}

/// Score calculator for product recommendations
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: RankingWeights,
}

impl ScoreCalculator {
    /// Create a new score calculator with default weights
    pub fn new() -> Self {
        Self { weights: RankingWeights::default() }
    }

    /// Create with custom weights
    pub fn with_weights(weights: RankingWeights) -> Self {
        Self { weights }
    }

    /// Weighted total rounded to two decimals
    pub fn calculate_total_score(&self, scores: &ComponentScores) -> f64 {
        let total = scores.current_request * self.weights.current_request
            + scores.historical_preference * self.weights.historical_preference
            + scores.mood * self.weights.mood
            + scores.dietary_compatibility * self.weights.dietary_compatibility
            + scores.budget_fit * self.weights.budget_fit
            + scores.popularity * self.weights.popularity;

        (total * 100.0).round() / 100.0
    }

    pub fn component_scores(
        &self,
        product: &Product,
        conversation: &Conversation,
        intent: &MessageIntent,
        categories: &[KeywordGroup],
        dietary: &DietaryFilter,
    ) -> ComponentScores {
        ComponentScores {
            current_request: self.current_request_score(product, intent, categories),
            historical_preference: self.historical_preference_score(product, conversation),
            mood: self.mood_score(product, conversation),
            dietary_compatibility: self.dietary_compatibility_score(product, conversation, dietary),
            budget_fit: self.budget_fit_score(product, effective_budget(intent, conversation)),
            popularity: product.popularity(),
        }
    }

    /// +80 for a category match, +50/-30 per requested dietary tag met/unmet,
    /// +15 per requested mood; clamped to 0..=100.
    pub fn current_request_score(
        &self,
        product: &Product,
        intent: &MessageIntent,
        categories: &[KeywordGroup],
    ) -> f64 {
        let mut score = 0.0;

        if intent.categories.iter().any(|label| matches_category(product, label, categories)) {
            score += 80.0;
        }

        for dietary in &intent.dietary {
            if product.has_dietary_tag(dietary) {
                score += 50.0;
            } else {
                score -= 30.0;
            }
        }

        let mood_matches = intent.moods.iter().filter(|mood| product.has_mood_tag(mood)).count();
        score += 15.0 * mood_matches as f64;

        f64::clamp(score, 0.0, 100.0)
    }

    pub fn historical_preference_score(
        &self,
        product: &Product,
        conversation: &Conversation,
    ) -> f64 {
        let matches = conversation
            .preferences
            .iter()
            .filter(|pref| preference_matches(product, pref))
            .count();

        (20.0 * matches as f64).min(100.0)
    }

    pub fn mood_score(&self, product: &Product, conversation: &Conversation) -> f64 {
        let product_moods: BTreeSet<&str> = product.mood_tags.iter().map(String::as_str).collect();
        let shared = conversation
            .mood_tags
            .iter()
            .filter(|mood| product_moods.contains(mood.as_str()))
            .count();

        (30.0 * shared as f64).min(100.0)
    }

    /// Remembered restrictions only. An allergen hit or an untagged exclusion
    /// term zeroes the score.
    pub fn dietary_compatibility_score(
        &self,
        product: &Product,
        conversation: &Conversation,
        dietary: &DietaryFilter,
    ) -> f64 {
        let violated = conversation.dietary_restrictions.iter().any(|restriction| {
            product.has_allergen(restriction) || dietary.text_excludes(product, restriction)
        });

        if violated {
            0.0
        } else {
            100.0
        }
    }

    pub fn budget_fit_score(&self, product: &Product, budget: Option<BudgetHint>) -> f64 {
        match budget {
            None => 100.0,
            Some(BudgetHint::Under(cap)) if product.price <= cap => 100.0,
            Some(BudgetHint::Under(cap)) => (100.0 - (product.price - cap) * 10.0).max(0.0),
            Some(BudgetHint::Around(target)) => {
                (100.0 - (product.price - target).abs() * 5.0).max(0.0)
            }
        }
    }

    /// Up to three reasons in fixed priority order.
    pub fn generate_reasons(
        &self,
        product: &Product,
        conversation: &Conversation,
        intent: &MessageIntent,
    ) -> Vec<String> {
        let mut reasons = Vec::new();
        let category = product.category.to_lowercase();

        if let Some(label) =
            intent.categories.iter().find(|label| category.contains(&label.to_lowercase()))
        {
            reasons.push(format!("Perfect {label} match for your request"));
        }

        for dietary in intent.dietary.iter().filter(|dietary| product.has_dietary_tag(dietary)) {
            reasons.push(format!("✅ Meets your {dietary} requirements"));
        }

        for mood in intent.moods.iter().filter(|mood| product.has_mood_tag(mood)) {
            reasons.push(format!("Great for a {mood} meal"));
        }

        let name = product.name.to_lowercase();
        let description = product.description.to_lowercase();
        if let Some(pref) = conversation.preferences.iter().find(|pref| {
            let pref = pref.to_lowercase();
            name.contains(&pref) || description.contains(&pref)
        }) {
            reasons.push(format!("Matches your preference for {pref}"));
        }

        if let Some(BudgetHint::Under(cap)) = effective_budget(intent, conversation) {
            if product.price <= cap {
                reasons.push(format!("Within your ${cap} budget"));
            }
        }

        if product.chef_special {
            reasons.push("Chef's special recommendation".to_string());
        }
        if product.limited_time {
            reasons.push("Limited time offer".to_string());
        }
        if product.popularity_score.is_some_and(|score| score > HIGH_POPULARITY) {
            reasons.push("Highly popular choice".to_string());
        }

        reasons.truncate(MAX_REASONS);
        reasons
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// The message's own budget wins over the remembered one.
pub fn effective_budget(intent: &MessageIntent, conversation: &Conversation) -> Option<BudgetHint> {
    intent.budget.or(conversation.budget_hint)
}

fn preference_matches(product: &Product, pref: &str) -> bool {
    let lowered = pref.to_lowercase();
    product.name.to_lowercase().contains(&lowered)
        || product.description.to_lowercase().contains(&lowered)
        || product.dietary_tags.iter().any(|tag| tag == pref)
        || product.mood_tags.iter().any(|tag| tag == pref)
}

//! Product Recommendation Engine
//!
//! Ranks dietary-compliant menu items against the current message and the
//! remembered conversation state, explains each pick, and falls back to
//! popular items when the ranking comes back weak.

mod dietary;
mod engine;
mod fallback;
mod scoring;
mod types;

pub use dietary::{filter_dietary, DietaryFilter, DietaryRule};
pub use engine::Recommender;
pub use fallback::{needs_fallback, popular_in_category};
pub use scoring::{effective_budget, matches_category, RankingWeights, ScoreCalculator};
pub use types::*;

/// Default scoring weights
pub const DEFAULT_WEIGHTS: RankingWeights = RankingWeights {
    current_request: 0.40,
    historical_preference: 0.20,
    mood: 0.15,
    dietary_compatibility: 0.15,
    budget_fit: 0.05,
    popularity: 0.05,
};

/// Added to every primary score while any dietary restriction is active
pub const DIETARY_COMPLIANCE_BONUS: f64 = 20.0;

/// Primary rankings whose every score is below this are replaced
pub const FALLBACK_SCORE_FLOOR: f64 = 30.0;

/// Added to popularity for fallback entries
pub const FALLBACK_POPULARITY_BONUS: f64 = 20.0;

/// Maximum reasons attached to one recommendation
pub const MAX_REASONS: usize = 3;

/// Popularity above this earns the "Highly popular choice" reason
pub const HIGH_POPULARITY: u8 = 80;

/// Recommendations returned when the caller does not ask for a count
pub const DEFAULT_LIMIT: usize = 3;

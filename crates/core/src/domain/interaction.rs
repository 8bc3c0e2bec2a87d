use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::conversation::ConversationId;
use crate::domain::product::ProductId;
use crate::pipeline::MessageOutcome;
use crate::recommend::RankedRecommendation;

/// One processed message and what it did to the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionLog {
    pub id: String,
    pub conversation_id: ConversationId,
    pub message: String,
    pub score_delta: i32,
    pub interest_score: u8,
    pub engagement_factors: Vec<String>,
    pub recommended_product_ids: Vec<ProductId>,
    pub recorded_at: DateTime<Utc>,
}

impl InteractionLog {
    pub fn from_outcome(message: &str, outcome: &MessageOutcome) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: outcome.conversation.id.clone(),
            message: message.to_string(),
            score_delta: outcome.score_delta,
            interest_score: outcome.conversation.interest_score,
            engagement_factors: outcome.engagement_factors.clone(),
            recommended_product_ids: outcome.recommendations.product_ids(),
            recorded_at: outcome.conversation.last_interaction,
        }
    }
}

/// A product shown to a conversation, recorded once per pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEvent {
    pub id: String,
    pub conversation_id: ConversationId,
    pub product_id: ProductId,
    pub recommendation_score: f64,
    pub reason_text: String,
    pub clicked: bool,
    pub ordered: bool,
    pub recommended_at: DateTime<Utc>,
}

impl RecommendationEvent {
    pub fn shown(
        conversation_id: &ConversationId,
        recommendation: &RankedRecommendation,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.clone(),
            product_id: recommendation.product_id.clone(),
            recommendation_score: recommendation.recommendation_score,
            reason_text: recommendation.reason_text(),
            clicked: false,
            ordered: false,
            recommended_at: at,
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (self.conversation_id.0.as_str(), self.product_id.0.as_str())
    }
}

/// Follow-up action on a shown recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Clicked,
    /// Ordering implies the product was clicked.
    Ordered,
}

//! Message processing as a pure transition over conversation state.
//!
//! `apply_message` never touches shared state: it takes a conversation
//! snapshot and returns the updated one, so callers decide how updates to a
//! given conversation are serialised and persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::conversation::Conversation;
use crate::domain::product::Product;
use crate::interest::{InterestScoreEngine, ScoreUpdate};
use crate::preferences::{self, ExtractedPreferences};
use crate::recommend::{RankingContext, RecommendationResult, Recommender};
use crate::signals::{MessageIntent, SignalDetector};

/// Interest score a conversation must exceed before recommendations run.
pub const DEFAULT_ACTIVATION_THRESHOLD: u8 = 30;

/// What one message did to the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngagementAudit {
    pub score_update: ScoreUpdate,
    pub extracted: ExtractedPreferences,
    pub intent: MessageIntent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageOutcome {
    pub conversation: Conversation,
    /// Post-clamp change actually applied to the score.
    pub score_delta: i32,
    pub engagement_factors: Vec<String>,
    /// Whether the score cleared the activation threshold.
    pub activated: bool,
    pub recommendations: RecommendationResult,
    pub audit: EngagementAudit,
}

#[derive(Clone, Debug)]
pub struct ConversationEngine {
    detector: SignalDetector,
    interest: InterestScoreEngine,
    recommender: Recommender,
    activation_threshold: u8,
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new(SignalDetector::default(), Recommender::default(), DEFAULT_ACTIVATION_THRESHOLD)
    }
}

impl ConversationEngine {
    pub fn new(
        detector: SignalDetector,
        recommender: Recommender,
        activation_threshold: u8,
    ) -> Self {
        Self { detector, interest: InterestScoreEngine::new(), recommender, activation_threshold }
    }

    pub fn with_activation_threshold(mut self, activation_threshold: u8) -> Self {
        self.activation_threshold = activation_threshold;
        self
    }

    pub fn activation_threshold(&self) -> u8 {
        self.activation_threshold
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    /// Score update, preference merge and bookkeeping for one message.
    pub fn apply_message(
        &self,
        mut state: Conversation,
        message: &str,
        at: DateTime<Utc>,
    ) -> (Conversation, EngagementAudit) {
        let signals = self.detector.detect(message);
        let score_update = self.interest.apply(state.interest_score, &signals);
        state.interest_score = score_update.new_score;

        let extracted = preferences::extract(self.detector.lexicon(), message);
        extracted.merge_into(&mut state);

        state.interaction_count = state.interaction_count.saturating_add(1);
        state.touch(at);

        info!(
            event_name = "engagement.scored",
            conversation_id = %state.id,
            previous_score = score_update.previous_score,
            new_score = score_update.new_score,
            raw_delta = score_update.raw_delta,
            factors = score_update.signals.len(),
            "message scored"
        );

        let intent = self.detector.intent(message);
        (state, EngagementAudit { score_update, extracted, intent })
    }

    pub fn is_activated(&self, conversation: &Conversation) -> bool {
        conversation.interest_score > self.activation_threshold
    }

    /// Full pass for one message: transition, then ranking when the updated
    /// score clears the activation threshold.
    pub fn score_and_recommend(
        &self,
        message: &str,
        conversation: Conversation,
        catalog: &[Product],
        limit: usize,
    ) -> MessageOutcome {
        let (conversation, audit) = self.apply_message(conversation, message, Utc::now());
        let activated = self.is_activated(&conversation);

        let recommendations = if activated {
            self.recommender.recommend(
                catalog,
                RankingContext { conversation: &conversation, intent: &audit.intent, limit },
            )
        } else {
            RecommendationResult::empty()
        };

        MessageOutcome {
            score_delta: audit.score_update.applied_delta,
            engagement_factors: audit.score_update.factor_descriptions(),
            activated,
            recommendations,
            conversation,
            audit,
        }
    }
}

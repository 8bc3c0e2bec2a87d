//! Interest score accumulator.
//!
//! Every triggered engagement factor contributes its fixed weight once,
//! whatever the number of matching keywords. The summed delta is applied to the
//! conversation score and the result clamped to `0..=100`.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::MAX_INTEREST_SCORE;
use crate::signals::SignalSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementFactor {
    SpecificPreferences,
    DietaryRestrictions,
    BudgetMention,
    MoodIndication,
    QuestionAsking,
    Enthusiasm,
    PriceInquiry,
    OrderIntent,
    Hesitation,
    BudgetConcern,
    /// Reserved: no detector raises it yet.
    DietaryConflict,
    Rejection,
    /// Reserved: no detector raises it yet.
    DelayedResponse,
}

impl EngagementFactor {
    pub fn weight(&self) -> i32 {
        match self {
            Self::SpecificPreferences => 15,
            Self::DietaryRestrictions => 10,
            Self::BudgetMention => 5,
            Self::MoodIndication => 20,
            Self::QuestionAsking => 10,
            Self::Enthusiasm => 8,
            Self::PriceInquiry => 25,
            Self::OrderIntent => 30,
            Self::Hesitation => -10,
            Self::BudgetConcern => -15,
            Self::DietaryConflict => -20,
            Self::Rejection => -25,
            Self::DelayedResponse => -5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecificPreferences => "specific_preferences",
            Self::DietaryRestrictions => "dietary_restrictions",
            Self::BudgetMention => "budget_mention",
            Self::MoodIndication => "mood_indication",
            Self::QuestionAsking => "question_asking",
            Self::Enthusiasm => "enthusiasm_words",
            Self::PriceInquiry => "price_inquiry",
            Self::OrderIntent => "order_intent",
            Self::Hesitation => "hesitation",
            Self::BudgetConcern => "budget_concern",
            Self::DietaryConflict => "dietary_conflict",
            Self::Rejection => "rejection",
            Self::DelayedResponse => "delay_response",
        }
    }
}

/// One triggered factor with its weight and display text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSignal {
    pub factor: EngagementFactor,
    pub delta: i32,
    pub description: String,
}

impl EngagementSignal {
    fn new(factor: EngagementFactor, description: impl Into<String>) -> Self {
        Self { factor, delta: factor.weight(), description: description.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub previous_score: u8,
    pub new_score: u8,
    /// Sum of triggered weights before clamping.
    pub raw_delta: i32,
    /// `new_score - previous_score`.
    pub applied_delta: i32,
    pub signals: Vec<EngagementSignal>,
}

impl ScoreUpdate {
    pub fn factor_descriptions(&self) -> Vec<String> {
        self.signals.iter().map(|signal| signal.description.clone()).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct InterestScoreEngine;

impl InterestScoreEngine {
    pub fn new() -> Self {
        Self
    }

    /// Triggered factors in a fixed order: positive factors first, then
    /// negative ones.
    pub fn engagement_signals(&self, signals: &SignalSet) -> Vec<EngagementSignal> {
        use EngagementFactor::*;

        let candidates: [(bool, EngagementFactor, String); 11] = [
            (
                signals.specific_preferences > 0,
                SpecificPreferences,
                format!(
                    "Specific preferences mentioned ({} detected)",
                    signals.specific_preferences
                ),
            ),
            (
                signals.dietary_mention,
                DietaryRestrictions,
                "Dietary restrictions mentioned".to_string(),
            ),
            (signals.budget_mention, BudgetMention, "Budget mentioned".to_string()),
            (signals.mood, MoodIndication, "Mood/feeling indicated".to_string()),
            (signals.question, QuestionAsking, "Question asked".to_string()),
            (
                signals.enthusiasm > 0,
                Enthusiasm,
                format!("Enthusiasm detected ({} positive words)", signals.enthusiasm),
            ),
            (signals.price_inquiry, PriceInquiry, "Price inquiry detected".to_string()),
            (signals.order_intent, OrderIntent, "Order intent detected".to_string()),
            (signals.hesitation, Hesitation, "Hesitation detected (-10)".to_string()),
            (signals.budget_concern, BudgetConcern, "Budget concern detected (-15)".to_string()),
            (signals.rejection, Rejection, "Rejection detected (-25)".to_string()),
        ];

        let triggered: Vec<EngagementSignal> = candidates
            .into_iter()
            .filter(|(fired, _, _)| *fired)
            .map(|(_, factor, description)| EngagementSignal::new(factor, description))
            .collect();

        triggered
    }

    pub fn raw_delta(&self, signals: &SignalSet) -> i32 {
        self.engagement_signals(signals).iter().map(|signal| signal.delta).sum()
    }

    pub fn apply(&self, current_score: u8, signals: &SignalSet) -> ScoreUpdate {
        let triggered = self.engagement_signals(signals);
        let raw_delta: i32 = triggered.iter().map(|signal| signal.delta).sum();
        let previous = i32::from(current_score.min(MAX_INTEREST_SCORE));
        let clamped = (previous + raw_delta).clamp(0, i32::from(MAX_INTEREST_SCORE));
        let new_score = u8::try_from(clamped).unwrap_or(MAX_INTEREST_SCORE);

        ScoreUpdate {
            previous_score: current_score,
            new_score,
            raw_delta,
            applied_delta: i32::from(new_score) - i32::from(current_score),
            signals: triggered,
        }
    }
}

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

pub const MAX_INTEREST_SCORE: u8 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Spending limit stated by the user, either a hard cap or a target price.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum BudgetHint {
    Under(f64),
    Around(f64),
}

impl BudgetHint {
    pub fn amount(&self) -> f64 {
        match self {
            Self::Under(amount) | Self::Around(amount) => *amount,
        }
    }

    /// Whether `price` survives budget narrowing: at or below the cap, or
    /// within 20% of the target.
    pub fn admits(&self, price: f64) -> bool {
        match self {
            Self::Under(cap) => price <= *cap,
            Self::Around(target) => (target * 0.8..=target * 1.2).contains(&price),
        }
    }
}

impl fmt::Display for BudgetHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Under(amount) => write!(f, "under ${amount}"),
            Self::Around(amount) => write!(f, "around ${amount}"),
        }
    }
}

/// Accumulated state of one ordering session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub interest_score: u8,
    pub preferences: BTreeSet<String>,
    pub dietary_restrictions: BTreeSet<String>,
    pub mood_tags: BTreeSet<String>,
    pub budget_hint: Option<BudgetHint>,
    pub interaction_count: u32,
    pub started_at: DateTime<Utc>,
    pub last_interaction: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            id,
            interest_score: 0,
            preferences: BTreeSet::new(),
            dietary_restrictions: BTreeSet::new(),
            mood_tags: BTreeSet::new(),
            budget_hint: None,
            interaction_count: 0,
            started_at: now,
            last_interaction: now,
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_interaction = at;
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.interest_score > MAX_INTEREST_SCORE {
            return Err(DomainError::InterestScoreOutOfRange(self.interest_score));
        }
        Ok(())
    }
}

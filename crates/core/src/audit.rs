use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::conversation::ConversationId;
use crate::interest::ScoreUpdate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Engagement,
    Recommendation,
    Persistence,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub conversation_id: Option<ConversationId>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        conversation_id: Option<ConversationId>,
        correlation_id: impl Into<String>,
        event_type: impl Into<String>,
        category: AuditCategory,
        actor: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            conversation_id,
            correlation_id: correlation_id.into(),
            event_type: event_type.into(),
            category,
            actor: actor.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// One `engagement.scored` event carrying every triggered factor and its
    /// weight, plus the score before and after.
    pub fn engagement_scored(
        conversation_id: &ConversationId,
        correlation_id: impl Into<String>,
        update: &ScoreUpdate,
    ) -> Self {
        let mut event = Self::new(
            Some(conversation_id.clone()),
            correlation_id,
            "engagement.scored",
            AuditCategory::Engagement,
            "interest-engine",
            AuditOutcome::Success,
        )
        .with_metadata("previous_score", update.previous_score.to_string())
        .with_metadata("new_score", update.new_score.to_string())
        .with_metadata("raw_delta", update.raw_delta.to_string())
        .with_metadata("applied_delta", update.applied_delta.to_string());

        for signal in &update.signals {
            event = event.with_metadata(
                format!("factor.{}", signal.factor.as_str()),
                signal.delta.to_string(),
            );
        }
        event
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.event_type).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Writes each event as one structured `tracing` record at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let conversation_id = event.conversation_id.as_ref().map(|id| id.0.as_str());
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        info!(
            event_name = "audit.recorded",
            audit_event = %event.event_type,
            category = ?event.category,
            outcome = ?event.outcome,
            actor = %event.actor,
            conversation_id,
            correlation_id = %event.correlation_id,
            metadata = %metadata,
            "audit event"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink},
        domain::conversation::ConversationId,
        interest::InterestScoreEngine,
        signals::SignalDetector,
    };

    #[test]
    fn in_memory_sink_records_events_with_correlation_fields() {
        let sink = InMemoryAuditSink::default();
        sink.emit(
            AuditEvent::new(
                Some(ConversationId("conv-42".to_owned())),
                "req-123",
                "recommendation.ranked",
                AuditCategory::Recommendation,
                "recommender",
                AuditOutcome::Success,
            )
            .with_metadata("returned", "3"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "req-123");
        assert_eq!(events[0].conversation_id.as_ref().map(|id| id.0.as_str()), Some("conv-42"));
        assert_eq!(events[0].metadata.get("returned").map(String::as_str), Some("3"));
    }

    #[test]
    fn engagement_event_lists_each_factor_with_its_weight() {
        let signals = SignalDetector::default().detect("maybe amazing, how much?");
        let update = InterestScoreEngine::new().apply(40, &signals);
        let conversation_id = ConversationId("conv-7".to_owned());
        let event = AuditEvent::engagement_scored(&conversation_id, "req-7", &update);

        assert_eq!(event.event_type, "engagement.scored");
        assert_eq!(event.metadata.get("factor.hesitation").map(String::as_str), Some("-10"));
        assert_eq!(event.metadata.get("factor.enthusiasm_words").map(String::as_str), Some("8"));
        assert_eq!(event.metadata.get("factor.price_inquiry").map(String::as_str), Some("25"));
        assert_eq!(event.metadata.get("factor.question_asking").map(String::as_str), Some("10"));
        assert_eq!(event.metadata.get("previous_score").map(String::as_str), Some("40"));
    }
}

//! Per-conversation message handling on top of the repositories.
//!
//! Each conversation id has its own async mutex, so load, transition, rank and
//! persist for one message never interleave with another message for the same
//! conversation. Different conversations proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use tastebud_core::analytics::{build_report, AnalyticsReport};
use tastebud_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use tastebud_core::catalog::{browse, CatalogQuery};
use tastebud_core::config::{RecommendationConfig, MAX_RECOMMENDATION_LIMIT};
use tastebud_core::domain::conversation::{Conversation, ConversationId};
use tastebud_core::domain::interaction::{FeedbackKind, InteractionLog, RecommendationEvent};
use tastebud_core::domain::product::{Product, ProductId};
use tastebud_core::errors::{ApplicationError, DomainError};
use tastebud_core::pipeline::{ConversationEngine, MessageOutcome};
use tastebud_core::recommend::RecommendationResult;

use crate::repositories::{
    ConversationRepository, InMemoryConversationRepository, InMemoryProductCatalog,
    InMemoryRecommendationEventRepository, ProductCatalog, RecommendationEventRepository,
    SqlConversationRepository, SqlProductCatalog, SqlRecommendationEventRepository,
};
use crate::DbPool;

/// Collaborators the service reads from and writes to.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn ProductCatalog>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub events: Arc<dyn RecommendationEventRepository>,
}

impl Repositories {
    pub fn sqlite(pool: DbPool) -> Self {
        Self {
            catalog: Arc::new(SqlProductCatalog::new(pool.clone())),
            conversations: Arc::new(SqlConversationRepository::new(pool.clone())),
            events: Arc::new(SqlRecommendationEventRepository::new(pool)),
        }
    }

    pub fn in_memory(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            catalog: Arc::new(InMemoryProductCatalog::with_products(products)),
            conversations: Arc::new(InMemoryConversationRepository::default()),
            events: Arc::new(InMemoryRecommendationEventRepository::default()),
        }
    }
}

/// Result of one chat turn as handed back to the caller.
#[derive(Clone, Debug)]
pub struct ChatTurn {
    pub correlation_id: String,
    pub outcome: MessageOutcome,
}

pub struct ConversationService {
    engine: ConversationEngine,
    repositories: Repositories,
    audit: Arc<dyn AuditSink>,
    default_limit: usize,
    locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl ConversationService {
    pub fn new(
        engine: ConversationEngine,
        repositories: Repositories,
        audit: Arc<dyn AuditSink>,
        default_limit: usize,
    ) -> Self {
        Self {
            engine,
            repositories,
            audit,
            default_limit: default_limit.clamp(1, MAX_RECOMMENDATION_LIMIT),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(repositories: Repositories, config: &RecommendationConfig) -> Self {
        Self::new(
            ConversationEngine::default().with_activation_threshold(config.activation_threshold),
            repositories,
            Arc::new(TracingAuditSink),
            config.default_limit,
        )
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    async fn lock_for(&self, id: &ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }

    /// Drops the map entry once no other turn holds or waits on it. Handles are
    /// only cloned under the map lock, so the count cannot grow while checked.
    async fn release_lock(&self, id: &ConversationId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
    }

    /// Scores one message against the stored conversation and returns the
    /// ranked recommendations. A missing conversation is created with a zero
    /// score. Nothing is persisted unless every step up to the conversation
    /// write succeeds. Blank messages and limits outside
    /// `1..=MAX_RECOMMENDATION_LIMIT` are rejected before anything is read.
    pub async fn handle_message(
        &self,
        conversation_id: Option<ConversationId>,
        message: &str,
        limit: Option<usize>,
    ) -> Result<ChatTurn, ApplicationError> {
        if message.trim().is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }
        let limit = limit.unwrap_or(self.default_limit);
        if !(1..=MAX_RECOMMENDATION_LIMIT).contains(&limit) {
            let error = DomainError::LimitOutOfRange { limit, max: MAX_RECOMMENDATION_LIMIT };
            return Err(error.into());
        }

        let correlation_id = Uuid::new_v4().to_string();
        let conversation_id = conversation_id.unwrap_or_else(ConversationId::generate);

        let lock = self.lock_for(&conversation_id).await;
        let guard = lock.lock().await;
        let result =
            self.apply_locked(conversation_id.clone(), correlation_id, message, limit).await;
        drop(guard);
        self.release_lock(&conversation_id, lock).await;
        result
    }

    async fn apply_locked(
        &self,
        conversation_id: ConversationId,
        correlation_id: String,
        message: &str,
        limit: usize,
    ) -> Result<ChatTurn, ApplicationError> {
        let outcome = match self.run_turn(&conversation_id, message, limit).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.audit.emit(
                    AuditEvent::new(
                        Some(conversation_id.clone()),
                        correlation_id.clone(),
                        "conversation.turn_failed",
                        AuditCategory::Persistence,
                        "conversation-service",
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error.to_string()),
                );
                warn!(
                    event_name = "conversation.turn_failed",
                    conversation_id = %conversation_id,
                    correlation_id = %correlation_id,
                    error = %error,
                    "message was not applied"
                );
                return Err(error);
            }
        };

        self.audit.emit(AuditEvent::engagement_scored(
            &conversation_id,
            correlation_id.clone(),
            &outcome.audit.score_update,
        ));
        if outcome.activated {
            self.audit.emit(recommendation_audit(&conversation_id, &correlation_id, &outcome));
            self.record_recommendations(&conversation_id, &outcome.recommendations).await;
        }

        info!(
            event_name = "conversation.message_handled",
            conversation_id = %conversation_id,
            correlation_id = %correlation_id,
            interest_score = outcome.conversation.interest_score,
            activated = outcome.activated,
            recommended = outcome.recommendations.recommendations().len(),
            "message handled"
        );
        Ok(ChatTurn { correlation_id, outcome })
    }

    /// Load, score, rank and persist. Runs under the conversation lock.
    async fn run_turn(
        &self,
        conversation_id: &ConversationId,
        message: &str,
        limit: usize,
    ) -> Result<MessageOutcome, ApplicationError> {
        let conversation = self
            .repositories
            .conversations
            .find_by_id(conversation_id)
            .await?
            .unwrap_or_else(|| Conversation::new(conversation_id.clone()));
        let catalog = self.repositories.catalog.list_all().await?;

        let outcome = self.engine.score_and_recommend(message, conversation, &catalog, limit);
        outcome.conversation.validate()?;

        let log = InteractionLog::from_outcome(message, &outcome);
        self.repositories.conversations.save_turn(outcome.conversation.clone(), log).await?;
        Ok(outcome)
    }

    /// Advisory: a failing event sink never fails the turn.
    async fn record_recommendations(
        &self,
        conversation_id: &ConversationId,
        result: &RecommendationResult,
    ) {
        let now = Utc::now();
        let events: Vec<RecommendationEvent> = result
            .recommendations()
            .iter()
            .map(|recommendation| RecommendationEvent::shown(conversation_id, recommendation, now))
            .collect();
        if events.is_empty() {
            return;
        }

        if let Err(error) = self.repositories.events.append_if_absent(events).await {
            warn!(
                event_name = "recommendation.event_sink_failed",
                conversation_id = %conversation_id,
                error = %error,
                "recommendation events were not recorded"
            );
        }
    }

    pub async fn record_feedback(
        &self,
        conversation_id: &ConversationId,
        product_id: &ProductId,
        kind: FeedbackKind,
    ) -> Result<bool, ApplicationError> {
        let updated =
            self.repositories.events.record_feedback(conversation_id, product_id, kind).await?;
        info!(
            event_name = "recommendation.feedback_recorded",
            conversation_id = %conversation_id,
            product_id = %product_id,
            kind = ?kind,
            updated,
            "recommendation feedback recorded"
        );
        Ok(updated)
    }

    pub async fn browse(&self, query: &CatalogQuery) -> Result<Vec<Product>, ApplicationError> {
        let catalog = self.repositories.catalog.list_all().await?;
        Ok(browse(&catalog, query, self.engine.recommender().dietary()))
    }

    pub async fn conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Conversation>, ApplicationError> {
        Ok(self.repositories.conversations.find_by_id(conversation_id).await?)
    }

    pub async fn history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<InteractionLog>, ApplicationError> {
        Ok(self.repositories.conversations.list_interactions(conversation_id).await?)
    }

    /// Aggregates everything stored so far into one report.
    pub async fn analytics(&self) -> Result<AnalyticsReport, ApplicationError> {
        let conversations = self.repositories.conversations.list_all().await?;
        let interactions = self.repositories.conversations.list_all_interactions().await?;
        let products = self.repositories.catalog.list_all().await?;
        let events = self.repositories.events.list_all().await?;

        let report = build_report(&conversations, &interactions, &products, &events, Utc::now());
        info!(
            event_name = "analytics.report_built",
            conversations = report.conversations.total_conversations,
            interactions = report.conversations.total_interactions,
            recommendations_shown = report.recommendations.shown_count,
            "analytics report built"
        );
        Ok(report)
    }
}

fn recommendation_audit(
    conversation_id: &ConversationId,
    correlation_id: &str,
    outcome: &MessageOutcome,
) -> AuditEvent {
    let result = &outcome.recommendations;
    let (event_type, audit_outcome) = if result.is_no_suitable_products() {
        ("recommendation.no_suitable_products", AuditOutcome::Rejected)
    } else {
        ("recommendation.ranked", AuditOutcome::Success)
    };

    let product_ids: Vec<String> = result.product_ids().into_iter().map(|id| id.0).collect();
    AuditEvent::new(
        Some(conversation_id.clone()),
        correlation_id,
        event_type,
        AuditCategory::Recommendation,
        "recommender",
        audit_outcome,
    )
    .with_metadata("returned", product_ids.len().to_string())
    .with_metadata("product_ids", product_ids.join(","))
    .with_metadata("fallback_applied", result.fallback_applied().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use tastebud_core::audit::{AuditOutcome, InMemoryAuditSink};
    use tastebud_core::catalog::CatalogQuery;
    use tastebud_core::config::RecommendationConfig;
    use tastebud_core::domain::conversation::ConversationId;
    use tastebud_core::domain::interaction::{FeedbackKind, RecommendationEvent};
    use tastebud_core::domain::product::{Product, ProductId};
    use tastebud_core::errors::{ApplicationError, DomainError};

    use super::{ConversationService, Repositories};
    use crate::fixtures::demo_catalog;
    use crate::repositories::{
        migrated_pool, InMemoryConversationRepository, ProductCatalog,
        RecommendationEventRepository, RepositoryError,
    };

    const ENGAGED: &str = "I'm craving something spicy and adventurous, I love korean chicken!";

    fn config() -> RecommendationConfig {
        RecommendationConfig { activation_threshold: 30, default_limit: 3 }
    }

    struct OfflineCatalog;

    #[async_trait]
    impl ProductCatalog for OfflineCatalog {
        async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
            Err(RepositoryError::Unavailable("catalog offline".to_string()))
        }

        async fn find_by_id(&self, _id: &ProductId) -> Result<Option<Product>, RepositoryError> {
            Err(RepositoryError::Unavailable("catalog offline".to_string()))
        }

        async fn save(&self, _product: Product) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("catalog offline".to_string()))
        }
    }

    struct BrokenEventSink;

    #[async_trait]
    impl RecommendationEventRepository for BrokenEventSink {
        async fn append_if_absent(
            &self,
            _events: Vec<RecommendationEvent>,
        ) -> Result<usize, RepositoryError> {
            Err(RepositoryError::Unavailable("event sink down".to_string()))
        }

        async fn record_feedback(
            &self,
            _conversation_id: &ConversationId,
            _product_id: &ProductId,
            _kind: FeedbackKind,
        ) -> Result<bool, RepositoryError> {
            Err(RepositoryError::Unavailable("event sink down".to_string()))
        }

        async fn list_for_conversation(
            &self,
            _conversation_id: &ConversationId,
        ) -> Result<Vec<RecommendationEvent>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn list_all(&self) -> Result<Vec<RecommendationEvent>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn engaged_message_is_scored_ranked_and_persisted() {
        let repositories = Repositories::sqlite(migrated_pool().await);
        for product in demo_catalog() {
            repositories.catalog.save(product).await.expect("seed");
        }
        let audit = InMemoryAuditSink::default();
        let service = ConversationService::from_config(repositories.clone(), &config())
            .with_audit_sink(Arc::new(audit.clone()));
        let id = ConversationId("conv-svc".to_string());

        let turn = service.handle_message(Some(id.clone()), ENGAGED, None).await.expect("turn");

        assert!(turn.outcome.activated);
        let ranked = turn.outcome.recommendations.recommendations();
        assert!(!ranked.is_empty() && ranked.len() <= 3);
        assert_eq!(ranked[0].product_id.0, "FC001");

        let stored = service.conversation(&id).await.expect("load").expect("persisted");
        assert_eq!(stored, turn.outcome.conversation);
        assert_eq!(service.history(&id).await.expect("history").len(), 1);

        let events = repositories.events.list_for_conversation(&id).await.expect("events");
        assert_eq!(events.len(), ranked.len());

        let types = audit.event_types();
        assert_eq!(types, vec!["engagement.scored", "recommendation.ranked"]);
        assert!(audit.events().iter().all(|event| event.correlation_id == turn.correlation_id));
    }

    #[tokio::test]
    async fn repeated_recommendations_are_recorded_once() {
        let repositories = Repositories::in_memory(demo_catalog());
        let service = ConversationService::from_config(repositories.clone(), &config());
        let id = ConversationId("conv-repeat".to_string());

        let first = service.handle_message(Some(id.clone()), ENGAGED, None).await.expect("first");
        service.handle_message(Some(id.clone()), ENGAGED, None).await.expect("second");

        let events = repositories.events.list_for_conversation(&id).await.expect("events");
        assert_eq!(events.len(), first.outcome.recommendations.recommendations().len());
        assert_eq!(service.history(&id).await.expect("history").len(), 2);
    }

    #[tokio::test]
    async fn catalog_failure_leaves_conversation_untouched() {
        let conversations = Arc::new(InMemoryConversationRepository::default());
        let mut repositories = Repositories::in_memory(Vec::new());
        repositories.catalog = Arc::new(OfflineCatalog);
        repositories.conversations = conversations;
        let audit = InMemoryAuditSink::default();
        let service = ConversationService::from_config(repositories, &config())
            .with_audit_sink(Arc::new(audit.clone()));
        let id = ConversationId("conv-offline".to_string());

        let error = service.handle_message(Some(id.clone()), ENGAGED, None).await.unwrap_err();

        assert!(matches!(error, ApplicationError::Persistence(_)));
        assert_eq!(service.conversation(&id).await.expect("load"), None);
        assert!(service.history(&id).await.expect("history").is_empty());

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "conversation.turn_failed");
        assert_eq!(events[0].outcome, AuditOutcome::Failed);
    }

    #[tokio::test]
    async fn event_sink_failure_does_not_fail_the_turn() {
        let mut repositories = Repositories::in_memory(demo_catalog());
        repositories.events = Arc::new(BrokenEventSink);
        let service = ConversationService::from_config(repositories, &config());

        let turn = service.handle_message(None, ENGAGED, Some(2)).await.expect("turn");

        assert!(turn.outcome.activated);
        assert_eq!(turn.outcome.recommendations.recommendations().len(), 2);
        let stored = service
            .conversation(&turn.outcome.conversation.id)
            .await
            .expect("load")
            .expect("persisted");
        assert_eq!(stored.interaction_count, 1);
    }

    #[tokio::test]
    async fn concurrent_messages_for_one_conversation_are_serialised() {
        let service = Arc::new(ConversationService::from_config(
            Repositories::in_memory(demo_catalog()),
            &config(),
        ));
        let id = ConversationId("conv-race".to_string());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                service.handle_message(Some(id), "any vegetarian options?", None).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("turn");
        }

        let stored = service.conversation(&id).await.expect("load").expect("persisted");
        assert_eq!(stored.interaction_count, 8);
        assert_eq!(service.history(&id).await.expect("history").len(), 8);
    }

    #[tokio::test]
    async fn finished_turns_release_their_conversation_locks() {
        let service = Arc::new(ConversationService::from_config(
            Repositories::in_memory(demo_catalog()),
            &config(),
        ));

        for _ in 0..50 {
            service.handle_message(None, "hello", None).await.expect("turn");
        }
        let id = ConversationId("conv-shared".to_string());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = Arc::clone(&service);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                service.handle_message(Some(id), "pizza please", None).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("turn");
        }
        let mut offline = Repositories::in_memory(Vec::new());
        offline.catalog = Arc::new(OfflineCatalog);
        let failing = ConversationService::from_config(offline, &config());
        failing.handle_message(None, ENGAGED, None).await.unwrap_err();

        assert!(service.locks.lock().await.is_empty());
        assert!(failing.locks.lock().await.is_empty());
        let stored = service.conversation(&id).await.expect("load").expect("persisted");
        assert_eq!(stored.interaction_count, 4);
    }

    #[tokio::test]
    async fn feedback_marks_shown_products_only() {
        let service =
            ConversationService::from_config(Repositories::in_memory(demo_catalog()), &config());
        let turn = service.handle_message(None, ENGAGED, None).await.expect("turn");
        let id = turn.outcome.conversation.id.clone();
        let shown = turn.outcome.recommendations.product_ids()[0].clone();

        let marked =
            service.record_feedback(&id, &shown, FeedbackKind::Ordered).await.expect("feedback");
        let unknown = service
            .record_feedback(&id, &ProductId("NOPE".to_string()), FeedbackKind::Clicked)
            .await
            .expect("feedback");

        assert!(marked);
        assert!(!unknown);
    }

    #[tokio::test]
    async fn analytics_reflect_turns_and_feedback() {
        let service =
            ConversationService::from_config(Repositories::in_memory(demo_catalog()), &config());
        let turn = service.handle_message(None, ENGAGED, None).await.expect("engaged turn");
        service.handle_message(None, "hello", None).await.expect("quiet turn");
        let id = turn.outcome.conversation.id.clone();
        let shown = turn.outcome.recommendations.product_ids();
        service.record_feedback(&id, &shown[0], FeedbackKind::Ordered).await.expect("feedback");

        let report = service.analytics().await.expect("report");

        assert_eq!(report.conversations.total_conversations, 2);
        assert_eq!(report.conversations.total_interactions, 2);
        assert_eq!(report.interest_scores.positive_changes, 1);
        assert_eq!(report.interest_scores.neutral_changes, 1);
        assert_eq!(report.products.total_products, demo_catalog().len());
        assert_eq!(report.recommendations.shown_count, shown.len());
        assert_eq!(report.recommendations.ordered_count, 1);
        assert_eq!(report.recommendations.clicked_count, 1);
        let top = report
            .products
            .most_recommended
            .iter()
            .find(|entry| entry.product_id == shown[0])
            .expect("ordered product is listed");
        assert_eq!(top.uptake.order_rate, 1.0);
    }

    #[tokio::test]
    async fn analytics_surface_store_failures() {
        let mut repositories = Repositories::in_memory(Vec::new());
        repositories.catalog = Arc::new(OfflineCatalog);
        let service = ConversationService::from_config(repositories, &config());

        let error = service.analytics().await.unwrap_err();

        assert!(matches!(error, ApplicationError::Persistence(_)));
    }

    #[tokio::test]
    async fn browse_applies_strict_dietary_filter() {
        let service =
            ConversationService::from_config(Repositories::in_memory(demo_catalog()), &config());
        let query = CatalogQuery::default().with_dietary(vec!["vegan".to_string()]);

        let found = service.browse(&query).await.expect("browse");

        assert!(!found.is_empty());
        assert!(found.iter().all(|product| product.has_dietary_tag("vegan")));
    }

    #[tokio::test]
    async fn blank_messages_and_oversized_limits_are_rejected_untouched() {
        let repositories = Repositories::in_memory(demo_catalog());
        let service = ConversationService::from_config(repositories.clone(), &config());
        let id = ConversationId("conv-invalid".to_string());

        let blank = service.handle_message(Some(id.clone()), "   ", None).await.unwrap_err();
        let oversized =
            service.handle_message(Some(id.clone()), ENGAGED, Some(21)).await.unwrap_err();

        assert_eq!(blank, ApplicationError::Domain(DomainError::EmptyMessage));
        assert_eq!(
            oversized,
            ApplicationError::Domain(DomainError::LimitOutOfRange { limit: 21, max: 20 })
        );
        assert!(service.conversation(&id).await.expect("load").is_none());
    }
}

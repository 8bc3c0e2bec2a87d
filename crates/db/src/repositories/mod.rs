use async_trait::async_trait;
use thiserror::Error;

use tastebud_core::domain::conversation::{Conversation, ConversationId};
use tastebud_core::domain::interaction::{FeedbackKind, InteractionLog, RecommendationEvent};
use tastebud_core::domain::product::{Product, ProductId};
use tastebud_core::errors::{ApplicationError, DomainError};

pub mod conversation;
pub mod memory;
pub mod product;
pub mod recommendation_event;

pub use conversation::SqlConversationRepository;
pub use memory::{
    InMemoryConversationRepository, InMemoryProductCatalog, InMemoryRecommendationEventRepository,
};
pub use product::SqlProductCatalog;
pub use recommendation_event::SqlRecommendationEventRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("rejected write: {0}")]
    Rejected(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Rejected(error) => ApplicationError::Domain(error),
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

pub(crate) fn decode_error(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

/// List columns are stored as JSON text.
pub(crate) fn encode_list<T: serde::Serialize>(values: &[T]) -> Result<String, RepositoryError> {
    serde_json::to_string(values).map_err(decode_error)
}

pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(
    raw: &str,
) -> Result<Vec<T>, RepositoryError> {
    serde_json::from_str(raw).map_err(decode_error)
}

pub(crate) fn decode_timestamp(
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&chrono::Utc))
        .map_err(decode_error)
}

pub(crate) fn decode_u8(value: i64, column: &str) -> Result<u8, RepositoryError> {
    u8::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("{column} value {value} is out of range")))
}

#[cfg(test)]
pub(crate) async fn migrated_pool() -> crate::DbPool {
    let pool = crate::connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    crate::migrations::run_pending(&pool).await.expect("run migrations");
    pool
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, id: &ConversationId)
        -> Result<Option<Conversation>, RepositoryError>;
    async fn save(&self, conversation: Conversation) -> Result<(), RepositoryError>;

    /// Persists the updated conversation together with the log entry for the
    /// message that produced it. Either both are stored or neither is.
    async fn save_turn(
        &self,
        conversation: Conversation,
        log: InteractionLog,
    ) -> Result<(), RepositoryError>;

    async fn list_interactions(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<InteractionLog>, RepositoryError>;

    /// Every stored conversation, ordered by id.
    async fn list_all(&self) -> Result<Vec<Conversation>, RepositoryError>;

    /// Every logged message across conversations, in recording order.
    async fn list_all_interactions(&self) -> Result<Vec<InteractionLog>, RepositoryError>;
}

#[async_trait]
pub trait RecommendationEventRepository: Send + Sync {
    /// Stores events whose (conversation, product) pair has not been seen yet.
    /// Returns how many were new.
    async fn append_if_absent(
        &self,
        events: Vec<RecommendationEvent>,
    ) -> Result<usize, RepositoryError>;

    /// Returns `false` when the pair was never recommended.
    async fn record_feedback(
        &self,
        conversation_id: &ConversationId,
        product_id: &ProductId,
        kind: FeedbackKind,
    ) -> Result<bool, RepositoryError>;

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<RecommendationEvent>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<RecommendationEvent>, RepositoryError>;
}

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use tastebud_core::domain::conversation::ConversationId;
use tastebud_core::domain::interaction::{FeedbackKind, RecommendationEvent};
use tastebud_core::domain::product::ProductId;

use super::{decode_error, decode_timestamp, RecommendationEventRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRecommendationEventRepository {
    pool: DbPool,
}

impl SqlRecommendationEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &SqliteRow) -> Result<RecommendationEvent, RepositoryError> {
    let conversation_id: String = row.try_get("conversation_id").map_err(decode_error)?;
    let product_id: String = row.try_get("product_id").map_err(decode_error)?;
    let recommended_at: String = row.try_get("recommended_at").map_err(decode_error)?;

    Ok(RecommendationEvent {
        id: row.try_get("id").map_err(decode_error)?,
        conversation_id: ConversationId(conversation_id),
        product_id: ProductId(product_id),
        recommendation_score: row.try_get("recommendation_score").map_err(decode_error)?,
        reason_text: row.try_get("reason_text").map_err(decode_error)?,
        clicked: row.try_get("clicked").map_err(decode_error)?,
        ordered: row.try_get("ordered").map_err(decode_error)?,
        recommended_at: decode_timestamp(&recommended_at)?,
    })
}

#[async_trait::async_trait]
impl RecommendationEventRepository for SqlRecommendationEventRepository {
    async fn append_if_absent(
        &self,
        events: Vec<RecommendationEvent>,
    ) -> Result<usize, RepositoryError> {
        let mut inserted = 0;
        for event in &events {
            let result = sqlx::query(
                "INSERT INTO recommendation_events
                    (id, conversation_id, product_id, recommendation_score, reason_text,
                     clicked, ordered, recommended_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(conversation_id, product_id) DO NOTHING",
            )
            .bind(&event.id)
            .bind(&event.conversation_id.0)
            .bind(&event.product_id.0)
            .bind(event.recommendation_score)
            .bind(&event.reason_text)
            .bind(event.clicked)
            .bind(event.ordered)
            .bind(event.recommended_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        Ok(inserted)
    }

    async fn record_feedback(
        &self,
        conversation_id: &ConversationId,
        product_id: &ProductId,
        kind: FeedbackKind,
    ) -> Result<bool, RepositoryError> {
        let statement = match kind {
            FeedbackKind::Clicked => {
                "UPDATE recommendation_events SET clicked = 1
                 WHERE conversation_id = ? AND product_id = ?"
            }
            FeedbackKind::Ordered => {
                "UPDATE recommendation_events SET clicked = 1, ordered = 1
                 WHERE conversation_id = ? AND product_id = ?"
            }
        };
        let result = sqlx::query(statement)
            .bind(&conversation_id.0)
            .bind(&product_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<RecommendationEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, product_id, recommendation_score, reason_text,
                    clicked, ordered, recommended_at
             FROM recommendation_events
             WHERE conversation_id = ?
             ORDER BY recommended_at ASC, rowid ASC",
        )
        .bind(&conversation_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event).collect()
    }

    async fn list_all(&self) -> Result<Vec<RecommendationEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, product_id, recommendation_score, reason_text,
                    clicked, ordered, recommended_at
             FROM recommendation_events
             ORDER BY recommended_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event).collect()
    }
}

use std::collections::BTreeSet;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};

use tastebud_core::domain::conversation::{BudgetHint, Conversation, ConversationId};
use tastebud_core::domain::interaction::InteractionLog;
use tastebud_core::domain::product::ProductId;

use super::{
    decode_error, decode_list, decode_timestamp, decode_u8, encode_list, ConversationRepository,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_set(raw: &str) -> Result<BTreeSet<String>, RepositoryError> {
    Ok(decode_list::<String>(raw)?.into_iter().collect())
}

fn encode_set(values: &BTreeSet<String>) -> Result<String, RepositoryError> {
    encode_list(&values.iter().collect::<Vec<_>>())
}

fn row_to_conversation(row: &SqliteRow) -> Result<Conversation, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let interest_score: i64 = row.try_get("interest_score").map_err(decode_error)?;
    let preferences: String = row.try_get("preferences_json").map_err(decode_error)?;
    let dietary: String = row.try_get("dietary_restrictions_json").map_err(decode_error)?;
    let moods: String = row.try_get("mood_tags_json").map_err(decode_error)?;
    let budget_hint: Option<String> = row.try_get("budget_hint_json").map_err(decode_error)?;
    let interaction_count: i64 = row.try_get("interaction_count").map_err(decode_error)?;
    let started_at: String = row.try_get("started_at").map_err(decode_error)?;
    let last_interaction: String = row.try_get("last_interaction").map_err(decode_error)?;

    let budget_hint = budget_hint
        .map(|raw| serde_json::from_str::<BudgetHint>(&raw).map_err(decode_error))
        .transpose()?;

    Ok(Conversation {
        id: ConversationId(id),
        interest_score: decode_u8(interest_score, "interest_score")?,
        preferences: decode_set(&preferences)?,
        dietary_restrictions: decode_set(&dietary)?,
        mood_tags: decode_set(&moods)?,
        budget_hint,
        interaction_count: u32::try_from(interaction_count).map_err(decode_error)?,
        started_at: decode_timestamp(&started_at)?,
        last_interaction: decode_timestamp(&last_interaction)?,
    })
}

fn row_to_log(row: &SqliteRow) -> Result<InteractionLog, RepositoryError> {
    let conversation_id: String = row.try_get("conversation_id").map_err(decode_error)?;
    let score_delta: i64 = row.try_get("score_delta").map_err(decode_error)?;
    let interest_score: i64 = row.try_get("interest_score").map_err(decode_error)?;
    let factors: String = row.try_get("engagement_factors_json").map_err(decode_error)?;
    let product_ids: String = row.try_get("recommended_product_ids_json").map_err(decode_error)?;
    let recorded_at: String = row.try_get("recorded_at").map_err(decode_error)?;

    Ok(InteractionLog {
        id: row.try_get("id").map_err(decode_error)?,
        conversation_id: ConversationId(conversation_id),
        message: row.try_get("message").map_err(decode_error)?,
        score_delta: i32::try_from(score_delta).map_err(decode_error)?,
        interest_score: decode_u8(interest_score, "interest_score")?,
        engagement_factors: decode_list(&factors)?,
        recommended_product_ids: decode_list::<String>(&product_ids)?
            .into_iter()
            .map(ProductId)
            .collect(),
        recorded_at: decode_timestamp(&recorded_at)?,
    })
}

async fn upsert_conversation<'e, E>(
    executor: E,
    conversation: &Conversation,
) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let budget_hint = conversation
        .budget_hint
        .map(|hint| serde_json::to_string(&hint).map_err(decode_error))
        .transpose()?;

    sqlx::query(
        "INSERT INTO conversations
            (id, interest_score, preferences_json, dietary_restrictions_json, mood_tags_json,
             budget_hint_json, interaction_count, started_at, last_interaction)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            interest_score = excluded.interest_score,
            preferences_json = excluded.preferences_json,
            dietary_restrictions_json = excluded.dietary_restrictions_json,
            mood_tags_json = excluded.mood_tags_json,
            budget_hint_json = excluded.budget_hint_json,
            interaction_count = excluded.interaction_count,
            last_interaction = excluded.last_interaction",
    )
    .bind(&conversation.id.0)
    .bind(i64::from(conversation.interest_score))
    .bind(encode_set(&conversation.preferences)?)
    .bind(encode_set(&conversation.dietary_restrictions)?)
    .bind(encode_set(&conversation.mood_tags)?)
    .bind(budget_hint)
    .bind(i64::from(conversation.interaction_count))
    .bind(conversation.started_at.to_rfc3339())
    .bind(conversation.last_interaction.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

async fn insert_log<'e, E>(executor: E, log: &InteractionLog) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO interaction_logs
            (id, conversation_id, message, score_delta, interest_score,
             engagement_factors_json, recommended_product_ids_json, recorded_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&log.id)
    .bind(&log.conversation_id.0)
    .bind(&log.message)
    .bind(i64::from(log.score_delta))
    .bind(i64::from(log.interest_score))
    .bind(encode_list(&log.engagement_factors)?)
    .bind(encode_list(&log.recommended_product_ids)?)
    .bind(log.recorded_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, interest_score, preferences_json, dietary_restrictions_json,
                    mood_tags_json, budget_hint_json, interaction_count, started_at,
                    last_interaction
             FROM conversations WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_conversation).transpose()
    }

    async fn save(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        upsert_conversation(&self.pool, &conversation).await
    }

    async fn save_turn(
        &self,
        conversation: Conversation,
        log: InteractionLog,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        upsert_conversation(&mut *tx, &conversation).await?;
        insert_log(&mut *tx, &log).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_interactions(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<InteractionLog>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, message, score_delta, interest_score,
                    engagement_factors_json, recommended_product_ids_json, recorded_at
             FROM interaction_logs
             WHERE conversation_id = ?
             ORDER BY recorded_at ASC, rowid ASC",
        )
        .bind(&conversation_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_log).collect()
    }

    async fn list_all(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, interest_score, preferences_json, dietary_restrictions_json,
                    mood_tags_json, budget_hint_json, interaction_count, started_at,
                    last_interaction
             FROM conversations
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_conversation).collect()
    }

    async fn list_all_interactions(&self) -> Result<Vec<InteractionLog>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, message, score_delta, interest_score,
                    engagement_factors_json, recommended_product_ids_json, recorded_at
             FROM interaction_logs
             ORDER BY recorded_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_log).collect()
    }
}

use serde::Serialize;
use tastebud_core::domain::conversation::ConversationId;
use tastebud_core::recommend::RecommendationResult;
use tastebud_db::{ConversationService, Repositories};

use crate::commands::{application_failure, execute, open_database, to_json, CommandResult};

#[derive(Debug, Serialize)]
struct ChatOutput {
    conversation_id: String,
    correlation_id: String,
    interest_score: u8,
    score_delta: i32,
    engagement_factors: Vec<String>,
    activated: bool,
    recommendations: RecommendationResult,
}

pub fn run(message: &str, conversation: Option<&str>, limit: Option<usize>) -> CommandResult {
    let conversation_id = conversation.map(|id| ConversationId(id.to_string()));
    let result = execute("chat", |config| async move {
        let pool = open_database(&config).await?;
        let service = ConversationService::from_config(
            Repositories::sqlite(pool.clone()),
            &config.recommendation,
        );
        let turn = service.handle_message(conversation_id, message, limit).await;
        pool.close().await;

        let turn = turn.map_err(application_failure)?;
        let outcome = turn.outcome;
        let summary = format!(
            "interest score {} ({:+}); {}",
            outcome.conversation.interest_score,
            outcome.score_delta,
            describe(&outcome.recommendations, outcome.activated)
        );
        let output = ChatOutput {
            conversation_id: outcome.conversation.id.0,
            correlation_id: turn.correlation_id,
            interest_score: outcome.conversation.interest_score,
            score_delta: outcome.score_delta,
            engagement_factors: outcome.engagement_factors,
            activated: outcome.activated,
            recommendations: outcome.recommendations,
        };
        Ok((summary, to_json(&output)?))
    });

    match result {
        Ok((summary, data)) => CommandResult::success_with_data("chat", summary, Some(data)),
        Err(failure) => failure,
    }
}

fn describe(result: &RecommendationResult, activated: bool) -> String {
    if !activated {
        return "not enough interest for recommendations yet".to_string();
    }
    match result {
        RecommendationResult::NoSuitableProducts { description, .. } => description.clone(),
        RecommendationResult::Ranked { recommendations, fallback_applied } => {
            let suffix = if *fallback_applied { " (popular picks)" } else { "" };
            format!("{} recommendation(s){suffix}", recommendations.len())
        }
    }
}

use serde_json::json;
use tastebud_core::domain::conversation::ConversationId;
use tastebud_core::domain::interaction::FeedbackKind;
use tastebud_core::domain::product::ProductId;
use tastebud_db::{ConversationService, Repositories};

use crate::commands::{application_failure, execute, open_database, CommandResult, EXIT_NOT_FOUND};

pub fn run(conversation: &str, product: &str, ordered: bool) -> CommandResult {
    let kind = if ordered { FeedbackKind::Ordered } else { FeedbackKind::Clicked };
    let conversation_id = ConversationId(conversation.to_string());
    let product_id = ProductId(product.to_string());

    let result = execute("feedback", |config| async move {
        let pool = open_database(&config).await?;
        let service = ConversationService::from_config(
            Repositories::sqlite(pool.clone()),
            &config.recommendation,
        );
        let updated = service.record_feedback(&conversation_id, &product_id, kind).await;
        pool.close().await;

        if !updated.map_err(application_failure)? {
            let message = format!(
                "product `{product_id}` was never recommended in conversation `{conversation_id}`"
            );
            return Err(("not_found", message, EXIT_NOT_FOUND));
        }
        Ok(json!({
            "conversation_id": conversation_id.0,
            "product_id": product_id.0,
            "kind": kind,
        }))
    });

    match result {
        Ok(data) => {
            let verb = if ordered { "ordered" } else { "clicked" };
            CommandResult::success_with_data("feedback", format!("marked {verb}"), Some(data))
        }
        Err(failure) => failure,
    }
}

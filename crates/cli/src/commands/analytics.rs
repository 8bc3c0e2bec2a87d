use tastebud_db::{ConversationService, Repositories};

use crate::commands::{application_failure, execute, open_database, to_json, CommandResult};

pub fn run() -> CommandResult {
    let result = execute("analytics", |config| async move {
        let pool = open_database(&config).await?;
        let service = ConversationService::from_config(
            Repositories::sqlite(pool.clone()),
            &config.recommendation,
        );
        let report = service.analytics().await;
        pool.close().await;

        let report = report.map_err(application_failure)?;
        let message = format!(
            "{} conversation(s), {} recommendation(s) shown",
            report.conversations.total_conversations, report.recommendations.shown_count
        );
        Ok((message, to_json(&report)?))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("analytics", message, Some(data)),
        Err(failure) => failure,
    }
}

use tastebud_db::repositories::SqlProductCatalog;
use tastebud_db::seed_demo_catalog;

use crate::commands::{execute, open_database, to_json, CommandResult, EXIT_PERSISTENCE};

pub fn run() -> CommandResult {
    let result = execute("seed", |config| async move {
        let pool = open_database(&config).await?;
        let catalog = SqlProductCatalog::new(pool.clone());
        let seeded = seed_demo_catalog(&catalog)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_PERSISTENCE));
        pool.close().await;

        let seeded = seeded?;
        let message = format!(
            "demo catalog ready: {} inserted, {} already present",
            seeded.inserted, seeded.skipped
        );
        Ok((message, to_json(&seeded)?))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("seed", message, Some(data)),
        Err(failure) => failure,
    }
}

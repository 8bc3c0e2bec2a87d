use crate::commands::{execute, open_database, CommandResult};

pub fn run() -> CommandResult {
    let result = execute("migrate", |config| async move {
        let pool = open_database(&config).await?;
        pool.close().await;
        Ok(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}

pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod service;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{demo_catalog, seed_demo_catalog, SeedResult};
pub use repositories::RepositoryError;
pub use service::{ChatTurn, ConversationService, Repositories};

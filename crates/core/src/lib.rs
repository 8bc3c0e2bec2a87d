pub mod analytics;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod interest;
pub mod pipeline;
pub mod preferences;
pub mod recommend;
pub mod signals;

pub use analytics::{build_report, AnalyticsReport, RecommendationUptake};
pub use audit::{
    AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use catalog::{browse, CatalogQuery};
pub use domain::conversation::{BudgetHint, Conversation, ConversationId};
pub use domain::interaction::{FeedbackKind, InteractionLog, RecommendationEvent};
pub use domain::product::{Product, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use interest::{EngagementFactor, EngagementSignal, InterestScoreEngine, ScoreUpdate};
pub use pipeline::{ConversationEngine, EngagementAudit, MessageOutcome};
pub use preferences::ExtractedPreferences;
pub use recommend::{
    filter_dietary, DietaryFilter, RankedRecommendation, Recommender, RecommendationResult,
};
pub use signals::{Lexicon, MessageIntent, SignalDetector, SignalSet};

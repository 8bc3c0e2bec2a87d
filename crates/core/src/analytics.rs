//! Aggregate reporting over stored conversations, interaction logs, the
//! catalog and recommendation events.
//!
//! Everything here is a pure function of its inputs; the caller supplies the
//! records and the report timestamp.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Conversation, ConversationId};
use crate::domain::interaction::{InteractionLog, RecommendationEvent};
use crate::domain::product::{Product, ProductId};

/// Conversations at or above this score are listed as high scoring.
pub const HIGH_INTEREST_SCORE: u8 = 80;
pub const HIGH_SCORING_LIMIT: usize = 5;
pub const TOP_PRODUCTS_LIMIT: usize = 10;
pub const TOP_FACTORS_LIMIT: usize = 10;
pub const DIETARY_TAGS_LIMIT: usize = 15;

/// Inclusive interest-score ranges for the distribution.
pub const SCORE_BUCKETS: [(u8, u8); 5] = [(0, 20), (21, 40), (41, 60), (61, 80), (81, 100)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub conversations: ConversationAnalytics,
    pub interest_scores: InterestScoreAnalytics,
    pub products: ProductAnalytics,
    pub recommendations: RecommendationUptake,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalytics {
    pub total_conversations: usize,
    pub total_interactions: usize,
    pub avg_interactions_per_conversation: f64,
    pub avg_interest_score: f64,
    pub max_interest_score: u8,
    pub interest_score_distribution: Vec<ScoreBucket>,
    pub top_engagement_factors: Vec<FactorCount>,
    pub durations: DurationStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub range: String,
    pub conversations: usize,
}

/// How often an engagement factor fired across all logged messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorCount {
    pub factor: String,
    pub occurrences: usize,
}

/// First-to-last message span for conversations with more than one logged
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationStats {
    pub avg_minutes: f64,
    pub min_minutes: f64,
    pub max_minutes: f64,
    pub conversations_analyzed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestScoreAnalytics {
    pub positive_changes: usize,
    pub negative_changes: usize,
    pub neutral_changes: usize,
    pub avg_positive_change: f64,
    pub avg_negative_change: f64,
    pub high_scoring_conversations: Vec<HighScoringConversation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoringConversation {
    pub conversation_id: ConversationId,
    pub interest_score: u8,
    pub interaction_count: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalytics {
    pub total_products: usize,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Mean over rated products only
    pub avg_popularity: f64,
    pub chef_specials: usize,
    pub limited_time_offers: usize,
    pub category_distribution: BTreeMap<String, usize>,
    pub dietary_tag_distribution: Vec<TagCount>,
    pub spice_level_distribution: BTreeMap<u8, usize>,
    pub top_by_popularity: Vec<PopularProduct>,
    pub most_recommended: Vec<RecommendedProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub products: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularProduct {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub popularity_score: Option<u8>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub uptake: RecommendationUptake,
}

/// Shown, clicked and ordered counts for a set of recommendation events.
/// Ordering implies a click, so `ordered_count <= clicked_count`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendationUptake {
    pub shown_count: usize,
    pub clicked_count: usize,
    pub ordered_count: usize,
    pub click_rate: f64,
    pub order_rate: f64,
}

impl RecommendationUptake {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a RecommendationEvent>) -> Self {
        let mut uptake = Self::default();
        for event in events {
            uptake.shown_count += 1;
            uptake.clicked_count += usize::from(event.clicked || event.ordered);
            uptake.ordered_count += usize::from(event.ordered);
        }
        if uptake.shown_count > 0 {
            let shown = uptake.shown_count as f64;
            uptake.click_rate = uptake.clicked_count as f64 / shown;
            uptake.order_rate = uptake.ordered_count as f64 / shown;
        }
        uptake
    }
}

pub fn build_report(
    conversations: &[Conversation],
    interactions: &[InteractionLog],
    products: &[Product],
    events: &[RecommendationEvent],
    generated_at: DateTime<Utc>,
) -> AnalyticsReport {
    AnalyticsReport {
        conversations: conversation_analytics(conversations, interactions),
        interest_scores: interest_score_analytics(conversations, interactions),
        products: product_analytics(products, events),
        recommendations: RecommendationUptake::from_events(events),
        generated_at,
    }
}

pub fn conversation_analytics(
    conversations: &[Conversation],
    interactions: &[InteractionLog],
) -> ConversationAnalytics {
    let scores: Vec<f64> =
        conversations.iter().map(|conversation| f64::from(conversation.interest_score)).collect();

    let interest_score_distribution = SCORE_BUCKETS
        .iter()
        .map(|&(low, high)| ScoreBucket {
            range: format!("{low}-{high}"),
            conversations: conversations
                .iter()
                .filter(|conversation| (low..=high).contains(&conversation.interest_score))
                .count(),
        })
        .collect();

    ConversationAnalytics {
        total_conversations: conversations.len(),
        total_interactions: interactions.len(),
        avg_interactions_per_conversation: round2(
            interactions.len() as f64 / conversations.len().max(1) as f64,
        ),
        avg_interest_score: round2(mean(&scores)),
        max_interest_score: conversations
            .iter()
            .map(|conversation| conversation.interest_score)
            .max()
            .unwrap_or(0),
        interest_score_distribution,
        top_engagement_factors: top_engagement_factors(interactions),
        durations: duration_stats(interactions),
    }
}

/// Descriptions carry per-message detail in a trailing parenthetical
/// ("Enthusiasm detected (2 positive words)"); that part is dropped so the
/// same factor is counted under one name.
fn factor_name(description: &str) -> &str {
    match description.rfind(" (") {
        Some(index) if description.ends_with(')') => &description[..index],
        _ => description,
    }
}

fn top_engagement_factors(interactions: &[InteractionLog]) -> Vec<FactorCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for description in interactions.iter().flat_map(|log| &log.engagement_factors) {
        *counts.entry(factor_name(description)).or_default() += 1;
    }

    let mut ranked: Vec<FactorCount> = counts
        .into_iter()
        .map(|(factor, occurrences)| FactorCount { factor: factor.to_string(), occurrences })
        .collect();
    ranked.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    ranked.truncate(TOP_FACTORS_LIMIT);
    ranked
}

fn duration_stats(interactions: &[InteractionLog]) -> DurationStats {
    let mut spans: HashMap<&str, (DateTime<Utc>, DateTime<Utc>, usize)> = HashMap::new();
    for log in interactions {
        spans
            .entry(log.conversation_id.0.as_str())
            .and_modify(|(first, last, count)| {
                *first = (*first).min(log.recorded_at);
                *last = (*last).max(log.recorded_at);
                *count += 1;
            })
            .or_insert((log.recorded_at, log.recorded_at, 1));
    }

    let minutes: Vec<f64> = spans
        .values()
        .filter(|(_, _, count)| *count > 1)
        .map(|(first, last, _)| (*last - *first).num_milliseconds() as f64 / 60_000.0)
        .collect();
    if minutes.is_empty() {
        return DurationStats::default();
    }

    DurationStats {
        avg_minutes: round2(mean(&minutes)),
        min_minutes: round2(minutes.iter().copied().fold(f64::INFINITY, f64::min)),
        max_minutes: round2(minutes.iter().copied().fold(0.0, f64::max)),
        conversations_analyzed: minutes.len(),
    }
}

pub fn interest_score_analytics(
    conversations: &[Conversation],
    interactions: &[InteractionLog],
) -> InterestScoreAnalytics {
    let positive: Vec<f64> = interactions
        .iter()
        .filter(|log| log.score_delta > 0)
        .map(|log| f64::from(log.score_delta))
        .collect();
    let negative: Vec<f64> = interactions
        .iter()
        .filter(|log| log.score_delta < 0)
        .map(|log| f64::from(log.score_delta))
        .collect();

    let mut high: Vec<&Conversation> = conversations
        .iter()
        .filter(|conversation| conversation.interest_score >= HIGH_INTEREST_SCORE)
        .collect();
    high.sort_by(|a, b| b.interest_score.cmp(&a.interest_score));

    InterestScoreAnalytics {
        positive_changes: positive.len(),
        negative_changes: negative.len(),
        neutral_changes: interactions.len() - positive.len() - negative.len(),
        avg_positive_change: round2(mean(&positive)),
        avg_negative_change: round2(mean(&negative)),
        high_scoring_conversations: high
            .into_iter()
            .take(HIGH_SCORING_LIMIT)
            .map(|conversation| HighScoringConversation {
                conversation_id: conversation.id.clone(),
                interest_score: conversation.interest_score,
                interaction_count: conversation.interaction_count,
                started_at: conversation.started_at,
            })
            .collect(),
    }
}

pub fn product_analytics(products: &[Product], events: &[RecommendationEvent]) -> ProductAnalytics {
    let prices: Vec<f64> = products.iter().map(|product| product.price).collect();
    let ratings: Vec<f64> =
        products.iter().filter_map(|product| product.popularity_score.map(f64::from)).collect();

    let mut category_distribution = BTreeMap::new();
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut spice_level_distribution = BTreeMap::new();
    for product in products {
        *category_distribution.entry(product.category.clone()).or_default() += 1;
        *spice_level_distribution.entry(product.spice_level).or_default() += 1;
        for tag in &product.dietary_tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut dietary_tag_distribution: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag: tag.to_string(), products: count })
        .collect();
    dietary_tag_distribution.sort_by(|a, b| b.products.cmp(&a.products));
    dietary_tag_distribution.truncate(DIETARY_TAGS_LIMIT);

    let mut by_popularity: Vec<&Product> = products.iter().collect();
    by_popularity.sort_by(|a, b| compare_popularity(a.popularity_score, b.popularity_score));
    let top_by_popularity = by_popularity
        .into_iter()
        .take(TOP_PRODUCTS_LIMIT)
        .map(|product| PopularProduct {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            popularity_score: product.popularity_score,
            price: product.price,
        })
        .collect();

    ProductAnalytics {
        total_products: products.len(),
        avg_price: round2(mean(&prices)),
        min_price: round2(prices.iter().copied().reduce(f64::min).unwrap_or(0.0)),
        max_price: round2(prices.iter().copied().reduce(f64::max).unwrap_or(0.0)),
        avg_popularity: round2(mean(&ratings)),
        chef_specials: products.iter().filter(|product| product.chef_special).count(),
        limited_time_offers: products.iter().filter(|product| product.limited_time).count(),
        category_distribution,
        dietary_tag_distribution,
        spice_level_distribution,
        top_by_popularity,
        most_recommended: most_recommended(products, events),
    }
}

/// Rated products first, highest score first; unrated ones keep catalog order
/// at the end.
fn compare_popularity(a: Option<u8>, b: Option<u8>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Products ordered by how many conversations they were shown to. Events for
/// products no longer in the catalog are skipped; ties keep catalog order.
fn most_recommended(
    products: &[Product],
    events: &[RecommendationEvent],
) -> Vec<RecommendedProduct> {
    let mut by_product: HashMap<&str, Vec<&RecommendationEvent>> = HashMap::new();
    for event in events {
        by_product.entry(event.product_id.0.as_str()).or_default().push(event);
    }

    let mut recommended: Vec<RecommendedProduct> = products
        .iter()
        .filter_map(|product| {
            let shown = by_product.get(product.id.0.as_str())?;
            Some(RecommendedProduct {
                product_id: product.id.clone(),
                name: product.name.clone(),
                category: product.category.clone(),
                price: product.price,
                uptake: RecommendationUptake::from_events(shown.iter().copied()),
            })
        })
        .collect();
    recommended.sort_by(|a, b| b.uptake.shown_count.cmp(&a.uptake.shown_count));
    recommended.truncate(TOP_PRODUCTS_LIMIT);
    recommended
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{
        build_report, conversation_analytics, interest_score_analytics, product_analytics,
        RecommendationUptake,
    };
    use crate::domain::conversation::{Conversation, ConversationId};
    use crate::domain::interaction::{InteractionLog, RecommendationEvent};
    use crate::domain::product::fixtures::product;
    use crate::domain::product::{Product, ProductId};

    fn conversation(id: &str, score: u8, interactions: u32) -> Conversation {
        let mut conversation = Conversation::new(ConversationId(id.to_string()));
        conversation.interest_score = score;
        conversation.interaction_count = interactions;
        conversation
    }

    fn log(conversation: &str, delta: i32, minute: i64, factors: &[&str]) -> InteractionLog {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("timestamp");
        InteractionLog {
            id: format!("log-{conversation}-{minute}"),
            conversation_id: ConversationId(conversation.to_string()),
            message: "hi".to_string(),
            score_delta: delta,
            interest_score: 0,
            engagement_factors: factors.iter().map(|factor| factor.to_string()).collect(),
            recommended_product_ids: Vec::new(),
            recorded_at: base + Duration::minutes(minute),
        }
    }

    fn event(
        conversation: &str,
        product: &str,
        clicked: bool,
        ordered: bool,
    ) -> RecommendationEvent {
        RecommendationEvent {
            id: format!("evt-{conversation}-{product}"),
            conversation_id: ConversationId(conversation.to_string()),
            product_id: ProductId(product.to_string()),
            recommendation_score: 70.0,
            reason_text: String::new(),
            clicked,
            ordered,
            recommended_at: Utc::now(),
        }
    }

    fn menu() -> Vec<Product> {
        let mut burger = product("BR001", "Classic Burger", "Burgers");
        burger.price = 12.0;
        burger.popularity_score = Some(88);
        burger.spice_level = 1;

        let mut veggie = product("BR002", "Veggie Burger", "Burgers");
        veggie.price = 10.0;
        veggie.popularity_score = None;
        veggie.dietary_tags = vec!["vegetarian".to_string()];
        veggie.chef_special = true;

        let mut salad = product("SL001", "Garden Salad", "Salads");
        salad.price = 8.5;
        salad.popularity_score = Some(70);
        salad.dietary_tags = vec!["vegetarian".to_string(), "vegan".to_string()];
        salad.limited_time = true;

        vec![burger, veggie, salad]
    }

    #[test]
    fn score_change_patterns_split_by_sign() {
        let logs = vec![
            log("a", 30, 0, &[]),
            log("a", 10, 1, &[]),
            log("a", -25, 2, &[]),
            log("b", 0, 0, &[]),
            log("b", -10, 3, &[]),
        ];
        let conversations =
            vec![conversation("a", 85, 3), conversation("b", 40, 2), conversation("c", 92, 1)];

        let analytics = interest_score_analytics(&conversations, &logs);

        assert_eq!(analytics.positive_changes, 2);
        assert_eq!(analytics.negative_changes, 2);
        assert_eq!(analytics.neutral_changes, 1);
        assert_eq!(analytics.avg_positive_change, 20.0);
        assert_eq!(analytics.avg_negative_change, -17.5);

        let high: Vec<&str> = analytics
            .high_scoring_conversations
            .iter()
            .map(|entry| entry.conversation_id.0.as_str())
            .collect();
        assert_eq!(high, vec!["c", "a"]);
    }

    #[test]
    fn conversation_overview_buckets_scores_and_counts_factors() {
        let conversations =
            vec![conversation("a", 20, 2), conversation("b", 21, 1), conversation("c", 100, 1)];
        let logs = vec![
            log("a", 15, 0, &["Specific preferences mentioned (2 detected)", "Question asked"]),
            log("a", 15, 5, &["Specific preferences mentioned (1 detected)"]),
            log("b", -10, 0, &["Hesitation detected (-10)"]),
            log("c", 30, 0, &["Order intent detected"]),
        ];

        let analytics = conversation_analytics(&conversations, &logs);

        assert_eq!(analytics.total_conversations, 3);
        assert_eq!(analytics.total_interactions, 4);
        assert_eq!(analytics.avg_interactions_per_conversation, 1.33);
        assert_eq!(analytics.avg_interest_score, 47.0);
        assert_eq!(analytics.max_interest_score, 100);

        let buckets: Vec<usize> =
            analytics.interest_score_distribution.iter().map(|b| b.conversations).collect();
        assert_eq!(buckets, vec![1, 1, 0, 0, 1]);
        assert_eq!(analytics.interest_score_distribution[0].range, "0-20");

        assert_eq!(analytics.top_engagement_factors[0].factor, "Specific preferences mentioned");
        assert_eq!(analytics.top_engagement_factors[0].occurrences, 2);
        assert!(analytics
            .top_engagement_factors
            .iter()
            .any(|entry| entry.factor == "Hesitation detected"));

        assert_eq!(analytics.durations.conversations_analyzed, 1);
        assert_eq!(analytics.durations.avg_minutes, 5.0);
    }

    #[test]
    fn uptake_rates_come_from_feedback_flags() {
        let events = vec![
            event("a", "BR001", true, true),
            event("b", "BR001", true, false),
            event("c", "BR001", false, false),
            event("d", "BR001", false, false),
        ];

        let uptake = RecommendationUptake::from_events(&events);

        assert_eq!(uptake.shown_count, 4);
        assert_eq!(uptake.clicked_count, 2);
        assert_eq!(uptake.ordered_count, 1);
        assert!((uptake.click_rate - 0.5).abs() < f64::EPSILON);
        assert!((uptake.order_rate - 0.25).abs() < f64::EPSILON);
        let none: Vec<RecommendationEvent> = Vec::new();
        assert_eq!(RecommendationUptake::from_events(&none), RecommendationUptake::default());
    }

    #[test]
    fn product_analytics_describes_the_catalog_and_ranks_recommended_items() {
        let events = vec![
            event("a", "SL001", true, false),
            event("b", "SL001", false, false),
            event("a", "BR001", true, true),
            event("a", "GONE1", true, true),
        ];

        let analytics = product_analytics(&menu(), &events);

        assert_eq!(analytics.total_products, 3);
        assert_eq!(analytics.avg_price, 10.17);
        assert_eq!(analytics.min_price, 8.5);
        assert_eq!(analytics.max_price, 12.0);
        assert_eq!(analytics.avg_popularity, 79.0);
        assert_eq!(analytics.chef_specials, 1);
        assert_eq!(analytics.limited_time_offers, 1);
        assert_eq!(analytics.category_distribution.get("Burgers"), Some(&2));
        assert_eq!(analytics.dietary_tag_distribution[0].tag, "vegetarian");
        assert_eq!(analytics.dietary_tag_distribution[0].products, 2);

        let popular: Vec<&str> =
            analytics.top_by_popularity.iter().map(|entry| entry.product_id.0.as_str()).collect();
        assert_eq!(popular, vec!["BR001", "SL001", "BR002"]);

        let recommended: Vec<(&str, usize)> = analytics
            .most_recommended
            .iter()
            .map(|entry| (entry.product_id.0.as_str(), entry.uptake.shown_count))
            .collect();
        assert_eq!(recommended, vec![("SL001", 2), ("BR001", 1)]);
        assert!((analytics.most_recommended[0].uptake.click_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_stores_produce_a_zeroed_report() {
        let generated_at = Utc::now();
        let report = build_report(&[], &[], &[], &[], generated_at);

        assert_eq!(report.conversations.total_conversations, 0);
        assert_eq!(report.conversations.avg_interactions_per_conversation, 0.0);
        assert_eq!(report.interest_scores.avg_positive_change, 0.0);
        assert_eq!(report.products.min_price, 0.0);
        assert!(report.products.most_recommended.is_empty());
        assert_eq!(report.recommendations.shown_count, 0);
        assert_eq!(report.generated_at, generated_at);
    }
}

//! Recommendation pipeline: dietary filter, narrowing, scoring, fallback.

use std::cmp::Ordering;

use tracing::{debug, info};

use super::dietary::DietaryFilter;
use super::fallback;
use super::scoring::{matches_category, ScoreCalculator};
use super::types::{RankedRecommendation, RankingContext, RecommendationResult};
use super::DIETARY_COMPLIANCE_BONUS;
use crate::domain::conversation::Conversation;
use crate::domain::product::Product;
use crate::signals::{KeywordGroup, Lexicon, MessageIntent};

#[derive(Debug, Clone)]
pub struct Recommender {
    categories: Vec<KeywordGroup>,
    dietary: DietaryFilter,
    calculator: ScoreCalculator,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(&Lexicon::default(), DietaryFilter::default(), ScoreCalculator::default())
    }
}

impl Recommender {
    pub fn new(lexicon: &Lexicon, dietary: DietaryFilter, calculator: ScoreCalculator) -> Self {
        Self { categories: lexicon.food_categories.clone(), dietary, calculator }
    }

    pub fn dietary(&self) -> &DietaryFilter {
        &self.dietary
    }

    /// Message labels first, then remembered restrictions not already listed.
    pub fn active_restrictions(intent: &MessageIntent, conversation: &Conversation) -> Vec<String> {
        let mut restrictions = intent.dietary.clone();
        for restriction in &conversation.dietary_restrictions {
            if !restrictions.contains(restriction) {
                restrictions.push(restriction.clone());
            }
        }
        restrictions
    }

    /// Deterministic for identical inputs: ties keep catalog order.
    pub fn recommend(
        &self,
        catalog: &[Product],
        context: RankingContext<'_>,
    ) -> RecommendationResult {
        let RankingContext { conversation, intent, limit } = context;
        let limit = limit.max(1);
        let restrictions = Self::active_restrictions(intent, conversation);

        let compliant = if restrictions.is_empty() {
            catalog.to_vec()
        } else {
            let filtered = self.dietary.filter(catalog, &restrictions);
            if filtered.is_empty() {
                info!(
                    event_name = "recommendation.no_suitable_products",
                    conversation_id = %conversation.id,
                    restrictions = %restrictions.join(","),
                    "dietary filter removed every product"
                );
                return RecommendationResult::no_suitable_products(restrictions);
            }
            filtered
        };

        let candidates = self.narrow(compliant, intent);
        let mut ranked = self.rank(&candidates, conversation, intent, !restrictions.is_empty());
        ranked.truncate(limit);

        let mut fallback_applied = false;
        if fallback::needs_fallback(&ranked) {
            if let Some(category) = intent.first_category() {
                let backup = fallback::popular_in_category(
                    catalog,
                    category,
                    &restrictions,
                    limit,
                    &self.dietary,
                );
                if !backup.is_empty() {
                    info!(
                        event_name = "recommendation.fallback_applied",
                        conversation_id = %conversation.id,
                        category,
                        count = backup.len(),
                        "primary ranking was weak, using popularity fallback"
                    );
                    ranked = backup;
                    fallback_applied = true;
                }
            }
        }

        info!(
            event_name = "recommendation.ranked",
            conversation_id = %conversation.id,
            candidates = candidates.len(),
            returned = ranked.len(),
            fallback_applied,
            "recommendations ranked"
        );

        RecommendationResult::Ranked { recommendations: ranked, fallback_applied }
    }

    /// Category narrowing falls back to the full set when nothing matches;
    /// budget narrowing does not.
    fn narrow(&self, candidates: Vec<Product>, intent: &MessageIntent) -> Vec<Product> {
        let mut candidates = if intent.categories.is_empty() {
            candidates
        } else {
            let in_category: Vec<Product> = candidates
                .iter()
                .filter(|product| {
                    intent
                        .categories
                        .iter()
                        .any(|label| matches_category(product, label, &self.categories))
                })
                .cloned()
                .collect();
            if in_category.is_empty() {
                debug!(
                    categories = %intent.categories.join(","),
                    "no product in requested categories, keeping full set"
                );
                candidates
            } else {
                in_category
            }
        };

        if let Some(budget) = intent.budget {
            candidates.retain(|product| budget.admits(product.price));
        }

        candidates
    }

    fn rank(
        &self,
        candidates: &[Product],
        conversation: &Conversation,
        intent: &MessageIntent,
        restrictions_active: bool,
    ) -> Vec<RankedRecommendation> {
        let mut ranked: Vec<RankedRecommendation> = candidates
            .iter()
            .map(|product| {
                let scores = self.calculator.component_scores(
                    product,
                    conversation,
                    intent,
                    &self.categories,
                    &self.dietary,
                );
                let mut total = self.calculator.calculate_total_score(&scores);
                if restrictions_active {
                    total += DIETARY_COMPLIANCE_BONUS;
                }
                let reasons = self.calculator.generate_reasons(product, conversation, intent);
                RankedRecommendation::new(product, total, reasons, Some(scores))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.recommendation_score.partial_cmp(&a.recommendation_score).unwrap_or(Ordering::Equal)
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::Recommender;
    use crate::domain::conversation::{BudgetHint, Conversation, ConversationId};
    use crate::domain::product::fixtures::product;
    use crate::domain::product::Product;
    use crate::recommend::types::{RankingContext, RecommendationResult};
    use crate::signals::{MessageIntent, SignalDetector};

    fn conversation() -> Conversation {
        Conversation::new(ConversationId("conv-rank".to_string()))
    }

    fn menu() -> Vec<Product> {
        let mut classic = product("BR001", "Classic Beef Burger", "Burgers");
        classic.price = 11.0;
        classic.popularity_score = Some(88);
        classic.mood_tags = vec!["comfort".to_string()];

        let mut veggie = product("BR002", "Garden Veggie Burger", "Burgers");
        veggie.price = 9.0;
        veggie.dietary_tags = vec!["vegetarian".to_string()];
        veggie.popularity_score = Some(72);

        let mut margherita = product("PZ001", "Margherita Pizza", "Pizza");
        margherita.price = 14.0;
        margherita.dietary_tags = vec!["vegetarian".to_string()];
        margherita.popularity_score = Some(91);

        let mut wings = product("CK001", "Buffalo Wings", "Chicken");
        wings.price = 12.0;
        wings.popularity_score = Some(80);

        vec![classic, veggie, margherita, wings]
    }

    fn intent(message: &str) -> MessageIntent {
        SignalDetector::default().intent(message)
    }

    fn ids(result: &RecommendationResult) -> Vec<String> {
        result.recommendations().iter().map(|entry| entry.product_id.0.clone()).collect()
    }

    #[test]
    fn remembered_restrictions_follow_message_labels() {
        let mut state = conversation();
        state.dietary_restrictions.insert("halal".to_string());
        state.dietary_restrictions.insert("vegan".to_string());
        let intent =
            MessageIntent { dietary: vec!["vegan".to_string()], ..MessageIntent::default() };

        assert_eq!(
            Recommender::active_restrictions(&intent, &state),
            vec!["vegan".to_string(), "halal".to_string()]
        );
    }

    #[test]
    fn remembered_restrictions_are_listed_alphabetically_in_the_sentinel() {
        let mut state = conversation();
        state.dietary_restrictions.insert("vegan".to_string());
        state.dietary_restrictions.insert("halal".to_string());
        let intent = intent("what do you have?");
        let result = Recommender::default()
            .recommend(&menu(), RankingContext { conversation: &state, intent: &intent, limit: 3 });

        match result {
            RecommendationResult::NoSuitableProducts { restrictions, description, .. } => {
                assert_eq!(restrictions, vec!["halal".to_string(), "vegan".to_string()]);
                assert_eq!(description, "Sorry, no products match your halal, vegan requirements.");
            }
            RecommendationResult::Ranked { .. } => panic!("expected the sentinel"),
        }
    }

    #[test]
    fn category_request_ranks_matching_products_first() {
        let state = conversation();
        let intent = intent("I want a burger");
        let result = Recommender::default()
            .recommend(&menu(), RankingContext { conversation: &state, intent: &intent, limit: 3 });

        assert_eq!(ids(&result), vec!["BR001".to_string(), "BR002".to_string()]);
        assert!(!result.fallback_applied());
        let top = &result.recommendations()[0];
        assert_eq!(top.reasons[0], "Perfect burgers match for your request");
        assert!(top.reasons.len() <= 3);
    }

    #[test]
    fn vegetarian_request_filters_and_adds_compliance_bonus() {
        let state = conversation();
        let intent = intent("vegetarian burger please");
        let result = Recommender::default()
            .recommend(&menu(), RankingContext { conversation: &state, intent: &intent, limit: 3 });

        assert_eq!(ids(&result), vec!["BR002".to_string()]);
        let entry = &result.recommendations()[0];
        let scores = entry.component_scores.expect("primary entries carry component scores");
        // 100*0.4 current + 15 dietary + 5 budget + 3.6 popularity = 63.6, then +20 bonus
        assert_eq!(scores.current_request, 100.0);
        assert!((entry.recommendation_score - 83.6).abs() < 1e-9);
    }

    #[test]
    fn unmet_restrictions_yield_the_sentinel() {
        let state = conversation();
        let intent = intent("anything vegan?");
        let result = Recommender::default()
            .recommend(&menu(), RankingContext { conversation: &state, intent: &intent, limit: 3 });

        assert!(result.is_no_suitable_products());
        match result {
            RecommendationResult::NoSuitableProducts { restrictions, description, .. } => {
                // "veg" inside "vegan" also raises vegetarian.
                assert_eq!(restrictions, vec!["vegetarian".to_string(), "vegan".to_string()]);
                assert_eq!(
                    description,
                    "Sorry, no products match your vegetarian, vegan requirements."
                );
            }
            RecommendationResult::Ranked { .. } => panic!("expected the sentinel"),
        }
    }

    #[test]
    fn budget_narrowing_uses_the_message_hint() {
        let state = conversation();
        let intent = intent("a burger under $10");
        let result = Recommender::default()
            .recommend(&menu(), RankingContext { conversation: &state, intent: &intent, limit: 3 });

        assert_eq!(ids(&result), vec!["BR002".to_string()]);
        assert!(result.recommendations()[0]
            .reasons
            .contains(&"Within your $10 budget".to_string()));
    }

    #[test]
    fn unknown_category_keeps_full_set() {
        let state = conversation();
        let intent = intent("any seafood?");
        let result = Recommender::default()
            .recommend(&menu(), RankingContext { conversation: &state, intent: &intent, limit: 4 });

        assert_eq!(result.recommendations().len(), 4);
        assert!(!result.fallback_applied());
    }

    #[test]
    fn ties_keep_catalog_order_and_ranking_is_repeatable() {
        let catalog: Vec<Product> =
            ["TC001", "TC002", "TC003"].iter().map(|id| product(id, "Taco", "Tacos")).collect();
        let state = conversation();
        let intent = intent("tacos");
        let recommender = Recommender::default();

        let first = recommender.recommend(
            &catalog,
            RankingContext { conversation: &state, intent: &intent, limit: 3 },
        );
        let second = recommender.recommend(
            &catalog,
            RankingContext { conversation: &state, intent: &intent, limit: 3 },
        );

        assert_eq!(ids(&first), vec!["TC001", "TC002", "TC003"]);
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
    }

    #[test]
    fn emptied_ranking_triggers_popularity_fallback() {
        // Both desserts are off-budget, so the primary ranking is empty.
        let mut cake = product("DS001", "Chocolate Cake", "Desserts");
        cake.price = 30.0;
        cake.popularity_score = Some(65);
        let mut pie = product("DS002", "Apple Pie", "Desserts");
        pie.price = 28.0;
        pie.popularity_score = Some(85);
        let catalog = vec![cake, pie];

        let state = conversation();
        let intent = intent("dessert under $5");
        let result = Recommender::default().recommend(
            &catalog,
            RankingContext { conversation: &state, intent: &intent, limit: 3 },
        );

        assert!(result.fallback_applied());
        assert_eq!(ids(&result), vec!["DS002".to_string(), "DS001".to_string()]);
        assert_eq!(result.recommendations()[0].recommendation_score, 105.0);
        assert!(result.recommendations()[0].component_scores.is_none());
    }

    #[test]
    fn scores_below_the_floor_trigger_fallback() {
        let mut salmon = product("SF001", "Grilled Salmon", "Seafood");
        salmon.popularity_score = Some(0);
        salmon.allergens = vec!["fish".to_string()];
        let catalog = vec![salmon];

        let mut state = conversation();
        state.dietary_restrictions.insert("fish".to_string());
        state.budget_hint = Some(BudgetHint::Under(1.0));
        // Three unmet diets zero the current request; the allergen zeroes
        // compatibility. 0.5 budget + 20 bonus = 20.5.
        let intent = intent("gluten-free keto low-carb seafood");
        let result = Recommender::default().recommend(
            &catalog,
            RankingContext { conversation: &state, intent: &intent, limit: 3 },
        );

        assert!(result.fallback_applied());
        let entry = &result.recommendations()[0];
        assert_eq!(entry.recommendation_score, 20.0);
        assert_eq!(entry.reasons[0], "Popular seafood option that meets your dietary requirements");
    }

    #[test]
    fn scores_at_or_above_the_floor_keep_the_primary_ranking() {
        let mut plain = product("SL001", "Side Salad", "Salads");
        plain.popularity_score = Some(0);
        plain.price = 40.0;
        let catalog = vec![plain];

        let mut state = conversation();
        state.budget_hint = Some(BudgetHint::Around(5.0));
        let intent = intent("a salad");
        let result = Recommender::default().recommend(
            &catalog,
            RankingContext { conversation: &state, intent: &intent, limit: 3 },
        );

        // 80 * 0.4 + dietary 15 + budget 0 + popularity 0 = 47.
        assert!(!result.fallback_applied());
        assert!((result.recommendations()[0].recommendation_score - 47.0).abs() < 1e-9);
    }

    #[test]
    fn low_scores_without_a_category_stand() {
        let mut soda = product("BV001", "Soda", "Beverages");
        soda.popularity_score = Some(0);
        let mut water = product("BV002", "Sparkling Water", "Beverages");
        water.popularity_score = Some(0);
        water.price = 11.0;

        let mut state = conversation();
        state.budget_hint = Some(BudgetHint::Under(1.0));
        let intent = MessageIntent::default();
        let result = Recommender::default().recommend(
            &[soda, water],
            RankingContext { conversation: &state, intent: &intent, limit: 3 },
        );

        assert_eq!(ids(&result), vec!["BV001".to_string(), "BV002".to_string()]);
        assert!(result.recommendations().iter().all(|entry| entry.recommendation_score < 30.0));
        assert!(!result.fallback_applied());
    }
}

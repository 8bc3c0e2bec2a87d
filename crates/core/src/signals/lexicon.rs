//! Keyword tables driving message analysis.
//!
//! Matching is plain substring containment over the lowercased message, so a
//! keyword inside a longer word still counts ("hot" matches "photo").

use serde::{Deserialize, Serialize};

/// Bumped whenever a table's contents change.
pub const LEXICON_VERSION: &str = "2024.1";

/// A canonical label and the phrases that map onto it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self { label: label.to_string(), keywords: words(keywords) }
    }

    pub fn matches(&self, normalized: &str) -> bool {
        contains_any(normalized, &self.keywords)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    pub version: String,
    pub specific_preferences: Vec<String>,
    pub dietary_mentions: Vec<String>,
    pub mood_indicators: Vec<String>,
    pub enthusiasm: Vec<String>,
    pub hesitation: Vec<String>,
    pub budget_concern: Vec<String>,
    /// At least one of these must also appear for a budget concern to count.
    pub budget_concern_qualifiers: Vec<String>,
    pub questions: Vec<String>,
    pub price_inquiry: Vec<String>,
    pub order_intent: Vec<String>,
    pub rejection: Vec<String>,
    /// Mood labels remembered on the conversation.
    pub conversation_moods: Vec<KeywordGroup>,
    /// Food categories the current message asks for.
    pub food_categories: Vec<KeywordGroup>,
    /// Dietary labels the current message asks for.
    pub dietary_labels: Vec<KeywordGroup>,
    /// Occasion moods the current message asks for.
    pub occasion_moods: Vec<KeywordGroup>,
}

impl Lexicon {
    pub fn food_category(&self, label: &str) -> Option<&KeywordGroup> {
        self.food_categories.iter().find(|group| group.label == label)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            version: LEXICON_VERSION.to_string(),
            specific_preferences: words(&[
                "spicy", "mild", "hot", "korean", "mexican", "italian", "chinese", "burger",
                "pizza", "taco", "salad", "chicken", "beef", "vegetarian", "vegan", "crispy",
                "juicy", "creamy", "crunchy", "sweet", "salty",
            ]),
            dietary_mentions: words(&[
                "vegetarian",
                "vegan",
                "gluten-free",
                "dairy-free",
                "keto",
                "low-carb",
                "halal",
                "kosher",
                "allergic",
                "allergy",
                "no dairy",
                "no gluten",
            ]),
            mood_indicators: words(&[
                "adventurous",
                "comfort",
                "healthy",
                "indulgent",
                "quick",
                "fancy",
                "feeling",
                "mood",
                "craving",
                "want something",
                "in the mood for",
            ]),
            enthusiasm: words(&[
                "amazing",
                "perfect",
                "love",
                "awesome",
                "fantastic",
                "great",
                "excellent",
                "wonderful",
                "delicious",
                "yummy",
                "sounds good",
            ]),
            hesitation: words(&[
                "maybe",
                "not sure",
                "uncertain",
                "hmm",
                "i think",
                "perhaps",
                "possibly",
                "might",
                "could be",
                "not really sure",
            ]),
            budget_concern: words(&[
                "too expensive",
                "too much",
                "costly",
                "pricey",
                "expensive",
                "cheap",
                "affordable",
                "budget",
                "money",
            ]),
            budget_concern_qualifiers: words(&["too", "expensive"]),
            questions: words(&[
                "what",
                "how",
                "when",
                "where",
                "why",
                "which",
                "can you",
                "do you have",
                "is it",
                "does it",
                "spice level",
                "ingredients",
            ]),
            price_inquiry: words(&[
                "how much",
                "what does it cost",
                "price",
                "cost",
                "expensive",
                "how much is",
                "what's the price",
            ]),
            order_intent: words(&[
                "i'll take",
                "add to cart",
                "order",
                "get me",
                "i want that",
                "sounds perfect",
                "i'll have",
                "give me",
                "let's go with",
            ]),
            rejection: words(&[
                "i don't like",
                "not interested",
                "no thanks",
                "don't want",
                "hate",
                "dislike",
                "not for me",
                "pass",
            ]),
            conversation_moods: vec![
                KeywordGroup::new(
                    "adventurous",
                    &["adventurous", "adventure", "try something new"],
                ),
                KeywordGroup::new("comfort", &["comfort", "cozy", "familiar"]),
                KeywordGroup::new("healthy", &["healthy", "light", "fresh"]),
                KeywordGroup::new("indulgent", &["indulgent", "rich", "treat myself"]),
                KeywordGroup::new("quick", &["quick", "fast", "hurry"]),
                KeywordGroup::new("fancy", &["fancy", "special", "gourmet"]),
            ],
            food_categories: vec![
                KeywordGroup::new(
                    "burgers",
                    &["burger", "hamburger", "cheeseburger", "beef burger", "chicken burger"],
                ),
                KeywordGroup::new("pizza", &["pizza", "margherita", "pepperoni", "cheese pizza"]),
                KeywordGroup::new("tacos", &["taco", "burrito", "quesadilla", "mexican"]),
                KeywordGroup::new(
                    "desserts",
                    &["dessert", "cake", "ice cream", "cookie", "sweet", "chocolate", "pie"],
                ),
                KeywordGroup::new("salads", &["salad", "caesar", "garden", "healthy", "greens"]),
                KeywordGroup::new(
                    "drinks",
                    &["drink", "beverage", "soda", "juice", "coffee", "tea"],
                ),
                KeywordGroup::new("sandwiches", &["sandwich", "sub", "wrap", "panini"]),
                KeywordGroup::new(
                    "pasta",
                    &["pasta", "spaghetti", "fettuccine", "lasagna", "ravioli"],
                ),
                KeywordGroup::new("chicken", &["chicken", "wings", "nuggets", "fried chicken"]),
                KeywordGroup::new("seafood", &["fish", "shrimp", "salmon", "seafood", "lobster"]),
            ],
            dietary_labels: vec![
                KeywordGroup::new(
                    "vegetarian",
                    &["vegetarian", "veg", "veggie", "no meat", "plant-based"],
                ),
                KeywordGroup::new(
                    "vegan",
                    &["vegan", "plant-based", "no animal products", "dairy-free and vegetarian"],
                ),
                KeywordGroup::new(
                    "gluten-free",
                    &["gluten-free", "gluten free", "no gluten", "celiac"],
                ),
                KeywordGroup::new(
                    "dairy-free",
                    &["dairy-free", "dairy free", "no dairy", "lactose-free", "no milk"],
                ),
                KeywordGroup::new("keto", &["keto", "ketogenic", "low-carb", "no carbs"]),
                KeywordGroup::new("low-carb", &["low-carb", "low carb", "no carbs", "carb-free"]),
            ],
            occasion_moods: vec![
                KeywordGroup::new("comfort", &["comfort", "cozy", "warm"]),
                KeywordGroup::new("healthy", &["healthy", "light", "fresh", "clean"]),
                KeywordGroup::new("indulgent", &["indulgent", "rich", "decadent", "treat"]),
                KeywordGroup::new("spicy", &["spicy", "hot", "kick"]),
                KeywordGroup::new("quick", &["quick", "fast", "grab"]),
                KeywordGroup::new("fancy", &["fancy", "special", "gourmet"]),
            ],
        }
    }
}

pub fn contains_any(normalized: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| normalized.contains(keyword.as_str()))
}

pub fn count_matches(normalized: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|keyword| normalized.contains(keyword.as_str())).count()
}

pub fn matched_keywords<'a>(normalized: &str, keywords: &'a [String]) -> Vec<&'a str> {
    keywords
        .iter()
        .filter(|keyword| normalized.contains(keyword.as_str()))
        .map(String::as_str)
        .collect()
}

/// Labels of every group with at least one matching keyword, in table order.
pub fn matched_labels(normalized: &str, groups: &[KeywordGroup]) -> Vec<String> {
    groups
        .iter()
        .filter(|group| group.matches(normalized))
        .map(|group| group.label.clone())
        .collect()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| (*word).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{count_matches, matched_labels, Lexicon, LEXICON_VERSION};

    #[test]
    fn default_lexicon_is_versioned() {
        assert_eq!(Lexicon::default().version, LEXICON_VERSION);
    }

    #[test]
    fn keywords_match_inside_longer_words() {
        let lexicon = Lexicon::default();
        // "hot" inside "photo" is a known containment quirk.
        assert_eq!(count_matches("nice photo", &lexicon.specific_preferences), 1);
    }

    #[test]
    fn synonyms_collapse_to_canonical_labels_in_table_order() {
        let lexicon = Lexicon::default();
        let labels = matched_labels("something cozy and fresh", &lexicon.conversation_moods);
        assert_eq!(labels, vec!["comfort".to_string(), "healthy".to_string()]);
    }

    #[test]
    fn custom_lexicon_can_be_loaded_as_data() {
        let mut raw = serde_json::to_value(Lexicon::default()).expect("encode lexicon");
        raw["order_intent"] = serde_json::json!(["ring it up"]);

        let custom: Lexicon = serde_json::from_value(raw).expect("decode lexicon");
        assert_eq!(custom.order_intent, vec!["ring it up".to_string()]);
        assert_eq!(custom.food_categories, Lexicon::default().food_categories);
    }
}

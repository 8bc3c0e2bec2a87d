use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lexicon::{contains_any, count_matches, matched_labels, Lexicon};
use crate::domain::conversation::BudgetHint;

// Checked in order; the first pattern that matches anywhere decides the hint.
static BUDGET_HINT_PATTERNS: LazyLock<Vec<(Regex, BudgetKind)>> = LazyLock::new(|| {
    [
        (r"under \$?(\d+)", BudgetKind::Cap),
        (r"below \$?(\d+)", BudgetKind::Cap),
        (r"less than \$?(\d+)", BudgetKind::Cap),
        (r"around \$?(\d+)", BudgetKind::Target),
        (r"about \$?(\d+)", BudgetKind::Target),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("budget pattern compiles"), kind))
    .collect()
});

static BARE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("amount pattern compiles"));

#[derive(Clone, Copy, Debug)]
enum BudgetKind {
    Cap,
    Target,
}

/// Engagement signals found in one message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    pub specific_preferences: usize,
    pub dietary_mention: bool,
    pub budget_mention: bool,
    pub mood: bool,
    pub question: bool,
    pub enthusiasm: usize,
    pub price_inquiry: bool,
    pub order_intent: bool,
    pub hesitation: bool,
    pub budget_concern: bool,
    pub rejection: bool,
}

/// What the current message asks the recommender for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageIntent {
    pub categories: Vec<String>,
    pub budget: Option<BudgetHint>,
    pub dietary: Vec<String>,
    pub moods: Vec<String>,
}

impl MessageIntent {
    pub fn first_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignalDetector {
    lexicon: Lexicon,
}

impl SignalDetector {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn detect(&self, message: &str) -> SignalSet {
        let normalized = message.to_lowercase();
        let lexicon = &self.lexicon;

        let budget_concern = contains_any(&normalized, &lexicon.budget_concern)
            && contains_any(&normalized, &lexicon.budget_concern_qualifiers);

        SignalSet {
            specific_preferences: count_matches(&normalized, &lexicon.specific_preferences),
            dietary_mention: contains_any(&normalized, &lexicon.dietary_mentions),
            budget_mention: mentions_budget(&normalized),
            mood: contains_any(&normalized, &lexicon.mood_indicators),
            question: message.contains('?') || contains_any(&normalized, &lexicon.questions),
            enthusiasm: count_matches(&normalized, &lexicon.enthusiasm),
            price_inquiry: contains_any(&normalized, &lexicon.price_inquiry),
            order_intent: contains_any(&normalized, &lexicon.order_intent),
            hesitation: contains_any(&normalized, &lexicon.hesitation),
            budget_concern,
            rejection: contains_any(&normalized, &lexicon.rejection),
        }
    }

    pub fn intent(&self, message: &str) -> MessageIntent {
        let normalized = message.to_lowercase();

        MessageIntent {
            categories: matched_labels(&normalized, &self.lexicon.food_categories),
            budget: budget_hint(&normalized),
            dietary: matched_labels(&normalized, &self.lexicon.dietary_labels),
            moods: matched_labels(&normalized, &self.lexicon.occasion_moods),
        }
    }
}

fn mentions_budget(normalized: &str) -> bool {
    BUDGET_HINT_PATTERNS.iter().any(|(pattern, _)| pattern.is_match(normalized))
        || BARE_AMOUNT.is_match(normalized)
}

/// An amount that does not parse leaves the hint unset.
pub fn budget_hint(normalized: &str) -> Option<BudgetHint> {
    let (captures, kind) = BUDGET_HINT_PATTERNS
        .iter()
        .find_map(|(pattern, kind)| {
            pattern.captures(normalized).map(|captures| (captures, *kind))
        })?;
    let amount = captures.get(1)?.as_str().parse::<f64>().ok().filter(|value| value.is_finite())?;

    Some(match kind {
        BudgetKind::Cap => BudgetHint::Under(amount),
        BudgetKind::Target => BudgetHint::Around(amount),
    })
}

#[cfg(test)]
mod tests {
    use super::{budget_hint, SignalDetector};
    use crate::domain::conversation::BudgetHint;

    #[test]
    fn counts_every_matching_preference_keyword() {
        let signals = SignalDetector::default().detect("A spicy, crispy chicken please");
        assert_eq!(signals.specific_preferences, 3);
    }

    #[test]
    fn question_mark_alone_counts_as_a_question() {
        let signals = SignalDetector::default().detect("burgers?");
        assert!(signals.question);
    }

    #[test]
    fn budget_concern_needs_a_qualifier() {
        let detector = SignalDetector::default();
        assert!(!detector.detect("is this affordable").budget_concern);
        assert!(detector.detect("that is too pricey").budget_concern);
    }

    #[test]
    fn price_inquiry_and_order_intent_use_distinct_phrases() {
        let detector = SignalDetector::default();
        let inquiry = detector.detect("How much is the combo");
        assert!(inquiry.price_inquiry);
        assert!(!inquiry.order_intent);

        let order = detector.detect("Add to cart");
        assert!(order.order_intent);
        assert!(!order.price_inquiry);
    }

    #[test]
    fn bare_dollar_amount_is_a_budget_mention() {
        let detector = SignalDetector::default();
        assert!(detector.detect("got $12 on me").budget_mention);
        assert!(!detector.detect("got twelve bucks").budget_mention);
    }

    #[test]
    fn budget_hint_prefers_caps_over_targets() {
        assert_eq!(budget_hint("around $20 or under $15"), Some(BudgetHint::Under(15.0)));
        assert_eq!(budget_hint("about 8 dollars"), Some(BudgetHint::Around(8.0)));
        assert_eq!(budget_hint("whatever works"), None);
    }

    #[test]
    fn intent_lists_categories_in_table_order() {
        let intent = SignalDetector::default().intent("Pizza or a burger, vegan, something cozy");
        assert_eq!(intent.categories, vec!["burgers".to_string(), "pizza".to_string()]);
        // "veg" is a vegetarian trigger and sits inside "vegan".
        assert_eq!(intent.dietary, vec!["vegetarian".to_string(), "vegan".to_string()]);
        assert_eq!(intent.moods, vec!["comfort".to_string()]);
        assert_eq!(intent.first_category(), Some("burgers"));
    }
}

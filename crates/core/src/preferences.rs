//! Persistent user attributes mined from a message.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{BudgetHint, Conversation};
use crate::signals::lexicon::{matched_keywords, matched_labels};
use crate::signals::{budget_hint, Lexicon};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPreferences {
    /// Descriptor keywords as they matched ("spicy", "korean").
    pub specific: BTreeSet<String>,
    /// Dietary keywords as they matched ("vegetarian", "no dairy").
    pub dietary: BTreeSet<String>,
    /// Canonical mood labels.
    pub moods: BTreeSet<String>,
    pub budget: Option<BudgetHint>,
}

impl ExtractedPreferences {
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty()
            && self.dietary.is_empty()
            && self.moods.is_empty()
            && self.budget.is_none()
    }

    /// Union into the conversation. Nothing already recorded is removed; a new
    /// budget hint replaces the previous one.
    pub fn merge_into(&self, conversation: &mut Conversation) {
        conversation.preferences.extend(self.specific.iter().cloned());
        conversation.dietary_restrictions.extend(self.dietary.iter().cloned());
        conversation.mood_tags.extend(self.moods.iter().cloned());
        if let Some(budget) = self.budget {
            conversation.budget_hint = Some(budget);
        }
    }
}

pub fn extract(lexicon: &Lexicon, message: &str) -> ExtractedPreferences {
    let normalized = message.to_lowercase();

    ExtractedPreferences {
        specific: owned(matched_keywords(&normalized, &lexicon.specific_preferences)),
        dietary: owned(matched_keywords(&normalized, &lexicon.dietary_mentions)),
        moods: matched_labels(&normalized, &lexicon.conversation_moods).into_iter().collect(),
        budget: budget_hint(&normalized),
    }
}

fn owned(keywords: Vec<&str>) -> BTreeSet<String> {
    keywords.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::extract;
    use crate::domain::conversation::{BudgetHint, Conversation, ConversationId};
    use crate::signals::Lexicon;

    #[test]
    fn moods_are_stored_under_canonical_labels() {
        let extracted = extract(&Lexicon::default(), "I want to try something new, in a hurry");
        assert_eq!(
            extracted.moods.into_iter().collect::<Vec<_>>(),
            vec!["adventurous".to_string(), "quick".to_string()]
        );
    }

    #[test]
    fn dietary_keywords_are_kept_verbatim() {
        let extracted = extract(&Lexicon::default(), "I'm vegetarian, no dairy please");
        assert!(extracted.dietary.contains("vegetarian"));
        assert!(extracted.dietary.contains("no dairy"));
        assert_eq!(extracted.dietary.len(), 2);
    }

    #[test]
    fn merging_is_idempotent_and_never_forgets() {
        let lexicon = Lexicon::default();
        let mut conversation = Conversation::new(ConversationId("conv-merge".to_string()));

        extract(&lexicon, "spicy korean, vegan").merge_into(&mut conversation);
        let after_first = conversation.clone();
        extract(&lexicon, "spicy korean, vegan").merge_into(&mut conversation);
        assert_eq!(conversation, after_first);

        extract(&lexicon, "something cozy").merge_into(&mut conversation);
        assert!(conversation.preferences.contains("spicy"));
        assert!(conversation.preferences.contains("korean"));
        assert!(conversation.dietary_restrictions.contains("vegan"));
        assert!(conversation.mood_tags.contains("comfort"));
    }

    #[test]
    fn latest_budget_hint_wins() {
        let lexicon = Lexicon::default();
        let mut conversation = Conversation::new(ConversationId("conv-budget".to_string()));

        extract(&lexicon, "under $15").merge_into(&mut conversation);
        extract(&lexicon, "no budget talk here").merge_into(&mut conversation);
        assert_eq!(conversation.budget_hint, Some(BudgetHint::Under(15.0)));

        extract(&lexicon, "around $20 is fine").merge_into(&mut conversation);
        assert_eq!(conversation.budget_hint, Some(BudgetHint::Around(20.0)));
    }
}

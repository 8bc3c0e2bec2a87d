//! Lexical signal detection over free-text chat messages.

mod detector;
pub mod lexicon;

pub use detector::{budget_hint, MessageIntent, SignalDetector, SignalSet};
pub use lexicon::{KeywordGroup, Lexicon, LEXICON_VERSION};

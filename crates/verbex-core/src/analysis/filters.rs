//! Stages 3-5 of the analysis pipeline: length filter, stop-word removal,
//! lemmatization. Each runs over the surviving token list in order; none of
//! them renumber `word_index`, so positions still reflect the original text.

use super::token::Token;
use crate::config::{LemmatizerHook, StopWordHook};

/// A single analysis stage operating on the token stream.
pub trait TokenFilter: Send + Sync {
    /// Transform or discard tokens. Must not reorder surviving tokens.
    fn apply(&self, tokens: Vec<Token>) -> Vec<Token>;

    /// Stage name, used only for diagnostics.
    fn name(&self) -> &'static str;
}

/// Discards tokens shorter than `min` (if `min > 0`) or longer than `max`
/// (if `max > 0`), counted in code points.
pub struct LengthFilter {
    pub min: usize,
    pub max: usize,
}

impl TokenFilter for LengthFilter {
    fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter(|t| {
                let len = t.text.chars().count();
                (self.min == 0 || len >= self.min) && (self.max == 0 || len <= self.max)
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

/// Discards tokens the configured hook (or the built-in English list)
/// reports as stop words.
pub struct StopWordFilter {
    pub is_stop_word: StopWordHook,
}

impl StopWordFilter {
    pub fn english() -> Self {
        Self {
            is_stop_word: std::sync::Arc::new(|token: &str| ENGLISH_STOP_WORDS.contains(&token)),
        }
    }
}

impl TokenFilter for StopWordFilter {
    fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter(|t| !(self.is_stop_word)(&t.text))
            .collect()
    }

    fn name(&self) -> &'static str {
        "stop_words"
    }
}

/// Replaces each surviving token's text with its lemma via the configured
/// hook. Offsets and word indices are unchanged.
pub struct LemmatizerFilter {
    pub normalize: LemmatizerHook,
}

impl TokenFilter for LemmatizerFilter {
    fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|mut t| {
                t.text = (self.normalize)(&t.text);
                t
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "lemmatizer"
    }
}

/// Default English stop-word list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "me", "more",
    "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
    "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "you", "your", "yours", "yourself", "yourselves",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str) -> Token {
        Token::new(text.to_string(), 0, 0)
    }

    #[test]
    fn length_filter_discards_short_and_long() {
        let filter = LengthFilter { min: 3, max: 5 };
        let tokens = vec![tok("a"), tok("cat"), tok("archipelago"), tok("dog")];
        let kept: Vec<&str> = filter.apply(tokens).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(kept, vec!["cat", "dog"]);
    }

    #[test]
    fn length_filter_zero_disables() {
        let filter = LengthFilter { min: 0, max: 0 };
        let tokens = vec![tok("a"), tok("archipelago")];
        assert_eq!(filter.apply(tokens).len(), 2);
    }

    #[test]
    fn stop_word_filter_removes_english_stop_words() {
        let filter = StopWordFilter::english();
        let tokens = vec![tok("the"), tok("fox"), tok("and"), tok("dog")];
        let kept: Vec<&str> = filter.apply(tokens).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(kept, vec!["fox", "dog"]);
    }

    #[test]
    fn lemmatizer_filter_applies_hook() {
        let filter = LemmatizerFilter {
            normalize: std::sync::Arc::new(|t| t.trim_end_matches('s').to_string()),
        };
        let tokens = vec![tok("cats"), tok("dogs")];
        let kept: Vec<&str> = filter.apply(tokens).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(kept, vec!["cat", "dog"]);
    }
}

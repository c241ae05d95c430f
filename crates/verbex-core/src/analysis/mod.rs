//! Analysis pipeline: tokenize -> lowercase -> length-filter -> stop-word ->
//! lemmatize. Holds no mutable state across calls, so one `Analyzer` can be
//! shared freely across reader and writer threads.

mod filters;
mod token;
mod tokenizer;

pub use filters::{LengthFilter, LemmatizerFilter, StopWordFilter, TokenFilter, ENGLISH_STOP_WORDS};
pub use token::Token;
pub use tokenizer::tokenize;

use crate::config::IndexConfig;

/// The fixed analysis pipeline, parameterized by an index's configuration.
pub struct Analyzer {
    filters: Vec<Box<dyn TokenFilter>>,
}

impl Analyzer {
    /// Build the pipeline described by `config`: length filter (if any
    /// bound is set), stop-word removal (if enabled), lemmatization (if
    /// enabled) — in that fixed order.
    pub fn from_config(config: &IndexConfig) -> Self {
        let mut filters: Vec<Box<dyn TokenFilter>> = Vec::new();

        if config.min_token_length > 0 || config.max_token_length > 0 {
            filters.push(Box::new(LengthFilter {
                min: config.min_token_length,
                max: config.max_token_length,
            }));
        }

        if config.enable_stop_word_removal {
            filters.push(Box::new(match &config.stop_word_hook {
                Some(hook) => StopWordFilter {
                    is_stop_word: hook.clone(),
                },
                None => StopWordFilter::english(),
            }));
        }

        if config.enable_lemmatizer {
            if let Some(hook) = &config.lemmatizer_hook {
                filters.push(Box::new(LemmatizerFilter {
                    normalize: hook.clone(),
                }));
            }
        }

        Self { filters }
    }

    /// An analyzer with no optional stages enabled — tokenize + lowercase only.
    pub fn identity() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Run the full pipeline over `text`, returning surviving tokens in
    /// original order with `word_index`/`char_offset` intact.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = tokenizer::tokenize(text);
        for token in &mut tokens {
            token.text = token.text.to_lowercase();
        }
        for filter in &self.filters {
            tokens = filter.apply(tokens);
        }
        tokens
    }

    /// Run the pipeline over a query string, returning the distinct terms
    /// in first-occurrence order. Offsets/positions are not meaningful for
    /// queries and are discarded.
    pub fn analyze_query(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut terms = Vec::new();
        for token in self.analyze(text) {
            if seen.insert(token.text.clone()) {
                terms.push(token.text);
            }
        }
        terms
    }
}

/// Per-term aggregation of a document's tokens, as produced by
/// [`group_by_term`] and consumed by the indexing service.
#[derive(Debug, Clone)]
pub struct TermOccurrence {
    pub term: String,
    pub frequency: usize,
    pub char_positions: Vec<i64>,
    pub word_positions: Vec<i64>,
}

/// Groups analyzed tokens by normalized term text, producing one
/// [`TermOccurrence`] per distinct term with its position arrays sorted
/// ascending by construction (tokens arrive in original-text order).
pub fn group_by_term(tokens: Vec<Token>) -> Vec<TermOccurrence> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, TermOccurrence> =
        std::collections::HashMap::new();

    for token in tokens {
        let entry = groups.entry(token.text.clone()).or_insert_with(|| {
            order.push(token.text.clone());
            TermOccurrence {
                term: token.text.clone(),
                frequency: 0,
                char_positions: Vec::new(),
                word_positions: Vec::new(),
            }
        });
        entry.frequency += 1;
        entry.char_positions.push(token.char_offset as i64);
        entry.word_positions.push(token.word_index as i64);
    }

    order
        .into_iter()
        .map(|term| groups.remove(&term).expect("term present in map"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_is_deterministic_for_fixed_config() {
        let analyzer = Analyzer::identity();
        let a = analyzer.analyze("The Quick Brown Fox");
        let b = analyzer.analyze("The Quick Brown Fox");
        assert_eq!(a, b);
    }

    #[test]
    fn analyze_lowercases() {
        let analyzer = Analyzer::identity();
        let tokens = analyzer.analyze("HELLO World");
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["hello", "world"]);
    }

    #[test]
    fn group_by_term_aggregates_repeated_terms_in_order() {
        let analyzer = Analyzer::identity();
        let tokens = analyzer.analyze("alpha beta alpha gamma alpha");
        let groups = group_by_term(tokens);
        assert_eq!(groups.len(), 3);
        let alpha = groups.iter().find(|g| g.term == "alpha").unwrap();
        assert_eq!(alpha.frequency, 3);
        assert_eq!(alpha.word_positions, vec![0, 2, 4]);
        assert!(alpha.char_positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn analyze_query_dedups_preserving_first_occurrence() {
        let analyzer = Analyzer::identity();
        let terms = analyzer.analyze_query("machine learning machine vision");
        assert_eq!(terms, vec!["machine", "learning", "vision"]);
    }

    #[test]
    fn from_config_applies_length_and_stop_word_filters() {
        let mut config = IndexConfig::in_memory("t");
        config.min_token_length = 4;
        config.enable_stop_word_removal = true;
        let analyzer = Analyzer::from_config(&config);
        let words: Vec<String> = analyzer
            .analyze("the fox and a very quick jump")
            .into_iter()
            .map(|t| t.text)
            .collect();
        // "the"/"and"/"a" are stop words and short; "very"/"fox"/"jump" survive length>=4 and non-stopword
        assert!(words.contains(&"quick".to_string()));
        assert!(!words.contains(&"the".to_string()));
        assert!(!words.contains(&"fox".to_string()));
    }
}

//! Token representation shared by every analysis stage.

/// A single surviving token after tokenization and zero or more filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Current text of the token (mutated in place by lowercase/lemmatize).
    pub text: String,
    /// 0-based start offset in code points within the original text.
    pub char_offset: usize,
    /// 0-based index over emitted tokens, monotonic regardless of later
    /// stages discarding tokens.
    pub word_index: usize,
}

impl Token {
    pub(crate) fn new(text: String, char_offset: usize, word_index: usize) -> Self {
        Self {
            text,
            char_offset,
            word_index,
        }
    }
}

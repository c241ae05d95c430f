//! Stage 1 of the analysis pipeline: split raw text into maximal
//! alphanumeric runs, recording code-point offsets and word positions.

use super::token::Token;

/// Splits `text` at every transition between alphanumeric and
/// non-alphanumeric Unicode code points. Each maximal alphanumeric run
/// becomes one token; offsets and word indices are counted in code points,
/// not bytes, so multi-byte UTF-8 input reports the same offsets a
/// code-point-oriented client would expect.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_start = 0usize;
    let mut word_index = 0usize;

    for (char_idx, ch) in text.chars().enumerate() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                current_start = char_idx;
            }
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(Token::new(
                std::mem::take(&mut current),
                current_start,
                word_index,
            ));
            word_index += 1;
        }
    }

    if !current.is_empty() {
        tokens.push(Token::new(current, current_start, word_index));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_punctuation_and_whitespace() {
        let tokens = tokenize("The quick-brown fox.");
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["The", "quick", "brown", "fox"]);
    }

    #[test]
    fn word_index_is_monotonic_and_offsets_are_code_points() {
        let tokens = tokenize("café au lait");
        assert_eq!(tokens[0].text, "café");
        assert_eq!(tokens[0].char_offset, 0);
        assert_eq!(tokens[0].word_index, 0);
        assert_eq!(tokens[1].text, "au");
        assert_eq!(tokens[1].word_index, 1);
        // "café " is 5 code points, "au" starts at offset 5
        assert_eq!(tokens[1].char_offset, 5);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ...   ").is_empty());
    }
}

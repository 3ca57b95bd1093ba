//! Word-boundary tokenization and message token normalization.

use std::sync::OnceLock;

use regex::Regex;

use super::lemmatize::Lemmatizer;

/// Clitics split off the end of a word, in match order.
const CLITICS: &[&str] = &[
    "n't", "n’t", "'s", "’s", "'re", "’re", "'ve", "’ve", "'ll", "’ll", "'d", "’d", "'m", "’m",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}_]+(?:['’.\-][\p{L}\p{N}_]+|,\p{N}+)*|\.\.\.|[^\s\p{L}\p{N}_]")
            .expect("word tokenizer regex must compile")
    })
}

/// Split text into word and punctuation tokens.
///
/// Words may contain internal apostrophes, periods, and hyphens, and digit
/// groups separated by commas stay together. Trailing clitics are split off
/// (`don't` becomes `do` + `n't`). Every other non-space character is a token
/// of its own, except `...`.
pub fn word_tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for found in word_pattern().find_iter(text) {
        let word = found.as_str();
        match split_clitic(word) {
            Some((head, clitic)) => {
                tokens.push(head.to_string());
                tokens.push(clitic.to_string());
            }
            None => tokens.push(word.to_string()),
        }
    }
    tokens
}

fn split_clitic(word: &str) -> Option<(&str, &str)> {
    let lower = word.to_lowercase();
    if lower.len() != word.len() {
        return None;
    }
    CLITICS.iter().find_map(|clitic| {
        if lower.len() > clitic.len() && lower.ends_with(clitic) {
            let at = word.len() - clitic.len();
            word.is_char_boundary(at).then(|| word.split_at(at))
        } else {
            None
        }
    })
}

/// Normalize a raw message into cleaned tokens.
///
/// Each word token is lemmatized, then lowercased, then trimmed. Order is
/// preserved and duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    let lemmatizer = Lemmatizer::shared();
    word_tokenize(text)
        .iter()
        .map(|token| lemmatizer.lemmatize(token).to_lowercase().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_punctuation() {
        assert_eq!(
            word_tokenize("We need water, food and tents!"),
            vec!["We", "need", "water", ",", "food", "and", "tents", "!"]
        );
    }

    #[test]
    fn keeps_internal_joiners_and_digit_groups() {
        assert_eq!(
            word_tokenize("1,000 well-being kits... 3.5 tonnes"),
            vec!["1,000", "well-being", "kits", "...", "3.5", "tonnes"]
        );
    }

    #[test]
    fn splits_contractions() {
        assert_eq!(
            word_tokenize("Don't panic, it's fine. We'll come"),
            vec!["Do", "n't", "panic", ",", "it", "'s", "fine", ".", "We", "'ll", "come"]
        );
        assert_eq!(word_tokenize("can’t"), vec!["ca", "n’t"]);
    }

    #[test]
    fn empty_and_whitespace_input_yields_no_tokens() {
        assert!(word_tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
    }

    #[test]
    fn tokens_are_lowercase_and_trimmed() {
        let tokens = tokenize("Running dogs");
        assert_eq!(tokens.len(), 2);
        for token in &tokens {
            assert_eq!(token, &token.to_lowercase());
            assert_eq!(token, token.trim());
        }
        assert_eq!(tokens, vec!["running", "dog"]);
    }

    #[test]
    fn capitalized_words_skip_lemmatization() {
        assert_eq!(tokenize("Dogs barked"), vec!["dogs", "barked"]);
        assert_eq!(tokenize("dogs barked"), vec!["dog", "barked"]);
    }

    #[test]
    fn lowercase_input_is_lemmatized() {
        assert_eq!(
            tokenize("families need medical supplies"),
            vec!["family", "need", "medical", "supply"]
        );
    }

    #[test]
    fn order_and_duplicates_are_preserved() {
        assert_eq!(
            tokenize("help help HELP"),
            vec!["help", "help", "help"]
        );
    }
}

//! Rule-based noun lemmatizer.
//!
//! Reduces plural nouns to their singular base form using an irregular-form
//! table followed by suffix-stripping rules, in the spirit of WordNet's noun
//! morphology. The lexicon is keyed on lowercase forms: tokens that contain
//! anything other than lowercase ASCII letters are returned unchanged.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Irregular plural forms mapped to their base form.
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("firemen", "fireman"),
    ("policemen", "policeman"),
    ("fishermen", "fisherman"),
    ("gentlemen", "gentleman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("selves", "self"),
    ("thieves", "thief"),
    ("wolves", "wolf"),
    ("loaves", "loaf"),
    ("calves", "calf"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("heroes", "hero"),
    ("echoes", "echo"),
    ("volcanoes", "volcano"),
    ("tornadoes", "tornado"),
    ("mosquitoes", "mosquito"),
    ("buses", "bus"),
    ("viruses", "virus"),
    ("statuses", "status"),
    ("bonuses", "bonus"),
    ("campuses", "campus"),
    ("censuses", "census"),
    ("gases", "gas"),
    ("canvases", "canvas"),
    ("atlases", "atlas"),
    ("quizzes", "quiz"),
    ("crises", "crisis"),
    ("analyses", "analysis"),
    ("diagnoses", "diagnosis"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("data", "datum"),
];

/// Words that end like plurals but are already base forms.
const INVARIANT_WORDS: &[&str] = &[
    "news",
    "series",
    "species",
    "means",
    "physics",
    "politics",
    "economics",
    "mathematics",
    "measles",
    "mumps",
    "diabetes",
    "rabies",
    "scabies",
    "herpes",
    "always",
    "perhaps",
    "towards",
    "whereas",
    "besides",
    "afterwards",
    "sometimes",
    "nowadays",
    "unless",
    "across",
    "does",
    "plus",
    "minus",
    "ours",
    "yours",
    "theirs",
    "hers",
];

/// `-ache` nouns whose plural only adds `s`.
const ACHE_NOUNS: &[&str] = &[
    "ache",
    "headache",
    "toothache",
    "stomachache",
    "backache",
    "earache",
    "cache",
    "moustache",
    "mustache",
];

/// Minimum word length eligible for suffix stripping.
const MIN_STRIP_LEN: usize = 4;

/// Noun lemmatizer with its lexicon tables loaded.
#[derive(Debug)]
pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
    invariant: HashSet<&'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    /// Build a lemmatizer from the built-in tables.
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR_NOUNS.iter().copied().collect(),
            invariant: INVARIANT_WORDS.iter().copied().collect(),
        }
    }

    /// Process-wide lemmatizer, built on first use.
    pub fn shared() -> &'static Lemmatizer {
        static SHARED: OnceLock<Lemmatizer> = OnceLock::new();
        SHARED.get_or_init(|| {
            tracing::debug!(
                irregular = IRREGULAR_NOUNS.len(),
                invariant = INVARIANT_WORDS.len(),
                "Lemmatizer tables loaded"
            );
            Lemmatizer::new()
        })
    }

    /// Return the base form of `word`, borrowing when nothing changes.
    pub fn lemmatize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        if word.is_empty() || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return Cow::Borrowed(word);
        }
        if let Some(base) = self.irregular.get(word) {
            return Cow::Owned((*base).to_string());
        }
        if word.len() < MIN_STRIP_LEN || self.invariant.contains(word) {
            return Cow::Borrowed(word);
        }
        strip_plural_suffix(word)
    }
}

fn strip_plural_suffix(word: &str) -> Cow<'_, str> {
    if !word.ends_with('s') || ["ss", "us", "is"].iter().any(|end| word.ends_with(end)) {
        return Cow::Borrowed(word);
    }
    if word.len() > 4 && word.ends_with("ies") {
        let stem = &word[..word.len() - 3];
        return Cow::Owned(format!("{stem}y"));
    }
    if word.ends_with("aches") && ACHE_NOUNS.contains(&&word[..word.len() - 1]) {
        return Cow::Borrowed(&word[..word.len() - 1]);
    }
    if ["sses", "xes", "ches", "shes", "zzes"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return Cow::Borrowed(&word[..word.len() - 2]);
    }
    Cow::Borrowed(&word[..word.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(word: &str) -> String {
        Lemmatizer::new().lemmatize(word).into_owned()
    }

    #[test]
    fn regular_plurals_are_singularized() {
        assert_eq!(lemma("dogs"), "dog");
        assert_eq!(lemma("houses"), "house");
        assert_eq!(lemma("tents"), "tent");
    }

    #[test]
    fn suffix_rules_cover_es_and_ies_endings() {
        assert_eq!(lemma("supplies"), "supply");
        assert_eq!(lemma("casualties"), "casualty");
        assert_eq!(lemma("boxes"), "box");
        assert_eq!(lemma("churches"), "church");
        assert_eq!(lemma("dishes"), "dish");
        assert_eq!(lemma("classes"), "class");
        assert_eq!(lemma("buzzes"), "buzz");
        assert_eq!(lemma("headaches"), "headache");
        assert_eq!(lemma("aches"), "ache");
        assert_eq!(lemma("beaches"), "beach");
        assert_eq!(lemma("approaches"), "approach");
        assert_eq!(lemma("reaches"), "reach");
        assert_eq!(lemma("coaches"), "coach");
        assert_eq!(lemma("ties"), "tie");
    }

    #[test]
    fn latin_and_greek_s_plurals_keep_their_stem() {
        assert_eq!(lemma("viruses"), "virus");
        assert_eq!(lemma("gases"), "gas");
        assert_eq!(lemma("statuses"), "status");
        assert_eq!(lemma("bonuses"), "bonus");
    }

    #[test]
    fn irregular_forms_use_the_exception_table() {
        assert_eq!(lemma("children"), "child");
        assert_eq!(lemma("women"), "woman");
        assert_eq!(lemma("wives"), "wife");
        assert_eq!(lemma("volcanoes"), "volcano");
        assert_eq!(lemma("crises"), "crisis");
    }

    #[test]
    fn base_forms_and_short_words_pass_through() {
        for word in ["water", "crisis", "virus", "glass", "news", "is", "gas", "diabetes"] {
            assert_eq!(lemma(word), word);
        }
    }

    #[test]
    fn non_lowercase_tokens_are_outside_the_lexicon() {
        assert_eq!(lemma("Dogs"), "Dogs");
        assert_eq!(lemma("n't"), "n't");
        assert_eq!(lemma("1990s"), "1990s");
        assert_eq!(lemma(""), "");
    }

    #[test]
    fn unchanged_words_are_borrowed() {
        let lemmatizer = Lemmatizer::new();
        assert!(matches!(lemmatizer.lemmatize("water"), Cow::Borrowed("water")));
        assert!(matches!(lemmatizer.lemmatize("dogs"), Cow::Borrowed("dog")));
    }

    #[test]
    fn shared_instance_is_memoized() {
        let first = Lemmatizer::shared() as *const Lemmatizer;
        let second = Lemmatizer::shared() as *const Lemmatizer;
        assert_eq!(first, second);
    }
}

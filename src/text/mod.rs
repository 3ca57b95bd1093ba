//! Message text normalization: word tokenization and lemmatization.

pub mod lemmatize;
pub mod tokenize;

pub use lemmatize::Lemmatizer;
pub use tokenize::{tokenize, word_tokenize};

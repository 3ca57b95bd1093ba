//! Corpus loading and train/test splitting.

pub mod loader;
pub mod split;

pub use loader::{LoadError, MessageCorpus, load_corpus, load_data};
pub use split::{SplitError, SplitIndices, train_test_split};

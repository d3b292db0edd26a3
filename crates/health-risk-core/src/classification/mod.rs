pub mod classifier;
pub mod taxonomy;

pub use classifier::{
    AccountClassifier, Classification, MatchMethod, KEYWORD_SUBCATEGORY, UNCLASSIFIED_SUBCATEGORY,
};
pub use taxonomy::{builtin_entries, Category, Taxonomy, TaxonomyEntry};

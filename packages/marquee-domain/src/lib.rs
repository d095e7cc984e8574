//! Catalog model and the pure pieces of the agent: vocabulary, fuzzy correction, filter
//! compilation and popularity ranking. Nothing in this crate performs I/O.

pub mod catalog;
pub mod filter;
pub mod fuzzy;
pub mod popularity;
pub mod vocabulary;

pub use catalog::{Item, ItemField, ItemId, RatingCounts, User, UserField, UserGroup, UserId};
pub use filter::{
	Comparison, Compilation, CompiledPredicate, Condition, CorrectionRecord, FailedCorrection,
	FilterOutcome, FilterRequest, NumericField, NumericFilter,
};
pub use vocabulary::{TextField, VocabularyIndex};

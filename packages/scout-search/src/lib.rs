pub mod fuzzy;
pub mod generation;
pub mod query;
pub mod store;
pub mod text;

mod context;
mod error;

pub use error::{Error, Result};
pub use fuzzy::{FuzzyIndex, FuzzyOptions, LevenshteinIndex, ScoredHit};
pub use generation::{GenerationStats, IndexGeneration};
pub use query::{
	AliasExplanation, CollectionFilter, ContextEntry, MatchProvenance, QueryGroup, QueryHit,
	QueryOptions, QueryResponse,
};
pub use store::IndexStore;

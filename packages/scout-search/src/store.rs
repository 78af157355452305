use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;

use crate::{
	error::{Error, Result},
	fuzzy::{FuzzyIndex, LevenshteinIndex},
	generation::{GenerationStats, IndexGeneration},
	query::{QueryOptions, QueryResponse},
};
use scout_config::Config;
use scout_domain::{Actor, Dataset, Record};

/// Holds the live [`IndexGeneration`] and swaps it as a unit on rebuild.
///
/// Readers clone the current `Arc` and never observe a partially built generation. A build
/// that finishes after a newer one has been published is discarded.
pub struct IndexStore<I = LevenshteinIndex>
where
	I: FuzzyIndex,
{
	current: RwLock<Option<Arc<IndexGeneration<I>>>>,
	next_number: AtomicU64,
}
impl<I> IndexStore<I>
where
	I: FuzzyIndex,
{
	pub fn new() -> Self {
		Self { current: RwLock::new(None), next_number: AtomicU64::new(1) }
	}

	/// Rebuilds every index for `actor` and publishes the result. Returns the generation
	/// number now live.
	pub fn set_index_data(&self, dataset: &Dataset, config: Config, actor: &Actor) -> u64 {
		let number = self.next_number.fetch_add(1, Ordering::Relaxed);
		let generation = Arc::new(IndexGeneration::build(number, dataset, Arc::new(config), actor));
		let mut current = self.current.write();

		match current.as_ref() {
			Some(live) if live.number() > number => {
				tracing::debug!(
					discarded = number,
					live = live.number(),
					"Newer generation already published; build discarded."
				);

				live.number()
			},
			_ => {
				*current = Some(generation);

				number
			},
		}
	}

	/// The live generation. Fails until the first [`IndexStore::set_index_data`].
	pub fn current(&self) -> Result<Arc<IndexGeneration<I>>> {
		self.current.read().clone().ok_or(Error::NotInitialized)
	}

	pub fn is_initialized(&self) -> bool {
		self.current.read().is_some()
	}

	pub fn query(&self, text: &str, options: &QueryOptions) -> Result<QueryResponse> {
		self.current()?.query(text, options)
	}

	pub fn related(
		&self,
		id: &str,
		max_depth: usize,
		allowed_edge_types: Option<&[String]>,
	) -> Result<Vec<Arc<Record>>> {
		Ok(self.current()?.related(id, max_depth, allowed_edge_types))
	}

	pub fn stats(&self) -> Result<GenerationStats> {
		Ok(self.current()?.stats())
	}
}
impl<I> Default for IndexStore<I>
where
	I: FuzzyIndex,
{
	fn default() -> Self {
		Self::new()
	}
}

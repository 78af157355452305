//! One complete, immutable build of every index.

use std::{
	collections::{BTreeMap, BTreeSet},
	sync::Arc,
};

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::{
	context::RecordMaps,
	fuzzy::{FuzzyIndex, FuzzyOptions, LevenshteinIndex},
};
use scout_config::{Config, DEFAULT_FLAT_FIELDS};
use scout_domain::{
	Actor, Dataset, Graph, Record,
	access::{accessible_categories, collection_accessible},
	build_graph, reachable_with_depth, scope_for_actor,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationStats {
	pub generation: u64,
	/// Visible records per collection after scoping.
	pub collections: BTreeMap<String, usize>,
	/// Indexed records per accessible category.
	pub categories: BTreeMap<String, usize>,
	pub alias_records: usize,
}

pub(crate) struct CategoryIndex<I> {
	pub(crate) category: String,
	pub(crate) items: Vec<Arc<Record>>,
	pub(crate) index: I,
}

pub(crate) struct CollectionIndex<I> {
	pub(crate) key: String,
	pub(crate) items: Vec<Arc<Record>>,
	pub(crate) index: I,
}

pub(crate) struct AliasIndex<I> {
	pub(crate) target_category: String,
	pub(crate) fields: Vec<String>,
	pub(crate) items: Vec<Arc<Record>>,
	pub(crate) index: I,
	/// Alias id to owning primary record id.
	pub(crate) owners: AHashMap<String, String>,
}

/// Indexes built for one actor over one dataset snapshot.
///
/// Holds the actor's accessible categories and flat collections only; everything else is
/// never indexed, so queries need no actor.
pub struct IndexGeneration<I = LevenshteinIndex>
where
	I: FuzzyIndex,
{
	pub(crate) number: u64,
	pub(crate) config: Arc<Config>,
	pub(crate) categories: Vec<CategoryIndex<I>>,
	pub(crate) collections: Vec<CollectionIndex<I>>,
	pub(crate) alias: Option<AliasIndex<I>>,
	pub(crate) records: RecordMaps,
	pub(crate) known_keys: AHashSet<String>,
	graph: Graph,
	collection_counts: BTreeMap<String, usize>,
}
impl<I> IndexGeneration<I>
where
	I: FuzzyIndex,
{
	/// Scopes `dataset` for `actor`, then indexes what the actor may search.
	///
	/// `dataset` is only read; indexed records are copies.
	pub fn build(number: u64, dataset: &Dataset, config: Arc<Config>, actor: &Actor) -> Self {
		let cfg = config.as_ref();
		let scoped = scope_for_actor(dataset, cfg, actor);
		let primary_key = cfg.dataset.primary_collection.as_str();
		let alias_cfg = cfg.alias_matching();
		let options = FuzzyOptions { threshold: cfg.search.threshold };
		let shared: BTreeMap<&str, Vec<Arc<Record>>> = scoped
			.collections
			.iter()
			.map(|(key, records)| (key.as_str(), records.iter().cloned().map(Arc::new).collect()))
			.collect();
		let primary = shared.get(primary_key).map(Vec::as_slice).unwrap_or_default();
		let mut by_category: BTreeMap<&str, Vec<Arc<Record>>> = BTreeMap::new();

		for record in primary {
			let Some(category) = record.category.as_deref() else {
				tracing::warn!(
					record_id = %record.id,
					"Primary record has no category; not indexed."
				);

				continue;
			};

			by_category.entry(category).or_default().push(record.clone());
		}

		let known_categories: Vec<&str> = by_category.keys().copied().collect();
		let mut categories = Vec::new();

		if cfg.collection_searchable(primary_key) {
			for category in accessible_categories(cfg, actor, &known_categories) {
				let items = by_category.remove(category.as_str()).unwrap_or_default();

				if items.is_empty() {
					tracing::debug!(category = %category, "Category has no records to index.");
				}

				let index = I::build(&items, &cfg.category_fields(&category), options);

				categories.push(CategoryIndex { category, items, index });
			}
		}

		let mut collections = Vec::new();
		let declared = cfg.dataset.collections.iter().map(|collection| collection.key.as_str());
		let undeclared = shared.keys().copied().filter(|key| {
			*key != primary_key
				&& cfg.collection(key).is_none()
				&& alias_cfg.is_none_or(|alias| alias.collection != *key)
		});

		for key in declared.chain(undeclared) {
			if !cfg.collection_searchable(key) || !collection_accessible(cfg, actor, key) {
				continue;
			}

			let items = shared.get(key).cloned().unwrap_or_default();
			let fields = match cfg.collection(key) {
				Some(collection) => collection.fields(),
				None => DEFAULT_FLAT_FIELDS.iter().map(|field| field.to_string()).collect(),
			};
			let index = I::build(&items, &fields, options);

			collections.push(CollectionIndex { key: key.to_string(), items, index });
		}

		let alias = alias_cfg.map(|alias| {
			let items = shared.get(alias.collection.as_str()).cloned().unwrap_or_default();
			let owners = items
				.iter()
				.filter_map(|record| {
					Some((record.id.clone(), record.reference(&alias.owner_field)?))
				})
				.collect();
			let index = I::build(&items, &alias.fields, options);

			AliasIndex {
				target_category: alias.target_category.clone(),
				fields: alias.fields.clone(),
				items,
				index,
				owners,
			}
		});
		let records: RecordMaps = shared
			.iter()
			.filter(|(key, _)| alias_cfg.is_none_or(|alias| alias.collection != **key))
			.map(|(key, items)| {
				(
					key.to_string(),
					items.iter().map(|record| (record.id.clone(), record.clone())).collect(),
				)
			})
			.collect();
		let graph = build_graph(scoped.records(primary_key));
		let mut known_keys: AHashSet<String> = dataset.collections.keys().cloned().collect();

		known_keys.insert(primary_key.to_string());
		known_keys.extend(cfg.dataset.collections.iter().map(|collection| collection.key.clone()));
		known_keys.extend(cfg.categories.keys().cloned());
		known_keys.extend(
			dataset.records(primary_key).iter().filter_map(|record| record.category.clone()),
		);

		let collection_counts: BTreeMap<String, usize> = shared
			.iter()
			.map(|(key, records)| (key.to_string(), records.len()))
			.collect();

		tracing::info!(
			generation = number,
			actor_id = %actor.id,
			collections = collection_counts.len(),
			records = scoped.record_count(),
			categories = categories.len(),
			alias_enabled = alias.is_some(),
			"Index generation built."
		);

		Self {
			number,
			config,
			categories,
			collections,
			alias,
			records,
			known_keys,
			graph,
			collection_counts,
		}
	}

	pub fn number(&self) -> u64 {
		self.number
	}

	/// Categories this generation searches, sorted.
	pub fn accessible_categories(&self) -> Vec<&str> {
		self.categories.iter().map(|index| index.category.as_str()).collect()
	}

	/// Flat collections this generation searches, in configuration order.
	pub fn searchable_collections(&self) -> Vec<&str> {
		self.collections.iter().map(|index| index.key.as_str()).collect()
	}

	pub fn record(&self, collection: &str, id: &str) -> Option<&Arc<Record>> {
		self.records.get(collection)?.get(id)
	}

	/// Visible primary records reachable from `id`, nearest first and then by id.
	///
	/// `id` itself is never part of the result; an unknown `id` yields nothing.
	pub fn related(
		&self,
		id: &str,
		max_depth: usize,
		allowed_edge_types: Option<&[String]>,
	) -> Vec<Arc<Record>> {
		let primary_key = self.config.dataset.primary_collection.as_str();
		let Some(primary) = self.records.get(primary_key) else { return Vec::new() };

		if !primary.contains_key(id) {
			return Vec::new();
		}

		let mut reached: Vec<(usize, &Arc<Record>)> =
			reachable_with_depth(&[id], &self.graph, max_depth, allowed_edge_types)
				.into_iter()
				.filter(|(reached_id, _)| reached_id != id)
				.filter_map(|(reached_id, depth)| Some((depth, primary.get(&reached_id)?)))
				.collect();

		reached.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

		reached.into_iter().map(|(_, record)| record.clone()).collect()
	}

	pub fn stats(&self) -> GenerationStats {
		GenerationStats {
			generation: self.number,
			collections: self.collection_counts.clone(),
			categories: self
				.categories
				.iter()
				.map(|index| (index.category.clone(), index.index.len()))
				.collect(),
			alias_records: self.alias.as_ref().map_or(0, |alias| alias.items.len()),
		}
	}

	/// Every collection key and category name a query filter may name.
	pub fn known_keys(&self) -> BTreeSet<&str> {
		self.known_keys.iter().map(String::as_str).collect()
	}
}

use std::{cmp::Ordering, collections::BTreeMap, sync::Arc, time::Instant};

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::{
	context::ancestry,
	error::{Error, Result},
	fuzzy::{FuzzyIndex, ScoredHit},
	generation::{AliasIndex, IndexGeneration},
	text::{normalize_query, tokenize_query},
};
use scout_domain::Record;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CollectionFilter {
	#[default]
	All,
	/// A flat collection key, the primary collection key, or a category name.
	Key(String),
}
impl CollectionFilter {
	/// `"all"` and the empty string select every collection.
	pub fn parse(raw: &str) -> Self {
		match raw.trim() {
			"" | "all" => Self::All,
			key => Self::Key(key.to_string()),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
	pub collection: CollectionFilter,
	/// Keep only hierarchical hits with this id among their ancestors.
	pub within: Option<String>,
	/// Per-group cap. Falls back to the configured default or suggestion limit.
	pub limit: Option<usize>,
	pub suggestions: bool,
}
impl QueryOptions {
	/// Options for interactive suggestions, capped at `search.suggestion_limit`.
	pub fn suggestions() -> Self {
		Self { suggestions: true, ..Default::default() }
	}

	pub fn with_collection(mut self, collection: CollectionFilter) -> Self {
		self.collection = collection;

		self
	}

	pub fn within(mut self, ancestor_id: impl Into<String>) -> Self {
		self.within = Some(ancestor_id.into());

		self
	}

	pub fn with_limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);

		self
	}
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchProvenance {
	Direct,
	Alias,
}

/// The alias record a synthesized hit came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AliasExplanation {
	pub alias_id: String,
	pub fields: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextEntry {
	pub id: String,
	pub name: String,
	pub category: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryHit {
	pub record: Arc<Record>,
	pub collection_key: String,
	pub score: f32,
	pub match_provenance: MatchProvenance,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub alias: Option<AliasExplanation>,
	/// Ancestors, root first. `None` for primary hits and unresolved chains.
	pub context: Option<Vec<ContextEntry>>,
}
impl QueryHit {
	fn direct(record: Arc<Record>, collection_key: &str, score: f32) -> Self {
		Self {
			record,
			collection_key: collection_key.to_string(),
			score,
			match_provenance: MatchProvenance::Direct,
			alias: None,
			context: None,
		}
	}

	fn outranks(&self, other: &Self) -> bool {
		match self.score.total_cmp(&other.score) {
			Ordering::Less => true,
			Ordering::Equal => self.match_provenance < other.match_provenance,
			Ordering::Greater => false,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryGroup {
	pub collection_key: String,
	pub results: Vec<QueryHit>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResponse {
	pub groups: Vec<QueryGroup>,
	/// Hits across all groups before per-group limits.
	pub total: usize,
	pub normalized_query: String,
}
impl QueryResponse {
	fn empty(normalized_query: String) -> Self {
		Self { groups: Vec::new(), total: 0, normalized_query }
	}

	pub fn is_empty(&self) -> bool {
		self.total == 0
	}

	/// Every hit id, group by group.
	pub fn ids(&self) -> Vec<&str> {
		self.groups
			.iter()
			.flat_map(|group| group.results.iter().map(|hit| hit.record.id.as_str()))
			.collect()
	}
}

/// Items present in every per-token list, scored by their worst per-token score.
pub fn intersect_hits(per_token: &[Vec<ScoredHit>]) -> Vec<ScoredHit> {
	let Some((first, rest)) = per_token.split_first() else { return Vec::new() };
	let mut combined: AHashMap<usize, f32> =
		first.iter().map(|hit| (hit.item, hit.score)).collect();

	for hits in rest {
		let scores: AHashMap<usize, f32> = hits.iter().map(|hit| (hit.item, hit.score)).collect();

		combined.retain(|item, score| match scores.get(item) {
			Some(other) => {
				*score = score.max(*other);

				true
			},
			None => false,
		});
	}

	let mut out: Vec<ScoredHit> =
		combined.into_iter().map(|(item, score)| ScoredHit { item, score }).collect();

	out.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.item.cmp(&b.item)));

	out
}

/// Token search with intersection, falling back to the whole phrase when nothing survives.
pub(crate) fn run_tokens<I>(index: &I, phrase: &str, tokens: &[String]) -> Vec<ScoredHit>
where
	I: FuzzyIndex,
{
	match tokens {
		[] => index.search(phrase),
		[token] => index.search(token),
		_ => {
			let per_token: Vec<Vec<ScoredHit>> =
				tokens.iter().map(|token| index.search(token)).collect();
			let hits = intersect_hits(&per_token);

			if hits.is_empty() { index.search(phrase) } else { hits }
		},
	}
}

#[derive(Default)]
struct Merged {
	hits: Vec<QueryHit>,
	positions: AHashMap<String, usize>,
}
impl Merged {
	fn push(&mut self, hit: QueryHit) {
		match self.positions.get(&hit.record.id) {
			Some(&position) => {
				let existing = &mut self.hits[position];

				if hit.outranks(existing) {
					*existing = hit;
				}
			},
			None => {
				self.positions.insert(hit.record.id.clone(), self.hits.len());
				self.hits.push(hit);
			},
		}
	}

	fn into_ranked(self) -> Vec<QueryHit> {
		let mut hits = self.hits;

		hits.sort_by(|a, b| {
			a.score
				.total_cmp(&b.score)
				.then_with(|| a.match_provenance.cmp(&b.match_provenance))
				.then_with(|| a.record.id.cmp(&b.record.id))
		});

		hits
	}
}

impl<I> IndexGeneration<I>
where
	I: FuzzyIndex,
{
	/// Runs `text` against this generation.
	///
	/// Queries shorter than `search.min_query_chars` return an empty response without
	/// touching any index. An unknown collection filter and a zero limit are errors; a known
	/// but inaccessible collection simply matches nothing.
	pub fn query(&self, text: &str, options: &QueryOptions) -> Result<QueryResponse> {
		let started = Instant::now();
		let normalized_query = normalize_query(text);
		let search = &self.config.search;

		if normalized_query.chars().count() < search.min_query_chars {
			return Ok(QueryResponse::empty(normalized_query));
		}
		if let CollectionFilter::Key(key) = &options.collection
			&& !self.known_keys.contains(key)
		{
			return Err(Error::InvalidQuery {
				message: format!("Unknown collection or category `{key}`."),
			});
		}

		let limit = options.limit.unwrap_or(if options.suggestions {
			search.suggestion_limit
		} else {
			search.default_limit
		});

		if limit == 0 {
			return Err(Error::InvalidQuery {
				message: "Result limit must be greater than zero.".to_string(),
			});
		}

		let tokens = tokenize_query(&normalized_query);
		let mut groups = Vec::new();
		let mut total = 0;
		let primary_key = self.config.dataset.primary_collection.as_str();
		let primary_hits = if options.within.is_none() {
			self.search_primary(&normalized_query, &tokens, &options.collection)
		} else {
			Vec::new()
		};
		let flat_groups = self
			.collections
			.iter()
			.filter(|index| match &options.collection {
				CollectionFilter::All => true,
				CollectionFilter::Key(key) => *key == index.key,
			})
			.map(|index| {
				let hits: Vec<QueryHit> = run_tokens(&index.index, &normalized_query, &tokens)
					.into_iter()
					.map(|hit| {
						let record = index.items[hit.item].clone();
						let mut out = QueryHit::direct(record, &index.key, hit.score);

						out.context =
							ancestry(&self.config, &self.records, &index.key, &out.record);

						out
					})
					.filter(|hit| match options.within.as_deref() {
						None => true,
						Some(ancestor) => hit
							.context
							.as_ref()
							.is_some_and(|chain| chain.iter().any(|entry| entry.id == ancestor)),
					})
					.collect();

				(index.key.as_str(), hits)
			});

		for (key, mut results) in std::iter::once((primary_key, primary_hits)).chain(flat_groups) {
			if results.is_empty() {
				continue;
			}

			total += results.len();

			results.truncate(limit);
			groups.push(QueryGroup { collection_key: key.to_string(), results });
		}

		tracing::debug!(
			generation = self.number,
			query = %normalized_query,
			tokens = tokens.len(),
			groups = groups.len(),
			total,
			elapsed_us = started.elapsed().as_micros() as u64,
			"Query executed."
		);

		Ok(QueryResponse { groups, total, normalized_query })
	}

	fn search_primary(
		&self,
		phrase: &str,
		tokens: &[String],
		filter: &CollectionFilter,
	) -> Vec<QueryHit> {
		let primary_key = self.config.dataset.primary_collection.as_str();
		let mut merged = Merged::default();

		for category in &self.categories {
			if let CollectionFilter::Key(key) = filter
				&& key != primary_key
				&& *key != category.category
			{
				continue;
			}

			let direct = run_tokens(&category.index, phrase, tokens);
			let direct_ids: AHashSet<&str> =
				direct.iter().map(|hit| category.items[hit.item].id.as_str()).collect();

			for hit in &direct {
				merged.push(QueryHit::direct(
					category.items[hit.item].clone(),
					primary_key,
					hit.score,
				));
			}

			if let Some(alias) = &self.alias
				&& alias.target_category == category.category
			{
				for hit in self.resolve_aliases(alias, phrase, tokens, &direct_ids) {
					merged.push(hit);
				}
			}
		}

		merged.into_ranked()
	}

	fn resolve_aliases(
		&self,
		alias: &AliasIndex<I>,
		phrase: &str,
		tokens: &[String],
		direct_ids: &AHashSet<&str>,
	) -> Vec<QueryHit> {
		let primary_key = self.config.dataset.primary_collection.as_str();
		let Some(primary) = self.records.get(primary_key) else { return Vec::new() };

		run_tokens(&alias.index, phrase, tokens)
			.into_iter()
			.filter_map(|hit| {
				let alias_record = &alias.items[hit.item];
				let owner_id = alias.owners.get(&alias_record.id)?;

				if direct_ids.contains(owner_id.as_str()) {
					return None;
				}

				let owner = primary.get(owner_id)?;

				if owner.category.as_deref() != Some(alias.target_category.as_str()) {
					return None;
				}

				let fields = alias
					.fields
					.iter()
					.filter_map(|field| Some((field.clone(), alias_record.field_text(field)?)))
					.collect();

				Some(QueryHit {
					record: owner.clone(),
					collection_key: primary_key.to_string(),
					score: hit.score,
					match_provenance: MatchProvenance::Alias,
					alias: Some(AliasExplanation { alias_id: alias_record.id.clone(), fields }),
					context: None,
				})
			})
			.collect()
	}
}

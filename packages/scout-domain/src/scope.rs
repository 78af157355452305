use std::borrow::Cow;

use ahash::{AHashMap, AHashSet};

use crate::{
	actor::Actor,
	graph::{build_graph, reachable},
	record::{Dataset, Record},
};
use scout_config::Config;

#[derive(Clone, Debug, PartialEq)]
pub struct ScopeOptions {
	pub max_depth: usize,
	/// `None` follows every edge type.
	pub allowed_edge_types: Option<Vec<String>>,
}
impl ScopeOptions {
	pub fn from_config(scope: &scout_config::Scope) -> Self {
		Self {
			max_depth: scope.max_depth,
			allowed_edge_types: (!scope.allowed_edge_types.is_empty())
				.then(|| scope.allowed_edge_types.clone()),
		}
	}
}
impl Default for ScopeOptions {
	fn default() -> Self {
		Self { max_depth: 1, allowed_edge_types: None }
	}
}

/// A collection whose records are kept only while their owner in `parent` is kept.
#[derive(Debug)]
struct Dependency<'a> {
	key: &'a str,
	field: &'a str,
	parent: &'a str,
}

/// Prunes `dataset` to what is reachable from `root_ids`.
///
/// Primary records survive when reachable; dependent records survive when their parent chain
/// ends at a surviving primary record. Collections unrelated to the primary collection pass
/// through untouched. No roots means no visibility: every collection comes back empty.
pub fn compute_scoped_dataset<S>(
	dataset: &Dataset,
	cfg: &Config,
	root_ids: &[S],
	options: &ScopeOptions,
) -> Dataset
where
	S: AsRef<str>,
{
	if root_ids.is_empty() {
		return dataset.empty_like();
	}

	let primary_key = cfg.dataset.primary_collection.as_str();
	let primary = dataset.records(primary_key);
	let graph = build_graph(primary);
	let reach =
		reachable(root_ids, &graph, options.max_depth, options.allowed_edge_types.as_deref());
	let mut out = Dataset::new();
	let mut kept: AHashMap<&str, AHashSet<String>> = AHashMap::new();
	let scoped_primary: Vec<Record> =
		primary.iter().filter(|record| reach.contains(&record.id)).cloned().collect();

	kept.insert(primary_key, scoped_primary.iter().map(|record| record.id.clone()).collect());

	if dataset.collections.contains_key(primary_key) {
		out.collections.insert(primary_key.to_string(), scoped_primary);
	}

	let mut pending = dependencies(cfg);
	let pass_through = dataset
		.collections
		.keys()
		.map(String::as_str)
		.chain(cfg.dataset.collections.iter().map(|collection| collection.key.as_str()))
		.filter(|key| *key != primary_key && !pending.iter().any(|dep| dep.key == *key));

	for key in pass_through {
		let records = dataset.records(key);

		kept.insert(key, records.iter().map(|record| record.id.clone()).collect());

		if let Some(records) = dataset.collections.get(key) {
			out.collections.insert(key.to_string(), records.clone());
		}
	}

	while let Some(position) = pending.iter().position(|dep| kept.contains_key(dep.parent)) {
		let dep = pending.swap_remove(position);
		let Some(parent_ids) = kept.get(dep.parent) else { continue };
		let source = dataset.records(dep.key);
		let records: Vec<Record> = source
			.iter()
			.filter(|record| {
				record.reference(dep.field).is_some_and(|parent_id| parent_ids.contains(&parent_id))
			})
			.cloned()
			.collect();

		tracing::debug!(
			collection = dep.key,
			kept = records.len(),
			dropped = source.len() - records.len(),
			"Scoped dependent collection."
		);

		kept.insert(dep.key, records.iter().map(|record| record.id.clone()).collect());

		if dataset.collections.contains_key(dep.key) {
			out.collections.insert(dep.key.to_string(), records);
		}
	}

	for dep in pending {
		tracing::warn!(
			collection = dep.key,
			parent = dep.parent,
			"Parent chain never reaches the primary collection; collection scoped to nothing."
		);

		if dataset.collections.contains_key(dep.key) {
			out.collections.insert(dep.key.to_string(), Vec::new());
		}
	}

	out
}

/// The dataset `actor` may see under `cfg.scope`.
///
/// Unrestricted actors, and every actor while scoping is disabled, see the dataset unchanged.
pub fn scope_for_actor<'a>(dataset: &'a Dataset, cfg: &Config, actor: &Actor) -> Cow<'a, Dataset> {
	if actor.unrestricted || !cfg.scope.enabled {
		return Cow::Borrowed(dataset);
	}

	let options = ScopeOptions::from_config(&cfg.scope);

	Cow::Owned(compute_scoped_dataset(dataset, cfg, actor.scope_roots.as_slice(), &options))
}

fn dependencies(cfg: &Config) -> Vec<Dependency<'_>> {
	let mut deps: Vec<Dependency<'_>> = cfg
		.dataset
		.collections
		.iter()
		.filter_map(|collection| {
			let (field, parent) = collection.parent()?;

			Some(Dependency { key: collection.key.as_str(), field, parent })
		})
		.collect();

	if let Some(alias) = cfg.alias_matching()
		&& cfg.collection(&alias.collection).is_none()
	{
		deps.push(Dependency {
			key: alias.collection.as_str(),
			field: alias.owner_field.as_str(),
			parent: cfg.dataset.primary_collection.as_str(),
		});
	}

	deps
}

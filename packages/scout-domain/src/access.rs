use std::collections::BTreeSet;

use crate::actor::Actor;
use scout_config::Config;

/// Categories of the primary collection `actor` may search.
///
/// Starts from `search.searchable_categories`, or from every category in `known` plus every
/// configured one when none are declared, then drops categories whose role allow-list the
/// actor does not satisfy. The result is sorted.
pub fn accessible_categories<S>(cfg: &Config, actor: &Actor, known: &[S]) -> Vec<String>
where
	S: AsRef<str>,
{
	let candidates: BTreeSet<&str> = if cfg.search.searchable_categories.is_empty() {
		known
			.iter()
			.map(AsRef::as_ref)
			.chain(cfg.categories.keys().map(String::as_str))
			.collect()
	} else {
		cfg.search.searchable_categories.iter().map(String::as_str).collect()
	};

	candidates
		.into_iter()
		.filter(|category| {
			roles_allow(
				cfg.categories.get(*category).and_then(|rule| rule.roles.as_deref()),
				actor,
			)
		})
		.map(str::to_string)
		.collect()
}

/// Whether `actor` may search the flat collection `key`.
pub fn collection_accessible(cfg: &Config, actor: &Actor, key: &str) -> bool {
	roles_allow(cfg.collection(key).and_then(|collection| collection.roles.as_deref()), actor)
}

fn roles_allow(allowed: Option<&[String]>, actor: &Actor) -> bool {
	match allowed {
		Some(roles) if !roles.is_empty() => actor.has_any_role(roles),
		_ => true,
	}
}

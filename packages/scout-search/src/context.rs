use std::sync::Arc;

use ahash::AHashMap;

use crate::query::ContextEntry;
use scout_config::Config;
use scout_domain::Record;

pub(crate) type RecordMaps = AHashMap<String, AHashMap<String, Arc<Record>>>;

/// Ancestor chain of `record` in breadcrumb order, root first and immediate parent last.
///
/// `None` when `collection` has no parent reference, or when any link of the chain cannot be
/// resolved in `records`.
pub(crate) fn ancestry(
	cfg: &Config,
	records: &RecordMaps,
	collection: &str,
	record: &Record,
) -> Option<Vec<ContextEntry>> {
	let primary = cfg.dataset.primary_collection.as_str();
	let mut chain = Vec::new();
	let mut current_key = collection;
	let mut current = record;
	// At most one hop per declared collection.
	let max_hops = cfg.dataset.collections.len() + 1;

	for _ in 0..max_hops {
		if current_key == primary {
			break;
		}

		let Some((field, parent_key)) = cfg.collection(current_key).and_then(|c| c.parent()) else {
			break;
		};
		let Some(parent_id) = current.reference(field) else {
			tracing::warn!(
				collection = current_key,
				record_id = %current.id,
				field,
				"Record has no parent reference; context unresolved."
			);

			return None;
		};
		let Some(parent) = records.get(parent_key).and_then(|by_id| by_id.get(&parent_id)) else {
			tracing::warn!(
				collection = current_key,
				record_id = %current.id,
				parent_id = %parent_id,
				"Parent record not found; context unresolved."
			);

			return None;
		};
		let category = if parent_key == primary {
			parent.category.clone().unwrap_or_else(|| primary.to_string())
		} else {
			parent_key.to_string()
		};

		chain.push(ContextEntry {
			id: parent.id.clone(),
			name: parent.display_name(&cfg.dataset.name_field),
			category,
		});

		current_key = parent_key;
		current = parent.as_ref();
	}

	if chain.is_empty() {
		return None;
	}

	chain.reverse();

	Some(chain)
}

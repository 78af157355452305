use std::collections::BTreeMap;

use serde::Deserialize;

/// Fields indexed for a flat collection that declares none.
pub const DEFAULT_FLAT_FIELDS: &[&str] = &["name", "title", "code", "description"];
/// Fields indexed for a category that declares none.
pub const DEFAULT_CATEGORY_FIELDS: &[&str] = &["name", "legal_name", "code", "description"];
pub const DEFAULT_ALIAS_FIELDS: &[&str] = &["code", "name"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub dataset: DatasetLayout,
	pub categories: BTreeMap<String, CategoryRule>,
	pub search: Search,
	pub alias: Alias,
	pub scope: Scope,
}
impl Config {
	/// Searchable fields for a category, falling back to the generic default list.
	pub fn category_fields(&self, category: &str) -> Vec<String> {
		match self.categories.get(category).and_then(|rule| rule.fields.as_ref()) {
			Some(fields) if !fields.is_empty() => fields.clone(),
			_ => DEFAULT_CATEGORY_FIELDS.iter().map(|field| field.to_string()).collect(),
		}
	}

	pub fn collection(&self, key: &str) -> Option<&FlatCollection> {
		self.dataset.collections.iter().find(|collection| collection.key == key)
	}

	/// Whether collection gating lets `key` be searched at all.
	pub fn collection_searchable(&self, key: &str) -> bool {
		self.search.collections.is_empty() || self.search.collections.iter().any(|k| k == key)
	}

	/// The alias settings, only when alias matching is switched on.
	pub fn alias_matching(&self) -> Option<&Alias> {
		self.alias.enabled.then_some(&self.alias)
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
	/// Queries slower than this are reported by the host.
	pub slow_query_ms: u64,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string(), slow_query_ms: 100 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
	/// Key of the categorized collection holding primary records.
	pub primary_collection: String,
	pub name_field: String,
	pub collections: Vec<FlatCollection>,
}
impl Default for DatasetLayout {
	fn default() -> Self {
		Self {
			primary_collection: "entities".to_string(),
			name_field: "name".to_string(),
			collections: Vec::new(),
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FlatCollection {
	pub key: String,
	/// Field holding the owning record id.
	pub parent_field: Option<String>,
	pub parent_collection: Option<String>,
	pub fields: Option<Vec<String>>,
	pub roles: Option<Vec<String>>,
}
impl FlatCollection {
	pub fn fields(&self) -> Vec<String> {
		match self.fields.as_ref() {
			Some(fields) if !fields.is_empty() => fields.clone(),
			_ => DEFAULT_FLAT_FIELDS.iter().map(|field| field.to_string()).collect(),
		}
	}

	pub fn parent(&self) -> Option<(&str, &str)> {
		match (self.parent_field.as_deref(), self.parent_collection.as_deref()) {
			(Some(field), Some(collection)) => Some((field, collection)),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CategoryRule {
	pub fields: Option<Vec<String>>,
	/// Roles allowed to search this category. `None` means unrestricted.
	pub roles: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub min_query_chars: usize,
	pub default_limit: usize,
	pub suggestion_limit: usize,
	/// Highest fuzzy score still accepted as a match.
	pub threshold: f32,
	/// Categories offered to search. Empty means every known category.
	pub searchable_categories: Vec<String>,
	/// Collections evaluated at all. Empty means every collection.
	pub collections: Vec<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			min_query_chars: 2,
			default_limit: 20,
			suggestion_limit: 5,
			threshold: 0.6,
			searchable_categories: Vec::new(),
			collections: Vec::new(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Alias {
	pub enabled: bool,
	pub collection: String,
	pub owner_field: String,
	pub target_category: String,
	pub fields: Vec<String>,
}
impl Default for Alias {
	fn default() -> Self {
		Self {
			enabled: false,
			collection: "aliases".to_string(),
			owner_field: "owner_id".to_string(),
			target_category: String::new(),
			fields: DEFAULT_ALIAS_FIELDS.iter().map(|field| field.to_string()).collect(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Scope {
	pub enabled: bool,
	pub max_depth: usize,
	/// Edge types traversed while scoping. Empty means every type.
	pub allowed_edge_types: Vec<String>,
}
impl Default for Scope {
	fn default() -> Self {
		Self { enabled: false, max_depth: 1, allowed_edge_types: Vec::new() }
	}
}

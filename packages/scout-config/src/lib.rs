mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Alias, CategoryRule, Config, DEFAULT_ALIAS_FIELDS, DEFAULT_CATEGORY_FIELDS,
	DEFAULT_FLAT_FIELDS, DatasetLayout, FlatCollection, Scope, Search, Service,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.dataset.primary_collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "dataset.primary_collection must be non-empty.".to_string(),
		});
	}
	if cfg.dataset.name_field.trim().is_empty() {
		return Err(Error::Validation {
			message: "dataset.name_field must be non-empty.".to_string(),
		});
	}
	if !cfg.search.threshold.is_finite() {
		return Err(Error::Validation {
			message: "search.threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.threshold) {
		return Err(Error::Validation {
			message: "search.threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.search.min_query_chars == 0 {
		return Err(Error::Validation {
			message: "search.min_query_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}

	validate_collections(cfg)?;

	if cfg.alias.enabled {
		for (label, value) in [
			("alias.collection", &cfg.alias.collection),
			("alias.owner_field", &cfg.alias.owner_field),
			("alias.target_category", &cfg.alias.target_category),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation {
					message: format!("{label} must be non-empty when alias.enabled is true."),
				});
			}
		}
	}

	for key in &cfg.search.collections {
		let known = key == &cfg.dataset.primary_collection
			|| cfg.collection(key).is_some()
			|| (cfg.alias.enabled && key == &cfg.alias.collection);

		if !known {
			return Err(Error::Validation {
				message: format!("search.collections entry '{key}' is not a known collection."),
			});
		}
	}

	Ok(())
}

fn validate_collections(cfg: &Config) -> Result<()> {
	let primary = cfg.dataset.primary_collection.as_str();
	let mut seen = HashSet::new();

	for collection in &cfg.dataset.collections {
		if collection.key.trim().is_empty() {
			return Err(Error::Validation {
				message: "dataset.collections.key must be non-empty.".to_string(),
			});
		}
		if collection.key == primary {
			return Err(Error::Validation {
				message: format!(
					"dataset.collections.key '{}' must differ from dataset.primary_collection.",
					collection.key
				),
			});
		}
		if !seen.insert(collection.key.as_str()) {
			return Err(Error::Validation {
				message: format!("dataset.collections.key '{}' is declared twice.", collection.key),
			});
		}
		if collection.parent_field.is_some() != collection.parent_collection.is_some() {
			return Err(Error::Validation {
				message: format!(
					"dataset.collections '{}' must set parent_field and parent_collection \
					 together.",
					collection.key
				),
			});
		}
	}

	for collection in &cfg.dataset.collections {
		let Some((_, parent)) = collection.parent() else { continue };

		if parent != primary && !seen.contains(parent) {
			return Err(Error::Validation {
				message: format!(
					"dataset.collections '{}' references unknown parent_collection '{parent}'.",
					collection.key
				),
			});
		}
	}

	// Every parent chain must terminate, either at the primary collection or at a
	// collection without a parent.
	for collection in &cfg.dataset.collections {
		let mut visited = HashSet::new();
		let mut current = collection;

		while let Some((_, parent)) = current.parent() {
			if !visited.insert(current.key.as_str()) {
				return Err(Error::Validation {
					message: format!(
						"dataset.collections '{}' has a cyclic parent chain.",
						collection.key
					),
				});
			}
			if parent == primary {
				break;
			}

			let Some(next) = cfg.collection(parent) else { break };

			current = next;
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	normalize_list(&mut cfg.search.searchable_categories);
	normalize_list(&mut cfg.search.collections);
	normalize_list(&mut cfg.scope.allowed_edge_types);
	normalize_list(&mut cfg.alias.fields);

	for collection in &mut cfg.dataset.collections {
		if let Some(fields) = collection.fields.as_mut() {
			normalize_list(fields);
		}
		if let Some(roles) = collection.roles.as_mut() {
			normalize_list(roles);
		}
	}
	for rule in cfg.categories.values_mut() {
		if let Some(fields) = rule.fields.as_mut() {
			normalize_list(fields);
		}
		if let Some(roles) = rule.roles.as_mut() {
			normalize_list(roles);
		}
	}
}

fn normalize_list(values: &mut Vec<String>) {
	for value in values.iter_mut() {
		let trimmed = value.trim();

		if trimmed.len() != value.len() {
			*value = trimmed.to_string();
		}
	}

	values.retain(|value| !value.is_empty());
}

use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use scout_config::{Config, Error, FlatCollection};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_toml_with_search(threshold: f64, collections: &[&str]) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");
	let search = root
		.get_mut("search")
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [search].");

	search.insert("threshold".to_string(), Value::Float(threshold));
	search.insert(
		"collections".to_string(),
		Value::Array(collections.iter().map(|key| Value::String(key.to_string())).collect()),
	);

	toml::to_string(&value).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("scout_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

#[test]
fn sample_config_is_valid() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = scout_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.dataset.primary_collection, "entities");
	assert_eq!(cfg.dataset.collections.len(), 3);
	assert!(cfg.alias_matching().is_some());
	assert_eq!(cfg.scope.max_depth, 1);
}

#[test]
fn empty_config_uses_defaults() {
	let cfg: Config = toml::from_str("").expect("Failed to parse empty config.");

	assert!(scout_config::validate(&cfg).is_ok());
	assert_eq!(cfg.search.min_query_chars, 2);
	assert_eq!(cfg.search.default_limit, 20);
	assert_eq!(cfg.dataset.primary_collection, "entities");
	assert!(!cfg.alias.enabled);
	assert!(!cfg.scope.enabled);
}

#[test]
fn threshold_must_be_in_range() {
	let path = write_temp_config(sample_toml_with_search(1.5, &[]));
	let result = scout_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected threshold validation error.");

	assert!(
		err.to_string().contains("search.threshold must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn gated_collections_must_be_known() {
	let path = write_temp_config(sample_toml_with_search(0.6, &["invoices"]));
	let result = scout_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected collection gating validation error.");

	assert!(
		err.to_string().contains("search.collections entry 'invoices' is not a known collection."),
		"Unexpected error: {err}"
	);
}

#[test]
fn gated_collections_accept_primary_and_alias_collections() {
	let path = write_temp_config(sample_toml_with_search(0.6, &[" entities ", "aliases", ""]));
	let result = scout_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Gated config must load.");

	assert_eq!(cfg.search.collections, vec!["entities".to_string(), "aliases".to_string()]);
	assert!(cfg.collection_searchable("entities"));
	assert!(!cfg.collection_searchable("projects"));
}

#[test]
fn parse_errors_carry_the_path() {
	let path = write_temp_config("[search\nthreshold = ".to_string());
	let result = scout_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	match result {
		Err(Error::ParseConfig { path: err_path, .. }) => assert_eq!(err_path, path),
		other => panic!("Expected a parse error, got {other:?}."),
	}
}

#[test]
fn missing_file_names_the_path() {
	let path = env::temp_dir().join("scout_config_test_missing.toml");
	let err = scout_config::load(&path).expect_err("Expected a read error.");

	assert!(matches!(&err, Error::ReadConfig { path: err_path, .. } if *err_path == path));
	assert!(err.to_string().starts_with("Scout config at "), "Unexpected error: {err}");
}

#[test]
fn validation_errors_are_prefixed() {
	let mut cfg = base_config();

	cfg.dataset.name_field = " ".to_string();

	let err = scout_config::validate(&cfg).expect_err("Expected name field validation error.");

	assert_eq!(err.to_string(), "Invalid scout config: dataset.name_field must be non-empty.");
}

#[test]
fn alias_requires_target_category_when_enabled() {
	let mut cfg = base_config();

	cfg.alias.target_category = "  ".to_string();

	let err = scout_config::validate(&cfg).expect_err("Expected alias validation error.");

	assert!(
		err.to_string()
			.contains("alias.target_category must be non-empty when alias.enabled is true."),
		"Unexpected error: {err}"
	);

	cfg.alias.enabled = false;

	assert!(scout_config::validate(&cfg).is_ok());
}

#[test]
fn parent_reference_requires_both_fields() {
	let mut cfg = base_config();

	cfg.dataset.collections.push(FlatCollection {
		key: "notes".to_string(),
		parent_field: Some("task_id".to_string()),
		..Default::default()
	});

	let err = scout_config::validate(&cfg).expect_err("Expected parent validation error.");

	assert!(
		err.to_string().contains("must set parent_field and parent_collection together."),
		"Unexpected error: {err}"
	);
}

#[test]
fn parent_collection_must_be_declared() {
	let mut cfg = base_config();

	cfg.dataset.collections.push(FlatCollection {
		key: "notes".to_string(),
		parent_field: Some("ticket_id".to_string()),
		parent_collection: Some("tickets".to_string()),
		..Default::default()
	});

	let err = scout_config::validate(&cfg).expect_err("Expected parent validation error.");

	assert!(
		err.to_string().contains("references unknown parent_collection 'tickets'."),
		"Unexpected error: {err}"
	);
}

#[test]
fn parent_chains_must_not_cycle() {
	let mut cfg = base_config();

	cfg.dataset.collections = vec![
		FlatCollection {
			key: "a".to_string(),
			parent_field: Some("b_id".to_string()),
			parent_collection: Some("b".to_string()),
			..Default::default()
		},
		FlatCollection {
			key: "b".to_string(),
			parent_field: Some("a_id".to_string()),
			parent_collection: Some("a".to_string()),
			..Default::default()
		},
	];

	let err = scout_config::validate(&cfg).expect_err("Expected cycle validation error.");

	assert!(err.to_string().contains("has a cyclic parent chain."), "Unexpected error: {err}");
}

#[test]
fn flat_collection_key_must_differ_from_primary() {
	let mut cfg = base_config();

	cfg.dataset.collections.push(FlatCollection {
		key: "entities".to_string(),
		..Default::default()
	});

	let err = scout_config::validate(&cfg).expect_err("Expected key validation error.");

	assert!(
		err.to_string().contains("must differ from dataset.primary_collection."),
		"Unexpected error: {err}"
	);
}

#[test]
fn category_fields_fall_back_to_generic_defaults() {
	let cfg = base_config();

	assert_eq!(
		cfg.category_fields("company"),
		vec!["name".to_string(), "legal_name".to_string(), "registration_number".to_string()]
	);
	assert_eq!(
		cfg.category_fields("fund"),
		scout_config::DEFAULT_CATEGORY_FIELDS
			.iter()
			.map(|field| field.to_string())
			.collect::<Vec<_>>()
	);

	let tasks = cfg.collection("tasks").expect("tasks must be declared.");

	assert_eq!(tasks.fields().len(), scout_config::DEFAULT_FLAT_FIELDS.len());
	assert_eq!(tasks.parent(), Some(("project_id", "projects")));
}

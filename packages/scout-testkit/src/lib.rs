//! Fixture datasets, configurations, and generators shared by the workspace tests.

mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use proptest::{collection, prelude::*};
use serde_json::json;

use scout_config::Config;
use scout_domain::{Actor, Dataset, Record};

pub const SAMPLE_CONFIG_TOML: &str = include_str!("../fixtures/sample_config.toml");

/// A file under the temp dir, removed on drop.
pub struct TempFile {
	path: PathBuf,
}
impl TempFile {
	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl Drop for TempFile {
	fn drop(&mut self) {
		let _ = fs::remove_file(&self.path);
	}
}

pub fn write_temp_file(prefix: &str, extension: &str, contents: &str) -> Result<TempFile> {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_err(|err| Error::Message(format!("System clock is before the epoch: {err}.")))?
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let mut path = env::temp_dir();

	path.push(format!("{prefix}_{nanos}_{}_{ordinal}.{extension}", std::process::id()));
	fs::write(&path, contents)?;

	Ok(TempFile { path })
}

pub fn try_sample_config() -> Result<Config> {
	Ok(toml::from_str(SAMPLE_CONFIG_TOML)?)
}

/// The sample configuration: entities with projects, tasks, and role-gated documents;
/// alias matching for companies; scoping one hop deep.
pub fn sample_config() -> Config {
	try_sample_config().expect("Sample config fixture must parse.")
}

/// [`sample_config`] with scoping switched off.
pub fn unscoped_config() -> Config {
	let mut cfg = sample_config();

	cfg.scope.enabled = false;

	cfg
}

pub fn sample_dataset() -> Dataset {
	Dataset::new()
		.with_collection("entities", vec![
			Record::new("X1")
				.with_category("company")
				.with_field("name", json!("Blue Ocean Partners"))
				.with_field("legal_name", json!("Blue Ocean Partners Ltd"))
				.with_field("registration_number", json!("REG-4471"))
				.connect("X2", Some("supplier"))
				.connect("H1", Some("employs")),
			Record::new("X2")
				.with_category("company")
				.with_field("name", json!("Ocean View Trading")),
			Record::new("X3")
				.with_category("company")
				.with_field("name", json!("Northwind Logistics"))
				.connect("B1", Some("board")),
			Record::new("H1")
				.with_category("person")
				.with_field("name", json!("Helena Marsh"))
				.with_field("email", json!("helena@blueocean.example")),
			Record::new("B1")
				.with_category("board_seat")
				.with_field("name", json!("Chair Seat Northwind"))
				.with_field("seat_code", json!("BS-CHAIR")),
			Record::new("F9")
				.with_category("company")
				.with_field("name", json!("Isolated Freight")),
		])
		.with_collection("projects", vec![
			Record::new("PR1")
				.with_field("name", json!("Harbor Expansion"))
				.with_field("entity_id", json!("X1")),
			Record::new("PR2")
				.with_field("name", json!("Trade Route Audit"))
				.with_field("entity_id", json!("X2")),
			Record::new("PR9")
				.with_field("name", json!("Freight Review"))
				.with_field("entity_id", json!("F9")),
		])
		.with_collection("tasks", vec![
			Record::new("T1")
				.with_field("name", json!("Dredge survey"))
				.with_field("project_id", json!("PR1")),
			Record::new("T2")
				.with_field("name", json!("Customs paperwork"))
				.with_field("project_id", json!("PR2")),
			Record::new("T9")
				.with_field("name", json!("Orphan task"))
				.with_field("project_id", json!("PR-missing")),
		])
		.with_collection("documents", vec![
			Record::new("D1").with_field("title", json!("Shareholder agreement")),
		])
		.with_collection("aliases", vec![
			Record::new("AL1")
				.with_field("code", json!("ACM"))
				.with_field("name", json!("Acme Maritime"))
				.with_field("owner_id", json!("X1")),
			Record::new("AL2").with_field("code", json!("NWL")).with_field("owner_id", json!("H1")),
		])
}

/// Two companies indexed on `name` only.
pub fn ocean_dataset() -> Dataset {
	Dataset::new().with_collection("entities", vec![
		Record::new("X1").with_category("company").with_field("name", json!("Blue Ocean Partners")),
		Record::new("X2").with_category("company").with_field("name", json!("Ocean View Trading")),
	])
}

/// Sees everything; holds no roles.
pub fn analyst() -> Actor {
	Actor::new("analyst").into_unrestricted()
}

/// Sees everything; holds `admin` and `legal`.
pub fn admin() -> Actor {
	Actor::new("admin").with_roles(["admin", "legal"]).into_unrestricted()
}

/// Scoped to `X1`.
pub fn scoped_member() -> Actor {
	Actor::new("member").scoped_to(["X1"])
}

/// Primary records `N0..N{n}` with arbitrary typed and untyped connections among them.
pub fn graph_records(max_nodes: usize) -> impl Strategy<Value = Vec<Record>> {
	(1..=max_nodes).prop_flat_map(|nodes| {
		collection::vec((0..nodes, 0..nodes, prop::option::of(0..2_usize)), 0..nodes * 2).prop_map(
			move |edges| {
				let mut records: Vec<Record> = (0..nodes)
					.map(|i| Record::new(format!("N{i}")).with_category("company"))
					.collect();

				for (from, to, edge_type) in edges {
					let edge_type =
						edge_type.map(|kind| if kind == 0 { "owns" } else { "advises" });
					let target = format!("N{to}");

					records[from] = records[from].clone().connect(target, edge_type);
				}

				records
			},
		)
	})
}

/// Up to three distinct node ids drawn from `N0..N{max_nodes}`.
pub fn root_ids(max_nodes: usize) -> impl Strategy<Value = Vec<String>> {
	collection::btree_set(0..max_nodes, 1..=3)
		.prop_map(|ids| ids.into_iter().map(|i| format!("N{i}")).collect())
}

/// A dataset in the [`sample_config`] layout built over [`graph_records`].
///
/// Projects reference entities, tasks reference projects, and aliases reference entities.
/// Some references point at ids that do not exist.
pub fn layered_dataset(max_nodes: usize) -> impl Strategy<Value = Dataset> {
	graph_records(max_nodes).prop_flat_map(|records| {
		let nodes = records.len();

		(
			Just(records),
			collection::vec(0..=nodes, 0..6),
			collection::vec(0..7_usize, 0..8),
			collection::vec(0..=nodes, 0..4),
		)
			.prop_map(move |(records, projects, tasks, aliases)| {
				let entity_ref =
					|i: usize| if i < nodes { format!("N{i}") } else { "N-gone".to_string() };
				let projects = projects
					.into_iter()
					.enumerate()
					.map(|(i, owner)| {
						Record::new(format!("P{i}"))
							.with_field("entity_id", json!(entity_ref(owner)))
					})
					.collect();
				let tasks = tasks
					.into_iter()
					.enumerate()
					.map(|(i, project)| {
						Record::new(format!("T{i}"))
							.with_field("project_id", json!(format!("P{project}")))
					})
					.collect();
				let aliases = aliases
					.into_iter()
					.enumerate()
					.map(|(i, owner)| {
						Record::new(format!("A{i}"))
							.with_field("owner_id", json!(entity_ref(owner)))
					})
					.collect();

				Dataset::new()
					.with_collection("entities", records)
					.with_collection("projects", projects)
					.with_collection("tasks", tasks)
					.with_collection("aliases", aliases)
			})
	})
}

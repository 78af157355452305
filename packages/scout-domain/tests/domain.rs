use ahash::AHashSet;
use proptest::prelude::*;

use scout_domain::{
	Dataset, Record, ScopeOptions, build_graph, compute_scoped_dataset, reachable, scope_for_actor,
};
use scout_testkit::{
	graph_records, layered_dataset, root_ids, sample_config, sample_dataset, scoped_member,
};

const COLLECTIONS: [&str; 4] = ["entities", "projects", "tasks", "aliases"];

fn ids(dataset: &Dataset, key: &str) -> Vec<String> {
	let mut ids: Vec<String> =
		dataset.records(key).iter().map(|record| record.id.clone()).collect();

	ids.sort();

	ids
}

#[test]
fn mutual_connections_reach_each_other() {
	let records = vec![
		Record::new("E1").connect("E2", None),
		Record::new("E2").connect("E1", None),
	];
	let reach = reachable(&["E1"], &build_graph(&records), 1, None);
	let mut reach: Vec<String> = reach.into_iter().collect();

	reach.sort();

	assert_eq!(reach, vec!["E1", "E2"]);
}

#[test]
fn scoped_actor_loses_unconnected_records_and_their_dependents() {
	let data = sample_dataset();
	let cfg = sample_config();
	let scoped = scope_for_actor(&data, &cfg, &scoped_member());

	assert_eq!(ids(&scoped, "entities"), vec!["H1", "X1", "X2"]);
	assert_eq!(ids(&scoped, "projects"), vec!["PR1", "PR2"]);
	assert_eq!(ids(&scoped, "tasks"), vec!["T1", "T2"]);
	assert_eq!(ids(&scoped, "aliases"), vec!["AL1", "AL2"]);
	assert_eq!(ids(&scoped, "documents"), vec!["D1"]);
}

#[test]
fn scoping_leaves_the_source_dataset_untouched() {
	let data = sample_dataset();
	let before = data.clone();
	let _ = compute_scoped_dataset(&data, &sample_config(), &["F9"], &ScopeOptions::default());

	assert_eq!(data, before);
}

#[test]
fn edge_type_allow_list_narrows_scope() {
	let options =
		ScopeOptions { max_depth: 1, allowed_edge_types: Some(vec!["employs".to_string()]) };
	let scoped = compute_scoped_dataset(&sample_dataset(), &sample_config(), &["X1"], &options);

	assert_eq!(ids(&scoped, "entities"), vec!["H1", "X1"]);
	assert_eq!(ids(&scoped, "projects"), vec!["PR1"]);
}

proptest! {
	#[test]
	fn depth_zero_is_identity(records in graph_records(8), roots in root_ids(8)) {
		let reach = reachable(roots.as_slice(), &build_graph(&records), 0, None);
		let expected: AHashSet<String> = roots.iter().cloned().collect();

		prop_assert_eq!(reach, expected);
	}

	#[test]
	fn deeper_search_never_loses_ids(
		records in graph_records(8),
		roots in root_ids(8),
		shallow in 0_usize..4,
		extra in 1_usize..4,
	) {
		let graph = build_graph(&records);
		let near = reachable(roots.as_slice(), &graph, shallow, None);
		let far = reachable(roots.as_slice(), &graph, shallow + extra, None);

		prop_assert!(near.is_subset(&far));
	}

	#[test]
	fn scoped_collections_grow_with_depth(
		data in layered_dataset(8),
		roots in root_ids(8),
		shallow in 0_usize..3,
		extra in 1_usize..3,
	) {
		let cfg = sample_config();
		let near = ScopeOptions { max_depth: shallow, allowed_edge_types: None };
		let far = ScopeOptions { max_depth: shallow + extra, allowed_edge_types: None };
		let near = compute_scoped_dataset(&data, &cfg, roots.as_slice(), &near);
		let far = compute_scoped_dataset(&data, &cfg, roots.as_slice(), &far);

		for key in COLLECTIONS {
			let near_ids: AHashSet<String> = ids(&near, key).into_iter().collect();
			let far_ids: AHashSet<String> = ids(&far, key).into_iter().collect();

			prop_assert!(near_ids.is_subset(&far_ids), "{key} lost records at greater depth");
		}
	}

	#[test]
	fn scoping_with_dependents_is_idempotent(
		data in layered_dataset(8),
		roots in root_ids(8),
		depth in 0_usize..3,
	) {
		let cfg = sample_config();
		let options = ScopeOptions { max_depth: depth, allowed_edge_types: None };
		let once = compute_scoped_dataset(&data, &cfg, roots.as_slice(), &options);
		let twice = compute_scoped_dataset(&once, &cfg, roots.as_slice(), &options);

		prop_assert_eq!(once, twice);
	}
}

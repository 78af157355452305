use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::record::Record;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edge {
	pub target: String,
	pub edge_type: Option<String>,
}

/// Undirected adjacency over primary records.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	adjacency: AHashMap<String, Vec<Edge>>,
}
impl Graph {
	pub fn neighbors(&self, id: &str) -> &[Edge] {
		self.adjacency.get(id).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.adjacency.contains_key(id)
	}

	pub fn node_count(&self) -> usize {
		self.adjacency.len()
	}

	fn insert(&mut self, from: &str, to: &str, edge_type: Option<&String>) {
		self.adjacency
			.entry(from.to_string())
			.or_default()
			.push(Edge { target: to.to_string(), edge_type: edge_type.cloned() });
	}
}

/// Walks every connection once and records it in both directions.
///
/// Connections whose target is not one of `records` are skipped, so they can never be
/// traversed.
pub fn build_graph(records: &[Record]) -> Graph {
	let known: AHashSet<&str> = records.iter().map(|record| record.id.as_str()).collect();
	let mut graph = Graph::default();

	for record in records {
		graph.adjacency.entry(record.id.clone()).or_default();

		for connection in &record.connections {
			if !known.contains(connection.target_id.as_str()) {
				tracing::warn!(
					source_id = %record.id,
					target_id = %connection.target_id,
					"Connection targets a record missing from the dataset; edge ignored."
				);

				continue;
			}

			graph.insert(&record.id, &connection.target_id, connection.edge_type.as_ref());
			graph.insert(&connection.target_id, &record.id, connection.edge_type.as_ref());
		}
	}

	graph
}

/// Ids reachable from `start_ids` within `max_depth` hops.
///
/// Start ids are always part of the result, present in the graph or not. With
/// `allowed_edge_types`, only edges whose type is listed are followed; untyped edges are then
/// never followed.
pub fn reachable<S>(
	start_ids: &[S],
	graph: &Graph,
	max_depth: usize,
	allowed_edge_types: Option<&[String]>,
) -> AHashSet<String>
where
	S: AsRef<str>,
{
	reachable_with_depth(start_ids, graph, max_depth, allowed_edge_types)
		.into_iter()
		.map(|(id, _)| id)
		.collect()
}

/// Breadth-first search that also reports the hop count at which each id was first reached.
pub fn reachable_with_depth<S>(
	start_ids: &[S],
	graph: &Graph,
	max_depth: usize,
	allowed_edge_types: Option<&[String]>,
) -> AHashMap<String, usize>
where
	S: AsRef<str>,
{
	let mut visited = AHashMap::with_capacity(start_ids.len());
	let mut queue = VecDeque::new();

	for id in start_ids {
		let id = id.as_ref();

		if !visited.contains_key(id) {
			visited.insert(id.to_string(), 0);
			queue.push_back((id.to_string(), 0_usize));
		}
	}

	while let Some((id, depth)) = queue.pop_front() {
		if depth >= max_depth {
			continue;
		}

		for edge in graph.neighbors(&id) {
			if visited.contains_key(edge.target.as_str()) {
				continue;
			}
			if let Some(allowed) = allowed_edge_types
				&& !edge.edge_type.as_ref().is_some_and(|edge_type| allowed.contains(edge_type))
			{
				continue;
			}

			visited.insert(edge.target.clone(), depth + 1);
			queue.push_back((edge.target.clone(), depth + 1));
		}
	}

	visited
}

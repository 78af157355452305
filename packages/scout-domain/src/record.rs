use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A business entity or hierarchical sub-record.
///
/// Primary records carry a `category` and may declare `connections`; hierarchical records
/// reference their owner through a configured parent field. Every other attribute lives in
/// `fields` and is opaque to the engine.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Record {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub connections: Vec<Connection>,
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}
impl Record {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), ..Default::default() }
	}

	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());

		self
	}

	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(name.into(), value.into());

		self
	}

	pub fn connect(mut self, target_id: impl Into<String>, edge_type: Option<&str>) -> Self {
		self.connections.push(Connection {
			target_id: target_id.into(),
			edge_type: edge_type.map(str::to_string),
		});

		self
	}

	/// Looks a field up by name, descending into objects on dotted paths.
	pub fn field(&self, path: &str) -> Option<&Value> {
		if let Some(value) = self.fields.get(path) {
			return Some(value);
		}

		let mut segments = path.split('.');
		let mut current = self.fields.get(segments.next()?)?;

		for segment in segments {
			current = current.as_object()?.get(segment)?;
		}

		Some(current)
	}

	/// Text of a field as it should be searched. Arrays are joined with spaces; objects and
	/// nulls have no text.
	pub fn field_text(&self, path: &str) -> Option<String> {
		let text = value_text(self.field(path)?)?;

		(!text.trim().is_empty()).then_some(text)
	}

	/// An id held in `field`, as used by parent and owner references.
	pub fn reference(&self, field: &str) -> Option<String> {
		match self.field(field)? {
			Value::String(value) if !value.is_empty() => Some(value.clone()),
			Value::Number(value) => Some(value.to_string()),
			_ => None,
		}
	}

	/// Display name: `name_field`, then `title`, then the id.
	pub fn display_name(&self, name_field: &str) -> String {
		self.field_text(name_field)
			.or_else(|| self.field_text("title"))
			.unwrap_or_else(|| self.id.clone())
	}
}

/// A stored edge. Declared on one side only; reachability treats it as undirected.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Connection {
	#[serde(alias = "targetId")]
	pub target_id: String,
	#[serde(default, alias = "type", alias = "edgeType", skip_serializing_if = "Option::is_none")]
	pub edge_type: Option<String>,
}

/// Collection key to records. Replaced as a unit whenever the host refreshes its data.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
	pub collections: BTreeMap<String, Vec<Record>>,
}
impl Dataset {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_collection(mut self, key: impl Into<String>, records: Vec<Record>) -> Self {
		self.collections.insert(key.into(), records);

		self
	}

	pub fn records(&self, key: &str) -> &[Record] {
		self.collections.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	/// Same collection keys, no records.
	pub fn empty_like(&self) -> Self {
		Self { collections: self.collections.keys().map(|key| (key.clone(), Vec::new())).collect() }
	}

	pub fn record_count(&self) -> usize {
		self.collections.values().map(Vec::len).sum()
	}
}

fn value_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Array(items) => {
			let parts: Vec<String> = items.iter().filter_map(value_text).collect();

			(!parts.is_empty()).then(|| parts.join(" "))
		},
		Value::Null | Value::Object(_) => None,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use crate::record::{Dataset, Record};

	#[test]
	fn deserializes_storage_shape() {
		let record: Record = serde_json::from_value(json!({
			"id": "X1",
			"category": "company",
			"name": "Blue Ocean Partners",
			"connections": [{ "targetId": "X2", "type": "owns" }, { "target_id": "X3" }],
		}))
		.expect("Record must deserialize.");

		assert_eq!(record.id, "X1");
		assert_eq!(record.category.as_deref(), Some("company"));
		assert_eq!(record.connections.len(), 2);
		assert_eq!(record.connections[0].edge_type.as_deref(), Some("owns"));
		assert_eq!(record.connections[1].edge_type, None);
		assert_eq!(record.field_text("name").as_deref(), Some("Blue Ocean Partners"));
		assert!(record.fields.get("connections").is_none());
	}

	#[test]
	fn reads_nested_and_array_fields() {
		let record = Record::new("P1")
			.with_field("address", json!({ "city": "Lisbon" }))
			.with_field("tags", json!(["alpha", 7, null]))
			.with_field("entity_id", json!(42));

		assert_eq!(record.field_text("address.city").as_deref(), Some("Lisbon"));
		assert_eq!(record.field_text("tags").as_deref(), Some("alpha 7"));
		assert_eq!(record.field_text("address"), None);
		assert_eq!(record.reference("entity_id").as_deref(), Some("42"));
		assert_eq!(record.display_name("name"), "P1");
	}

	#[test]
	fn empty_like_keeps_keys() {
		let dataset = Dataset::new()
			.with_collection("entities", vec![Record::new("E1")])
			.with_collection("tasks", vec![Record::new("T1"), Record::new("T2")]);
		let empty = dataset.empty_like();

		assert_eq!(dataset.record_count(), 3);
		assert_eq!(empty.record_count(), 0);
		assert_eq!(empty.collections.keys().collect::<Vec<_>>(), vec!["entities", "tasks"]);
		assert!(dataset.records("missing").is_empty());
	}
}

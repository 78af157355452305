//! The fuzzy-matching seam.
//!
//! Query logic only talks to [`FuzzyIndex`]; [`LevenshteinIndex`] is the default
//! implementation, built on Levenshtein automata.

use std::{
	cmp::Ordering,
	sync::{Arc, LazyLock},
};

use levenshtein_automata::{DFA, Distance, LevenshteinAutomatonBuilder};

use crate::text::normalize_text;
use scout_domain::Record;

const EXACT_SCORE: f32 = 0.0;
const FIELD_PREFIX_SCORE: f32 = 0.05;
const WORD_PREFIX_SCORE: f32 = 0.1;
const SUBSTRING_SCORE: f32 = 0.2;
const FUZZY_BASE_SCORE: f32 = 0.3;
const FUZZY_SPAN: f32 = 0.6;

static AUTOMATON_BUILDERS: LazyLock<[LevenshteinAutomatonBuilder; 2]> = LazyLock::new(|| {
	[LevenshteinAutomatonBuilder::new(1, true), LevenshteinAutomatonBuilder::new(2, true)]
});

#[derive(Clone, Copy, Debug)]
pub struct FuzzyOptions {
	/// Highest score still reported as a hit.
	pub threshold: f32,
}
impl Default for FuzzyOptions {
	fn default() -> Self {
		Self { threshold: 0.6 }
	}
}

/// An item position in the slice the index was built from, with its score. Lower is better.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredHit {
	pub item: usize,
	pub score: f32,
}

pub trait FuzzyIndex
where
	Self: Sized + Send + Sync,
{
	fn build(items: &[Arc<Record>], fields: &[String], options: FuzzyOptions) -> Self;

	/// Hits sorted by ascending score, ties in item order.
	fn search(&self, query: &str) -> Vec<ScoredHit>;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug)]
struct FieldText {
	text: String,
	/// `text` with a leading space, for word-boundary checks.
	padded: String,
	words: Vec<String>,
}

#[derive(Debug)]
pub struct LevenshteinIndex {
	documents: Vec<Vec<FieldText>>,
	threshold: f32,
}
impl LevenshteinIndex {
	fn score_field(field: &FieldText, query: &PreparedQuery) -> Option<f32> {
		if field.text == query.text {
			return Some(EXACT_SCORE);
		}
		if field.text.starts_with(&query.text) {
			return Some(FIELD_PREFIX_SCORE);
		}
		if field.padded.contains(&query.padded) {
			return Some(WORD_PREFIX_SCORE);
		}
		if field.text.contains(&query.text) {
			return Some(SUBSTRING_SCORE);
		}

		let dfa = query.dfa.as_ref()?;
		let width = query.word_count.min(field.words.len()).max(1);
		let mut best: Option<u8> = None;

		for window in field.words.windows(width) {
			let candidate = window.join(" ");

			if let Distance::Exact(distance) = dfa.eval(candidate.as_bytes()) {
				best = Some(best.map_or(distance, |current| current.min(distance)));

				if distance == 0 {
					break;
				}
			}
		}

		best.map(|distance| {
			FUZZY_BASE_SCORE + FUZZY_SPAN * f32::from(distance) / query.char_count as f32
		})
	}
}
impl FuzzyIndex for LevenshteinIndex {
	fn build(items: &[Arc<Record>], fields: &[String], options: FuzzyOptions) -> Self {
		let documents = items
			.iter()
			.map(|record| {
				fields
					.iter()
					.filter_map(|field| record.field_text(field))
					.map(|raw| {
						let text = normalize_text(&raw);
						let words = text.split(' ').map(str::to_string).collect();

						FieldText { padded: format!(" {text}"), text, words }
					})
					.filter(|field| !field.text.is_empty())
					.collect()
			})
			.collect();

		Self { documents, threshold: options.threshold }
	}

	fn search(&self, query: &str) -> Vec<ScoredHit> {
		let Some(prepared) = PreparedQuery::new(query) else { return Vec::new() };
		let mut hits: Vec<ScoredHit> = self
			.documents
			.iter()
			.enumerate()
			.filter_map(|(item, fields)| {
				let score = fields
					.iter()
					.filter_map(|field| Self::score_field(field, &prepared))
					.min_by(|a, b| a.total_cmp(b))?;

				(score <= self.threshold).then_some(ScoredHit { item, score })
			})
			.collect();

		hits.sort_by(|a, b| match a.score.total_cmp(&b.score) {
			Ordering::Equal => a.item.cmp(&b.item),
			other => other,
		});

		hits
	}

	fn len(&self) -> usize {
		self.documents.len()
	}
}

struct PreparedQuery {
	text: String,
	padded: String,
	word_count: usize,
	char_count: usize,
	dfa: Option<DFA>,
}
impl PreparedQuery {
	fn new(query: &str) -> Option<Self> {
		let text = normalize_text(query);

		if text.is_empty() {
			return None;
		}

		let char_count = text.chars().count();
		let dfa = match allowed_edit_distance(char_count) {
			0 => None,
			distance => {
				Some(AUTOMATON_BUILDERS[usize::from(distance) - 1].build_prefix_dfa(&text))
			},
		};

		Some(Self {
			padded: format!(" {text}"),
			word_count: text.split(' ').count(),
			char_count,
			dfa,
			text,
		})
	}
}

/// Typos tolerated for a query of `char_count` characters.
pub fn allowed_edit_distance(char_count: usize) -> u8 {
	match char_count {
		0..=3 => 0,
		4..=6 => 1,
		_ => 2,
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::json;

	use crate::fuzzy::{FuzzyIndex, FuzzyOptions, LevenshteinIndex, allowed_edit_distance};
	use scout_domain::Record;

	fn index(names: &[&str]) -> LevenshteinIndex {
		let items: Vec<Arc<Record>> = names
			.iter()
			.enumerate()
			.map(|(i, name)| Arc::new(Record::new(format!("R{i}")).with_field("name", json!(name))))
			.collect();

		LevenshteinIndex::build(&items, &["name".to_string()], FuzzyOptions::default())
	}

	#[test]
	fn ranks_exact_before_prefix_before_substring() {
		let index = index(&["Oceanic Freight", "Ocean", "Blue Ocean Partners", "Blueocean"]);
		let hits = index.search("ocean");
		let order: Vec<usize> = hits.iter().map(|hit| hit.item).collect();

		assert_eq!(order, vec![1, 0, 2, 3]);
		assert_eq!(hits[0].score, 0.0);
	}

	#[test]
	fn tolerates_typos_on_longer_queries() {
		let index = index(&["Northwind Logistics", "Harbor Expansion"]);
		let hits = index.search("nortwind");

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].item, 0);
		assert!(hits[0].score > 0.2 && hits[0].score < 0.6);
	}

	#[test]
	fn short_queries_must_match_literally() {
		let index = index(&["Acme", "Acne"]);

		assert_eq!(index.search("acm").len(), 1);
		assert!(index.search("xyz").is_empty());
	}

	#[test]
	fn threshold_cuts_fuzzy_matches() {
		let items = vec![Arc::new(Record::new("R0").with_field("name", json!("Northwind")))];
		let strict = LevenshteinIndex::build(
			&items,
			&["name".to_string()],
			FuzzyOptions { threshold: 0.25 },
		);

		assert!(strict.search("nortwind").is_empty());
		assert_eq!(strict.search("north").len(), 1);
	}

	#[test]
	fn missing_fields_are_ignored() {
		let items = vec![
			Arc::new(Record::new("R0")),
			Arc::new(Record::new("R1").with_field("code", json!("AC-1"))),
		];
		let fields = ["name".to_string(), "code".to_string()];
		let index = LevenshteinIndex::build(&items, &fields, FuzzyOptions::default());

		assert_eq!(index.len(), 2);
		assert_eq!(index.search("ac 1")[0].item, 1);
		assert!(index.search("").is_empty());
	}

	#[test]
	fn edit_distance_grows_with_length() {
		assert_eq!(allowed_edit_distance(3), 0);
		assert_eq!(allowed_edit_distance(5), 1);
		assert_eq!(allowed_edit_distance(9), 2);
	}
}

use std::collections::HashSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use unicode_segmentation::UnicodeSegmentation;

/// Lowercases, strips diacritics, and turns every non-alphanumeric run into a single space.
pub fn normalize_text(text: &str) -> String {
	let mut normalized = String::with_capacity(text.len());
	let mut pending_space = false;

	for ch in text.nfkd().filter(|ch| !is_combining_mark(*ch)) {
		if ch.is_alphanumeric() {
			if pending_space && !normalized.is_empty() {
				normalized.push(' ');
			}

			pending_space = false;

			normalized.extend(ch.to_lowercase());
		} else {
			pending_space = true;
		}
	}

	normalized
}

/// The query as echoed back to callers: trimmed, whitespace runs collapsed.
pub fn normalize_query(query: &str) -> String {
	query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Distinct words of `query`, in order of first appearance.
///
/// Single-character words are dropped whenever a longer word is present, since they would
/// prefix-match nearly everything.
pub fn tokenize_query(query: &str) -> Vec<String> {
	let normalized = normalize_text(query);
	let mut seen = HashSet::new();
	let mut out: Vec<String> = Vec::new();

	for word in normalized.unicode_words() {
		if seen.insert(word) {
			out.push(word.to_string());
		}
	}

	if out.iter().any(|token| token.chars().count() > 1) {
		out.retain(|token| token.chars().count() > 1);
	}

	out
}

#[cfg(test)]
mod tests {
	use crate::text::{normalize_query, normalize_text, tokenize_query};

	#[test]
	fn normalizes_case_diacritics_and_punctuation() {
		assert_eq!(normalize_text("  Crème-Brûlée, S.A. "), "creme brulee s a");
		assert_eq!(normalize_text("helena@blueocean.example"), "helena blueocean example");
		assert_eq!(normalize_text("--"), "");
	}

	#[test]
	fn query_normalization_only_collapses_whitespace() {
		assert_eq!(normalize_query("  Ocean \t Partners\n"), "Ocean Partners");
		assert_eq!(normalize_query(""), "");
	}

	#[test]
	fn tokenizes_on_whitespace_and_punctuation() {
		assert_eq!(tokenize_query("Ocean, partners ocean"), vec!["ocean", "partners"]);
		assert_eq!(tokenize_query("Saint-Tropez"), vec!["saint", "tropez"]);
	}

	#[test]
	fn drops_single_characters_next_to_longer_tokens() {
		assert_eq!(tokenize_query("a ocean b"), vec!["ocean"]);
		assert_eq!(tokenize_query("a b"), vec!["a", "b"]);
	}
}

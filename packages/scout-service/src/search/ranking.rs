use std::cmp::Ordering;

use crate::search::ContentFragment;

const MAX_QUERY_TERMS: usize = 16;
const MIN_TERM_CHARS: usize = 2;

/// Lowercased alphanumeric terms in first-seen order.
pub fn tokenize_query(query: &str) -> Vec<String> {
	let mut terms: Vec<String> = Vec::new();

	for raw in query.split(|ch: char| !ch.is_alphanumeric()) {
		if raw.chars().count() < MIN_TERM_CHARS {
			continue;
		}

		let term = raw.to_lowercase();

		if terms.contains(&term) {
			continue;
		}

		terms.push(term);

		if terms.len() == MAX_QUERY_TERMS {
			break;
		}
	}

	terms
}

/// Fraction of `terms` found in `haystack`, which must already be lowercase.
pub fn term_coverage(terms: &[String], haystack: &str) -> f32 {
	if terms.is_empty() {
		return 0.0;
	}

	let matched = terms.iter().filter(|term| haystack.contains(term.as_str())).count();

	matched as f32 / terms.len() as f32
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

pub fn clamp_similarity(value: f32) -> f32 {
	if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Cuts `content` to at most `max_chars` characters on a char boundary.
pub fn snippet(content: &str, max_chars: usize) -> String {
	match content.char_indices().nth(max_chars) {
		Some((end, _)) => content[..end].trim_end().to_string(),
		None => content.to_string(),
	}
}

/// Appends `fragments` to `pool`, dropping `(url, content)` duplicates.
///
/// A duplicate with a higher similarity replaces the pooled fragment in place, so the first
/// strategy to produce a fragment keeps its position.
pub fn absorb(pool: &mut Vec<ContentFragment>, fragments: Vec<ContentFragment>) {
	for mut fragment in fragments {
		fragment.similarity = clamp_similarity(fragment.similarity);

		let existing = pool
			.iter_mut()
			.find(|pooled| pooled.url == fragment.url && pooled.content == fragment.content);

		match existing {
			Some(pooled) if fragment.similarity > pooled.similarity => *pooled = fragment,
			Some(_) => {},
			None => pool.push(fragment),
		}
	}
}

/// Stable sort by similarity, then truncate. Equal scores keep pool order.
pub fn finalize(mut pool: Vec<ContentFragment>, limit: u32) -> Vec<ContentFragment> {
	for fragment in &mut pool {
		fragment.similarity = clamp_similarity(fragment.similarity);
	}

	pool.sort_by(|a, b| cmp_f32_desc(a.similarity, b.similarity));
	pool.truncate(limit as usize);

	pool
}

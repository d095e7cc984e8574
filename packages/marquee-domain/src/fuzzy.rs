//! Approximate matching of free-text values against a known vocabulary.
//!
//! Scores are on a 0-100 scale. The score of a pair is the best of three views: the whole
//! strings, the strings with their words sorted, and (when one side is much longer) the best
//! aligned window of the longer string. The latter two are discounted so that a plain match
//! always outranks a reordered or partial one.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub const DEFAULT_THRESHOLD: f64 = 70.0;

const TOKEN_SORT_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;
const PARTIAL_MIN_LENGTH_RATIO: f64 = 1.5;
const LONG_PARTIAL_LENGTH_RATIO: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Correction<'a> {
	Matched { value: &'a str, score: f64 },
	Uncorrectable { best_score: f64 },
}
impl<'a> Correction<'a> {
	pub fn value(&self) -> Option<&'a str> {
		match self {
			Self::Matched { value, .. } => Some(value),
			Self::Uncorrectable { .. } => None,
		}
	}
}

/// Compatibility-normalized, case-folded, whitespace-collapsed form used for comparisons.
pub fn normalize(value: &str) -> String {
	let folded: String = value.nfkc().flat_map(char::to_lowercase).collect();

	folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn similarity(left: &str, right: &str) -> f64 {
	scored(&normalize(left), &normalize(right))
}

/// Picks the best candidate for `query`. Ties keep the earliest candidate, so the result only
/// depends on the candidate order.
pub fn best_match<'a>(query: &str, candidates: &'a [String], threshold: f64) -> Correction<'a> {
	let query = normalize(query);
	let mut best: Option<(&'a str, f64)> = None;

	for candidate in candidates {
		let normalized = normalize(candidate);

		if normalized == query {
			return Correction::Matched { value: candidate.as_str(), score: 100.0 };
		}

		let score = scored(&query, &normalized);

		if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
			best = Some((candidate.as_str(), score));
		}
	}

	match best {
		Some((value, score)) if score >= threshold => Correction::Matched { value, score },
		Some((_, score)) => Correction::Uncorrectable { best_score: score },
		None => Correction::Uncorrectable { best_score: 0.0 },
	}
}

fn scored(left: &str, right: &str) -> f64 {
	if left.is_empty() || right.is_empty() {
		return 0.0;
	}

	let plain = ratio(left, right);
	let sorted = ratio(&sorted_tokens(left), &sorted_tokens(right)) * TOKEN_SORT_SCALE;
	let partial = partial_ratio(left, right);

	plain.max(sorted).max(partial)
}

fn ratio(left: &str, right: &str) -> f64 {
	strsim::normalized_levenshtein(left, right) * 100.0
}

fn sorted_tokens(value: &str) -> String {
	let mut tokens: Vec<&str> = value.unicode_words().collect();

	tokens.sort_unstable();

	tokens.join(" ")
}

fn partial_ratio(left: &str, right: &str) -> f64 {
	let left_chars: Vec<char> = left.chars().collect();
	let right_chars: Vec<char> = right.chars().collect();
	let (shorter, longer) = if left_chars.len() <= right_chars.len() {
		(left_chars, right_chars)
	} else {
		(right_chars, left_chars)
	};
	let length_ratio = longer.len() as f64 / shorter.len() as f64;

	if length_ratio < PARTIAL_MIN_LENGTH_RATIO {
		return 0.0;
	}

	let scale =
		if length_ratio >= LONG_PARTIAL_LENGTH_RATIO { LONG_PARTIAL_SCALE } else { PARTIAL_SCALE };
	let needle: String = shorter.iter().collect();
	let best = longer
		.windows(shorter.len())
		.map(|window| ratio(&needle, &window.iter().collect::<String>()))
		.fold(0.0_f64, f64::max);

	best * scale
}

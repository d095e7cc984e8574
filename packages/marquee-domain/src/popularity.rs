//! Quantile-cutoff popularity ranking.
//!
//! Candidates at or below the cutoff quantile of the count distribution are dropped before
//! the top `k` are taken, so a pool with few standouts yields fewer than `k` ids.

use std::collections::BTreeMap;

use crate::catalog::{Item, ItemId, UserGroup};

pub const DEFAULT_QUANTILE: f64 = 0.75;

/// Rating counts per item, summed over `groups` (or the overall total when `groups` is empty).
pub fn aggregate<'a>(
	items: impl IntoIterator<Item = &'a Item>,
	groups: &[UserGroup],
) -> Vec<(ItemId, u64)> {
	items.into_iter().map(|item| (item.item_id, item.ratings.sum(groups))).collect()
}

/// Quantile with linear interpolation between the closest ranks.
pub fn quantile(values: &[u64], q: f64) -> Option<f64> {
	if values.is_empty() || !(0.0..=1.0).contains(&q) {
		return None;
	}

	let mut sorted = values.to_vec();

	sorted.sort_unstable();

	let position = q * (sorted.len() - 1) as f64;
	let lower = position.floor() as usize;
	let upper = position.ceil() as usize;
	let low = sorted[lower] as f64;
	let high = sorted[upper] as f64;

	Some(low + (high - low) * (position - lower as f64))
}

/// Ids whose count is strictly above the `q` quantile, most popular first, at most `k` of them.
/// Duplicate ids are merged by summing their counts. Ties are broken by ascending id.
pub fn rank(candidates: &[(ItemId, u64)], k: usize, q: f64) -> Vec<ItemId> {
	let mut merged = BTreeMap::<ItemId, u64>::new();

	for (item_id, count) in candidates {
		*merged.entry(*item_id).or_default() += count;
	}

	let counts = merged.values().copied().collect::<Vec<_>>();
	let Some(cutoff) = quantile(&counts, q) else {
		return Vec::new();
	};
	let mut retained =
		merged.into_iter().filter(|(_, count)| *count as f64 > cutoff).collect::<Vec<_>>();

	retained.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
	retained.truncate(k);

	retained.into_iter().map(|(item_id, _)| item_id).collect()
}

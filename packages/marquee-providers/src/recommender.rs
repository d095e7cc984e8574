//! Client for the hosted top-k recommendation model.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Recommendation {
	pub item_id: i64,
	pub score: f32,
}

/// Ranks items for `user`. When `items` is given the model only scores those candidates.
pub async fn recommend(
	cfg: &marquee_config::ProviderConfig,
	user: i64,
	k: u32,
	items: Option<&[i64]>,
) -> Result<Vec<Recommendation>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let mut body = serde_json::json!({ "model": cfg.model, "user": user, "k": k });

	if let Some(items) = items {
		body["items"] = Value::from(items.to_vec());
	}

	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let mut ranked = parse_recommendation_response(&json)?;

	ranked.truncate(k as usize);

	Ok(ranked)
}

fn parse_recommendation_response(json: &Value) -> Result<Vec<Recommendation>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Recommendation response is missing results array."))?;
	let mut ranked = Vec::with_capacity(results.len());

	for item in results {
		let item_id = item
			.get("item_id")
			.or_else(|| item.get("id"))
			.and_then(|v| v.as_i64())
			.ok_or_else(|| eyre::eyre!("Recommendation result missing item_id."))?;
		let score = item
			.get("score")
			.and_then(|v| v.as_f64())
			.ok_or_else(|| eyre::eyre!("Recommendation result missing score."))? as f32;

		ranked.push(Recommendation { item_id, score });
	}

	ranked.sort_by(|left, right| right.score.total_cmp(&left.score));

	Ok(ranked)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_by_descending_score() {
		let json = serde_json::json!({
			"results": [
				{ "item_id": 7, "score": 0.2 },
				{ "item_id": 3, "score": 0.9 },
				{ "id": 5, "score": 0.5 }
			]
		});
		let ranked = parse_recommendation_response(&json).expect("parse failed");
		let ids = ranked.iter().map(|r| r.item_id).collect::<Vec<_>>();

		assert_eq!(ids, vec![3, 5, 7]);
	}

	#[test]
	fn missing_score_is_an_error() {
		let json = serde_json::json!({ "results": [{ "item_id": 1 }] });

		assert!(parse_recommendation_response(&json).is_err());
	}
}

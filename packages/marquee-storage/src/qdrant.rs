use std::collections::HashMap;

use qdrant_client::qdrant::{
	Condition, Filter, Query, QueryPointsBuilder, ScoredPoint, Value, value::Kind,
};

use marquee_domain::ItemId;

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub examples_collection: Option<String>,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &marquee_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			examples_collection: cfg.examples_collection.clone(),
			vector_dim: cfg.vector_dim,
		})
	}

	/// Nearest storylines to `vector`, optionally restricted to `items`.
	pub async fn search_items(
		&self,
		vector: Vec<f32>,
		items: Option<&[ItemId]>,
		limit: u32,
	) -> Result<Vec<StorylineHit>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(u64::from(limit));

		if let Some(items) = items {
			search = search.filter(Filter::must([Condition::matches("item_id", items.to_vec())]));
		}

		let points = self.client.query(search).await?.result;

		Ok(points.iter().filter_map(StorylineHit::from_point).collect())
	}

	/// Stored example queries closest to `vector`. Empty when no examples collection is set.
	pub async fn search_examples(&self, vector: Vec<f32>, limit: u32) -> Result<Vec<ExampleHit>> {
		let Some(collection) = self.examples_collection.as_ref() else {
			return Ok(Vec::new());
		};
		let search = QueryPointsBuilder::new(collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(u64::from(limit));
		let points = self.client.query(search).await?.result;

		Ok(points.iter().filter_map(ExampleHit::from_point).collect())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorylineHit {
	pub item_id: ItemId,
	pub storyline: Option<String>,
	pub score: f32,
}
impl StorylineHit {
	fn from_point(point: &ScoredPoint) -> Option<Self> {
		Some(Self {
			item_id: payload_i64(&point.payload, "item_id")?,
			storyline: payload_string(&point.payload, "storyline"),
			score: point.score,
		})
	}
}

/// A stored user query with the tool plan that answers it.
#[derive(Clone, Debug, PartialEq)]
pub struct ExampleHit {
	pub query: String,
	pub plan: String,
	pub score: f32,
}
impl ExampleHit {
	fn from_point(point: &ScoredPoint) -> Option<Self> {
		Some(Self {
			query: payload_string(&point.payload, "query")?,
			plan: payload_string(&point.payload, "plan")?,
			score: point.score,
		})
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => Some(*value),
		Some(Kind::DoubleValue(value)) if value.fract() == 0.0 => Some(*value as i64),
		Some(Kind::StringValue(text)) => text.parse().ok(),
		_ => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_item_ids_from_any_numeric_payload() {
		let mut payload = HashMap::new();

		payload.insert("a".to_string(), Value::from(42_i64));
		payload.insert("b".to_string(), Value::from(7.0_f64));
		payload.insert("c".to_string(), Value::from("13"));
		payload.insert("d".to_string(), Value::from(1.5_f64));

		assert_eq!(payload_i64(&payload, "a"), Some(42));
		assert_eq!(payload_i64(&payload, "b"), Some(7));
		assert_eq!(payload_i64(&payload, "c"), Some(13));
		assert_eq!(payload_i64(&payload, "d"), None);
		assert_eq!(payload_i64(&payload, "missing"), None);
	}
}

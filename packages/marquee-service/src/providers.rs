//! Collaborator seams for the external services and their default implementations.

use std::sync::Arc;

use serde_json::Value;

use marquee_config::{EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use marquee_domain::{ItemId, UserId};
use marquee_providers::{embedding, reasoning, recommender};
use marquee_storage::qdrant::{QdrantStore, StorylineHit};

use crate::{
	BoxFuture,
	conversation::{Message, Role},
	orchestrator::{Example, ExampleRetriever, ReasoningEngine, ReasoningStep},
	tool::{ToolInvocationRequest, ToolSpec},
};

pub trait Recommender
where
	Self: Send + Sync,
{
	/// Top `k` item ids for `user`, best first, scored over `items` when given.
	fn recommend<'a>(
		&'a self,
		user: UserId,
		k: u32,
		items: Option<&'a [ItemId]>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ItemId>>>;
}

pub trait SemanticIndex
where
	Self: Send + Sync,
{
	/// Items whose storyline is closest to `query`, best first.
	fn search<'a>(
		&'a self,
		query: &'a str,
		items: Option<&'a [ItemId]>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<StorylineHit>>>;
}

pub struct HttpRecommender {
	cfg: ProviderConfig,
}
impl HttpRecommender {
	pub fn new(cfg: ProviderConfig) -> Self {
		Self { cfg }
	}
}
impl Recommender for HttpRecommender {
	fn recommend<'a>(
		&'a self,
		user: UserId,
		k: u32,
		items: Option<&'a [ItemId]>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ItemId>>> {
		Box::pin(async move {
			let ranked = recommender::recommend(&self.cfg, user, k, items).await?;

			Ok(ranked.into_iter().map(|recommendation| recommendation.item_id).collect())
		})
	}
}

pub struct QdrantSemanticIndex {
	store: Arc<QdrantStore>,
	embedding: EmbeddingProviderConfig,
}
impl QdrantSemanticIndex {
	pub fn new(store: Arc<QdrantStore>, embedding: EmbeddingProviderConfig) -> Self {
		Self { store, embedding }
	}
}
impl SemanticIndex for QdrantSemanticIndex {
	fn search<'a>(
		&'a self,
		query: &'a str,
		items: Option<&'a [ItemId]>,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<StorylineHit>>> {
		Box::pin(async move {
			let vector = embedding::embed_one(&self.embedding, query).await?;

			Ok(self.store.search_items(vector, items, limit).await?)
		})
	}
}

pub struct QdrantExampleRetriever {
	store: Arc<QdrantStore>,
	embedding: EmbeddingProviderConfig,
}
impl QdrantExampleRetriever {
	pub fn new(store: Arc<QdrantStore>, embedding: EmbeddingProviderConfig) -> Self {
		Self { store, embedding }
	}
}
impl ExampleRetriever for QdrantExampleRetriever {
	fn retrieve<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Example>>> {
		Box::pin(async move {
			let vector = embedding::embed_one(&self.embedding, query).await?;
			let hits = self.store.search_examples(vector, limit).await?;

			Ok(hits
				.into_iter()
				.map(|hit| Example { query: hit.query, plan: hit.plan, score: hit.score })
				.collect())
		})
	}
}

/// Reasoning engine backed by a chat completions endpoint with tool calling.
pub struct ProviderReasoningEngine {
	cfg: LlmProviderConfig,
}
impl ProviderReasoningEngine {
	pub fn new(cfg: LlmProviderConfig) -> Self {
		Self { cfg }
	}
}
impl ReasoningEngine for ProviderReasoningEngine {
	fn invoke<'a>(
		&'a self,
		messages: &'a [Message],
		tools: &'a [ToolSpec],
	) -> BoxFuture<'a, color_eyre::Result<ReasoningStep>> {
		Box::pin(async move {
			let wire = messages.iter().map(wire_message).collect::<Vec<_>>();
			let schemas = tools
				.iter()
				.map(|spec| reasoning::tool_schema(&spec.name, &spec.description, &spec.parameters))
				.collect::<Vec<_>>();
			let completion = reasoning::complete(&self.cfg, &wire, &schemas).await?;
			let tool_requests = completion
				.tool_calls
				.into_iter()
				.map(|call| ToolInvocationRequest {
					id: call.id,
					name: call.name,
					arguments: call.arguments,
				})
				.collect();

			Ok(ReasoningStep { text: completion.content, tool_requests })
		})
	}
}

/// Chat wire form of `message`. Tool arguments travel as JSON strings.
pub fn wire_message(message: &Message) -> Value {
	match message.role {
		Role::System => serde_json::json!({ "role": "system", "content": message.text_content() }),
		Role::User => serde_json::json!({ "role": "user", "content": message.text_content() }),
		Role::Assistant => {
			let text = message.text_content();
			let mut wire = serde_json::json!({
				"role": "assistant",
				"content": if text.is_empty() { Value::Null } else { Value::from(text) },
			});

			if !message.tool_requests.is_empty() {
				wire["tool_calls"] = message
					.tool_requests
					.iter()
					.map(|request| {
						serde_json::json!({
							"id": request.id,
							"type": "function",
							"function": {
								"name": request.name,
								"arguments": wire_arguments(&request.arguments),
							},
						})
					})
					.collect();
			}

			wire
		},
		Role::Tool => serde_json::json!({
			"role": "tool",
			"tool_call_id": message.tool_call_id,
			"content": message.text_content(),
		}),
	}
}

/// Arguments that were not valid JSON are kept as the raw string and go back unchanged.
fn wire_arguments(arguments: &Value) -> String {
	match arguments {
		Value::String(raw) => raw.clone(),
		other => other.to_string(),
	}
}

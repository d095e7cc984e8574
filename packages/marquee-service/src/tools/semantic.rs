use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use marquee_domain::ItemId;

use super::{ToolContext, args};
use crate::{
	BoxFuture, Result,
	tool::{ToolHandler, ToolResult, ToolSpec},
};

pub const NAME: &str = "vector_store_search";

#[derive(Debug, Deserialize)]
struct Args {
	query: String,
	#[serde(default, deserialize_with = "args::optional_ids")]
	items: Option<Vec<ItemId>>,
}

pub struct VectorStoreSearchTool {
	ctx: Arc<ToolContext>,
}
impl VectorStoreSearchTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let Args { query, items } = match args::parse(arguments) {
			Ok(input) => input,
			Err(failure) => return Ok(failure),
		};

		if query.trim().is_empty() {
			return Ok(ToolResult::failure(args::JSON_GENERATION_ERROR));
		}

		let items = items.filter(|items| !items.is_empty());
		let hits = match self
			.ctx
			.semantic
			.search(&query, items.as_deref(), self.ctx.settings.semantic_top_k)
			.await
		{
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(error = %err, "Vector store search failed.");

				return Ok(ToolResult::failure(format!(
					"Vector store search failed due to: {err}"
				)));
			},
		};
		let mut ids = Vec::with_capacity(hits.len());

		// The item whose storyline is the query itself is not a match.
		for hit in hits {
			if hit.storyline.as_deref().is_none_or(|storyline| storyline == query) {
				continue;
			}
			if !ids.contains(&hit.item_id) {
				ids.push(hit.item_id);
			}
		}

		Ok(ToolResult::success(
			format!(
				"The IDs of the {} best matching items produced by the vector store search are \
				 returned.",
				ids.len()
			),
			ids,
		))
	}
}
impl ToolHandler for VectorStoreSearchTool {
	fn spec(&self) -> ToolSpec {
		ToolSpec {
			name: NAME.to_string(),
			description: "Performs a vector store search over item storylines and returns the top \
			              matching item IDs. The search covers the entire catalog unless a list of \
			              items is provided."
				.to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"query": { "type": "string", "description": "Text to search storylines for." },
					"items": { "type": "array", "items": { "type": "integer" } },
				},
				"required": ["query"],
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

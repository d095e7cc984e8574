use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use marquee_domain::{ItemId, UserId};

use super::{ToolContext, args};
use crate::{
	BoxFuture, Result,
	tool::{ToolHandler, ToolResult, ToolSpec},
};

pub const NAME: &str = "get_top_k_recommendations";

#[derive(Debug, Deserialize)]
struct Args {
	#[serde(deserialize_with = "args::id")]
	user: UserId,
	k: Option<u32>,
	#[serde(default, deserialize_with = "args::optional_ids")]
	items: Option<Vec<ItemId>>,
}

pub struct TopKRecommendationsTool {
	ctx: Arc<ToolContext>,
}
impl TopKRecommendationsTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let Args { user, k, items } = match args::parse(arguments) {
			Ok(args) => args,
			Err(failure) => return Ok(failure),
		};
		let k = k.unwrap_or(self.ctx.settings.recommend_default_k);

		if k == 0 {
			return Ok(ToolResult::failure(args::JSON_GENERATION_ERROR));
		}
		if items.as_ref().is_some_and(Vec::is_empty) {
			return Ok(ToolResult::failure(args::EMPTY_ITEMS));
		}

		let ranked = self.ctx.recommender.recommend(user, k, items.as_deref()).await?;

		if ranked.is_empty() {
			return Ok(ToolResult::failure(format!(
				"No recommendations could be computed for user {user}."
			)));
		}

		Ok(ToolResult::success(
			format!("The top {} recommendations for user {user} are returned.", ranked.len()),
			ranked,
		))
	}
}
impl ToolHandler for TopKRecommendationsTool {
	fn spec(&self) -> ToolSpec {
		ToolSpec {
			name: NAME.to_string(),
			description: "Returns a list of the IDs of the top k recommended items for the given \
			              user. It computes recommendations over the entire item catalog unless a \
			              list of items is given."
				.to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"user": { "type": "integer", "description": "User ID." },
					"k": { "type": "integer", "description": "Number of recommended items." },
					"items": {
						"type": "array",
						"items": { "type": "integer" },
						"description": "Item IDs to rank instead of the full catalog.",
					},
				},
				"required": ["user"],
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use marquee_domain::{ItemId, UserId};

use super::{ToolContext, args};
use crate::{
	BoxFuture, Result,
	tool::{ToolHandler, ToolResult, ToolSpec},
};

pub const INTERACTED_NAME: &str = "get_interacted_items";
pub const LIKE_NAME: &str = "get_like_percentage";

#[derive(Debug, Deserialize)]
struct UserArgs {
	#[serde(deserialize_with = "args::id")]
	user: UserId,
}

#[derive(Debug, Deserialize)]
struct ItemsArgs {
	#[serde(deserialize_with = "args::ids")]
	items: Vec<ItemId>,
}

pub struct InteractedItemsTool {
	ctx: Arc<ToolContext>,
}
impl InteractedItemsTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let UserArgs { user } = match args::parse(arguments) {
			Ok(input) => input,
			Err(failure) => return Ok(failure),
		};
		let limit = self.ctx.settings.interacted_limit;
		// One extra row tells whether older interactions were left out.
		let mut items = self.ctx.catalog.interacted_items(user, limit.saturating_add(1)).await?;

		if items.is_empty() {
			return Ok(ToolResult::failure(format!(
				"No interaction information found for user {user}."
			)));
		}

		let message = if items.len() > limit as usize {
			items.drain(..items.len() - limit as usize);

			format!(
				"User {user} has interacted with more than {limit} items. The most recent {limit} \
				 are returned."
			)
		} else {
			format!("All items user {user} interacted with are returned.")
		};

		Ok(ToolResult::success(message, items))
	}
}
impl ToolHandler for InteractedItemsTool {
	fn spec(&self) -> ToolSpec {
		ToolSpec {
			name: INTERACTED_NAME.to_string(),
			description: "Returns the IDs of the items the given user interacted with, oldest \
			              first."
				.to_string(),
			parameters: json!({
				"type": "object",
				"properties": { "user": { "type": "integer", "description": "User ID." } },
				"required": ["user"],
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

pub struct LikePercentageTool {
	ctx: Arc<ToolContext>,
}
impl LikePercentageTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let ItemsArgs { items } = match args::parse(arguments) {
			Ok(input) => input,
			Err(failure) => return Ok(failure),
		};

		if items.is_empty() {
			return Ok(ToolResult::failure(args::EMPTY_ITEMS));
		}

		let (raters, users) = self.ctx.catalog.like_share(&items).await?;

		if users <= 0 {
			return Ok(ToolResult::failure("No users found in the catalog."));
		}

		let share = raters as f64 / users as f64 * 100.0;

		Ok(ToolResult::success(
			"The percentage of users that might like the given items is returned.",
			format!("{share:.2}%"),
		))
	}
}
impl ToolHandler for LikePercentageTool {
	fn spec(&self) -> ToolSpec {
		ToolSpec {
			name: LIKE_NAME.to_string(),
			description: "Returns the percentage of users that like the given item IDs."
				.to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"items": { "type": "array", "items": { "type": "integer" } },
				},
				"required": ["items"],
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

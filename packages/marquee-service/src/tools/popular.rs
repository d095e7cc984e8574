use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use marquee_domain::{ItemId, UserGroup, popularity};

use super::{ToolContext, args};
use crate::{
	BoxFuture, Result,
	tool::{ToolHandler, ToolResult, ToolSpec},
};

pub const NAME: &str = "get_popular_items";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Popularity {
	Standard,
	ByUserGroup,
}

#[derive(Debug, Deserialize)]
struct Args {
	popularity: Popularity,
	k: Option<u32>,
	#[serde(default, deserialize_with = "args::optional_ids")]
	items: Option<Vec<ItemId>>,
	#[serde(default, deserialize_with = "args::one_or_many")]
	user_group: Vec<UserGroup>,
	/// The question asks for a few statistics rather than a ranking.
	#[serde(default)]
	statistics: bool,
}

pub struct PopularItemsTool {
	ctx: Arc<ToolContext>,
}
impl PopularItemsTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let input: Args = match args::parse(arguments) {
			Ok(input) => input,
			Err(failure) => return Ok(failure),
		};
		let settings = &self.ctx.settings;
		let k = match (input.k, input.statistics) {
			(Some(k), _) => k,
			(None, true) => settings.statistics_k,
			(None, false) => settings.popular_default_k,
		};
		let groups = match input.popularity {
			Popularity::Standard => Vec::new(),
			Popularity::ByUserGroup if input.user_group.is_empty() =>
				return Ok(ToolResult::failure(format!(
					"{} The user_group argument is required for by_user_group popularity.",
					args::JSON_GENERATION_ERROR
				))),
			Popularity::ByUserGroup => input.user_group,
		};
		let items = input.items.filter(|items| !items.is_empty());
		let counts = self.ctx.catalog.popularity_counts(&groups, items.as_deref()).await?;

		if counts.is_empty() {
			return Ok(ToolResult::failure("The catalog query did not produce any result."));
		}

		let ranked = popularity::rank(&counts, k as usize, settings.quantile);

		if ranked.is_empty() {
			return Ok(ToolResult::failure("No item stands out as popular among the candidates."));
		}

		let mut message =
			format!("The IDs of the {} most popular items are returned.", ranked.len());

		if ranked.len() < k as usize {
			message.push_str(&format!(
				" Only {} items qualify as popular, fewer than the {k} requested.",
				ranked.len()
			));
		}

		Ok(ToolResult::success(message, ranked))
	}
}
impl ToolHandler for PopularItemsTool {
	fn spec(&self) -> ToolSpec {
		let groups = UserGroup::ALL.iter().map(UserGroup::as_str).collect::<Vec<_>>();

		ToolSpec {
			name: NAME.to_string(),
			description: "Returns the IDs of the k most popular items based on the number of \
			              ratings they received. If a list of item IDs is given, the popularity \
			              computation is restricted to those items. The popularity can optionally \
			              be computed based on a user group."
				.to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"popularity": { "type": "string", "enum": ["standard", "by_user_group"] },
					"k": { "type": "integer", "description": "Number of items to return." },
					"items": { "type": "array", "items": { "type": "integer" } },
					"user_group": {
						"type": "array",
						"items": { "type": "string", "enum": groups },
					},
					"statistics": {
						"type": "boolean",
						"description": "Set for statistics questions instead of rankings.",
					},
				},
				"required": ["popularity"],
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

use std::sync::Arc;

use serde_json::{Value, json};

use marquee_domain::{FilterOutcome, FilterRequest, filter};

use super::{ToolContext, args};
use crate::{
	BoxFuture, Result,
	tool::{ToolHandler, ToolResult, ToolSpec},
};

pub const NAME: &str = "item_filter";

const NO_MATCH: &str = "Unfortunately, the given conditions did not match any item in the \
database, so it is not possible to proceed with the next step. You do not have to perform other \
tool calls.";
const MATCHED: &str = "The IDs of the items satisfying the given conditions are returned. If \
another tool call is needed, you can now proceed to the next tool call. It is enough you pass \
this list to the \"items\" parameter of the next tool call.";

pub struct ItemFilterTool {
	ctx: Arc<ToolContext>,
}
impl ItemFilterTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let request: FilterRequest = match args::parse(arguments) {
			Ok(request) => request,
			Err(failure) => return Ok(failure),
		};
		let compilation =
			filter::compile(&request, &self.ctx.vocabulary, self.ctx.settings.fuzzy_threshold);
		let failed_note = if compilation.failed.is_empty() {
			String::new()
		} else {
			format!(
				"Note that corrections for these user conditions have been tried but failed: \
				 {}, so the final output will not take the failed conditions into consideration. ",
				join(&compilation.failed)
			)
		};
		let predicate = match &compilation.outcome {
			FilterOutcome::NoOp => return Ok(ToolResult::failure(args::JSON_GENERATION_ERROR)),
			FilterOutcome::Unsatisfiable =>
				return Ok(ToolResult::failure(format!("{failed_note}{NO_MATCH}"))),
			FilterOutcome::Compiled(predicate) => predicate,
		};

		tracing::debug!(predicate = %predicate, "Compiled item filter.");

		let ids = self.ctx.catalog.filter_items(predicate).await?;

		if ids.is_empty() {
			return Ok(ToolResult::failure(format!("{failed_note}{NO_MATCH}")));
		}

		let correction_note = if compilation.corrections.is_empty() {
			String::new()
		} else {
			format!(
				"Note that, in order to retrieve the items, the following corrections on the user \
				 conditions have been made: {}. ",
				join(&compilation.corrections)
			)
		};

		Ok(ToolResult::success(format!("{correction_note}{failed_note}{MATCHED}"), ids))
	}
}
impl ToolHandler for ItemFilterTool {
	fn spec(&self) -> ToolSpec {
		let comparison = json!({
			"type": "object",
			"properties": {
				"request": { "type": "string", "enum": ["higher", "lower", "exact"] },
				"threshold": { "type": "number" },
			},
			"required": ["threshold"],
		});

		ToolSpec {
			name: NAME.to_string(),
			description: "Returns the list of IDs of the items that satisfy the given conditions."
				.to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"actors": names("Actor names to filter by."),
					"genres": names("Movie genres to filter by."),
					"director": names("Director names to filter by."),
					"producer": names("Producer names to filter by."),
					"imdb_rating": comparison,
					"duration": comparison,
					"release_date": comparison,
					"release_month": { "type": "integer", "description": "Release month, 1-12." },
					"country": { "type": "string", "description": "Country of origin." },
				},
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

fn names(description: &str) -> Value {
	json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn join<T>(values: &[T]) -> String
where
	T: std::fmt::Display,
{
	values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use marquee_domain::{ItemField, ItemId, UserField, UserId};

use super::{ToolContext, args};
use crate::{
	BoxFuture, Result,
	tool::{ToolHandler, ToolResult, ToolSpec},
};

pub const ITEM_NAME: &str = "get_item_metadata";
pub const USER_NAME: &str = "get_user_metadata";

#[derive(Debug, Deserialize)]
struct ItemArgs {
	#[serde(deserialize_with = "args::ids")]
	items: Vec<ItemId>,
	#[serde(default = "default_item_fields", deserialize_with = "args::one_or_many")]
	get: Vec<ItemField>,
}

#[derive(Debug, Deserialize)]
struct UserArgs {
	#[serde(deserialize_with = "args::id")]
	user: UserId,
	#[serde(default = "default_user_fields", deserialize_with = "args::one_or_many")]
	get: Vec<UserField>,
}

pub struct ItemMetadataTool {
	ctx: Arc<ToolContext>,
}
impl ItemMetadataTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let ItemArgs { items, get } = match args::parse(arguments) {
			Ok(input) => input,
			Err(failure) => return Ok(failure),
		};

		if items.is_empty() {
			return Ok(ToolResult::failure(args::EMPTY_ITEMS));
		}

		let fields = if get.is_empty() { default_item_fields() } else { get };
		let found = self.ctx.catalog.items(&items).await?;

		if found.is_empty() {
			return Ok(ToolResult::failure(format!(
				"No information found for the given items: {items:?}."
			)));
		}

		let rows = found
			.iter()
			.map(|item| {
				let mut row = Map::new();

				row.insert("item_id".to_string(), Value::from(item.item_id));

				for field in &fields {
					row.insert(field.as_str().to_string(), item.field_value(*field));
				}

				Value::Object(row)
			})
			.collect::<Vec<_>>();

		Ok(ToolResult::success(
			"The requested metadata for the given item IDs is returned.",
			rows,
		))
	}
}
impl ToolHandler for ItemMetadataTool {
	fn spec(&self) -> ToolSpec {
		let fields = [
			ItemField::Title,
			ItemField::Description,
			ItemField::Genres,
			ItemField::Director,
			ItemField::Producer,
			ItemField::Duration,
			ItemField::ReleaseDate,
			ItemField::ReleaseMonth,
			ItemField::Country,
			ItemField::Actors,
			ItemField::ImdbRating,
			ItemField::Storyline,
		]
		.iter()
		.map(ItemField::as_str)
		.collect::<Vec<_>>();

		ToolSpec {
			name: ITEM_NAME.to_string(),
			description: "Returns the requested item metadata given the item ID(s).".to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"items": { "type": "array", "items": { "type": "integer" } },
					"get": {
						"type": "array",
						"items": { "type": "string", "enum": fields },
						"description": "Defaults to title, genres and description.",
					},
				},
				"required": ["items"],
			}),
		}
	}

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>> {
		Box::pin(self.run(arguments))
	}
}

pub struct UserMetadataTool {
	ctx: Arc<ToolContext>,
}
impl UserMetadataTool {
	pub fn new(ctx: Arc<ToolContext>) -> Self {
		Self { ctx }
	}

	async fn run(&self, arguments: &Value) -> Result<ToolResult> {
		let UserArgs { user, get } = match args::parse(arguments) {
			Ok(input) => input,
			Err(failure) => return Ok(failure),
		};
		let Some(found) = self.ctx.catalog.user(user).await? else {
			return Ok(ToolResult::failure(format!("No information found for user {user}.")));
		};
		let fields = if get.is_empty() { default_user_fields() } else { get };
		let data = fields
			.iter()
			.map(|field| (field.as_str().to_string(), found.field_value(*field)))
			.collect::<Map<_, _>>();

		Ok(ToolResult::success(
			format!("The requested metadata for user {user} is returned."),
			Value::Object(data),
		))
	}
}
impl ToolHandler for UserMetadataTool {
	fn spec(&self) -> ToolSpec {
		ToolSpec {
			name: USER_NAME.to_string(),
			description: "Returns the requested user metadata given the user ID.".to_string(),
			parameters: json!({
				"type": "object",
				"properties": {
					"user": { "type": "integer", "description": "User ID." },
					"get": {
						"type": "array",
						"items": { "type": "string", "enum": ["age_category", "gender"] },
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

fn default_item_fields() -> Vec<ItemField> {
	ItemField::DEFAULT_METADATA.to_vec()
}

fn default_user_fields() -> Vec<UserField> {
	vec![UserField::AgeCategory, UserField::Gender]
}

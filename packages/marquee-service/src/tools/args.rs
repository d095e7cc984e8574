//! Argument decoding shared by the tools.
//!
//! Reasoning engines are loose with types, so ids are accepted as integers, integral floats or
//! numeric strings, either alone or in a list.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use marquee_domain::ItemId;

use crate::tool::ToolResult;

pub const JSON_GENERATION_ERROR: &str =
	"Something went wrong in the tool call process. The LLM-generated JSON is invalid.";

pub const EMPTY_ITEMS: &str = "The given list of item IDs is empty.";

/// Decodes tool arguments. Failures come back as the tool result to report.
pub fn parse<T>(arguments: &Value) -> Result<T, ToolResult>
where
	T: DeserializeOwned,
{
	let decoded = match arguments {
		Value::String(raw) => serde_json::from_str::<Value>(raw)
			.map_err(|_| ToolResult::failure(JSON_GENERATION_ERROR))?,
		Value::Null => Value::Object(Default::default()),
		other => other.clone(),
	};

	serde_json::from_value(decoded)
		.map_err(|err| ToolResult::failure(format!("{JSON_GENERATION_ERROR} Details: {err}.")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
	Integer(i64),
	Float(f64),
	Text(String),
}
impl IdRepr {
	fn into_id(self) -> Result<i64, String> {
		match self {
			Self::Integer(id) => Ok(id),
			Self::Float(value) if value.fract() == 0.0 && value.is_finite() => Ok(value as i64),
			Self::Float(value) => Err(format!("{value} is not an integer id")),
			Self::Text(text) =>
				text.trim().parse().map_err(|_| format!("{text:?} is not an integer id")),
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdsRepr {
	Many(Vec<IdRepr>),
	One(IdRepr),
}
impl IdsRepr {
	fn into_ids(self) -> Result<Vec<ItemId>, String> {
		match self {
			Self::Many(ids) => ids.into_iter().map(IdRepr::into_id).collect(),
			Self::One(id) => id.into_id().map(|id| vec![id]),
		}
	}
}

pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	IdRepr::deserialize(deserializer)?.into_id().map_err(serde::de::Error::custom)
}

pub fn ids<'de, D>(deserializer: D) -> Result<Vec<ItemId>, D::Error>
where
	D: Deserializer<'de>,
{
	IdsRepr::deserialize(deserializer)?.into_ids().map_err(serde::de::Error::custom)
}

/// Like [`ids`], with `null` read as absent.
pub fn optional_ids<'de, D>(deserializer: D) -> Result<Option<Vec<ItemId>>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<IdsRepr>::deserialize(deserializer)?
		.map(IdsRepr::into_ids)
		.transpose()
		.map_err(serde::de::Error::custom)
}

/// A single value or a list of values.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany<T> {
		Many(Vec<T>),
		One(T),
	}

	Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
		Some(OneOrMany::Many(values)) => values,
		Some(OneOrMany::One(value)) => vec![value],
		None => Vec::new(),
	})
}

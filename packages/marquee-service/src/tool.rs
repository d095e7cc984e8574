use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BoxFuture, Result};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
	Success,
	Failure,
}

/// Outcome of a tool call as the reasoning engine sees it. `Failure` means the request could not
/// be satisfied logically; it never stands in for a transport error.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ToolResult {
	pub status: ToolStatus,
	pub message: String,
	#[serde(default)]
	pub data: Option<Value>,
}
impl ToolResult {
	pub fn success(message: impl Into<String>, data: impl Into<Value>) -> Self {
		Self { status: ToolStatus::Success, message: message.into(), data: Some(data.into()) }
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self { status: ToolStatus::Failure, message: message.into(), data: None }
	}

	pub fn is_success(&self) -> bool {
		self.status == ToolStatus::Success
	}

	/// JSON rendering used as the tool message content.
	pub fn to_content(&self) -> String {
		serde_json::to_string(self).unwrap_or_else(|_| {
			format!(r#"{{"status":"failure","message":{:?},"data":null}}"#, self.message)
		})
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ToolInvocationRequest {
	/// Correlation id echoed by the tool message that answers this request.
	pub id: String,
	pub name: String,
	pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolSpec {
	pub name: String,
	pub description: String,
	/// JSON schema of the argument object.
	pub parameters: Value,
}

pub trait ToolHandler
where
	Self: Send + Sync,
{
	fn spec(&self) -> ToolSpec;

	fn call<'a>(&'a self, arguments: &'a Value) -> BoxFuture<'a, Result<ToolResult>>;
}

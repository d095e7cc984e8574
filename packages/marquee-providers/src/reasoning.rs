//! Chat completions with tool calling.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// One assistant step: free text, tool calls, or both.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Completion {
	pub content: Option<String>,
	pub tool_calls: Vec<ToolCall>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolCall {
	pub id: String,
	pub name: String,
	/// Decoded arguments. Arguments that are not valid JSON are kept as a raw string so the
	/// tool can report them as malformed.
	pub arguments: Value,
}

/// Sends `messages` (chat wire format) with the `tools` schema list and returns the first choice.
pub async fn complete(
	cfg: &marquee_config::LlmProviderConfig,
	messages: &[Value],
	tools: &[Value],
) -> Result<Completion> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	if !tools.is_empty() {
		body["tools"] = Value::from(tools.to_vec());
		body["tool_choice"] = Value::from("auto");
	}

	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(&json)
}

/// Wire schema of a tool as the completions endpoint expects it.
pub fn tool_schema(name: &str, description: &str, parameters: &Value) -> Value {
	serde_json::json!({
		"type": "function",
		"function": {
			"name": name,
			"description": description,
			"parameters": parameters,
		},
	})
}

fn parse_completion(json: &Value) -> Result<Completion> {
	let message = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.ok_or_else(|| eyre::eyre!("Completion response is missing choices[0].message."))?;
	let content = message
		.get("content")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.filter(|content| !content.is_empty());
	let mut tool_calls = Vec::new();

	if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
		for (idx, call) in calls.iter().enumerate() {
			tool_calls.push(parse_tool_call(call, idx)?);
		}
	}

	Ok(Completion { content, tool_calls })
}

fn parse_tool_call(call: &Value, idx: usize) -> Result<ToolCall> {
	let function = call
		.get("function")
		.ok_or_else(|| eyre::eyre!("Tool call {idx} is missing its function."))?;
	let name = function
		.get("name")
		.and_then(|v| v.as_str())
		.ok_or_else(|| eyre::eyre!("Tool call {idx} is missing its function name."))?;
	let id = call
		.get("id")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.unwrap_or_else(|| format!("call_{idx}"));
	let arguments = match function.get("arguments") {
		Some(Value::String(raw)) if raw.trim().is_empty() => Value::Object(Default::default()),
		Some(Value::String(raw)) =>
			serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
		Some(other) => other.clone(),
		None => Value::Object(Default::default()),
	};

	Ok(ToolCall { id, name: name.to_string(), arguments })
}

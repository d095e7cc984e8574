use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		marquee_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	assert!(marquee_providers::auth_headers("secret", &defaults).is_err());
}

#[test]
fn wraps_tool_schema_as_function() {
	let parameters = serde_json::json!({ "type": "object", "properties": {} });
	let schema =
		marquee_providers::reasoning::tool_schema("item_filter", "Filter items.", &parameters);

	assert_eq!(schema["type"], "function");
	assert_eq!(schema["function"]["name"], "item_filter");
	assert_eq!(schema["function"]["parameters"], parameters);
}

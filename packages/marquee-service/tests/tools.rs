mod common;

use serde_json::{Value, json};

use marquee_service::{ToolResult, ToolSettings, ToolStatus, tools::args};

use common::registry;

async fn call(name: &str, arguments: Value) -> ToolResult {
	call_with(ToolSettings::default(), name, arguments).await
}

async fn call_with(settings: ToolSettings, name: &str, arguments: Value) -> ToolResult {
	let registry = registry(settings);
	let handler = registry.get(name).expect("Tool is not registered.");

	handler.call(&arguments).await.expect("Tool call errored.")
}

#[test]
fn registers_all_catalog_tools() {
	let registry = registry(ToolSettings::default());

	assert_eq!(
		registry.names(),
		vec![
			"get_interacted_items",
			"get_item_metadata",
			"get_like_percentage",
			"get_popular_items",
			"get_top_k_recommendations",
			"get_user_metadata",
			"item_filter",
			"vector_store_search",
		]
	);
}

#[tokio::test]
async fn item_filter_reports_corrections_and_failures() {
	let result = call("item_filter", json!({})).await;

	assert_eq!(result.status, ToolStatus::Failure);
	assert_eq!(result.message, args::JSON_GENERATION_ERROR);

	let result = call("item_filter", json!({ "genres": ["Xyzzy"] })).await;

	assert_eq!(result.status, ToolStatus::Failure);
	assert!(result.message.contains("tried but failed: Xyzzy"), "{}", result.message);
	assert!(result.message.contains("did not match any item"));
	assert_eq!(result.data, None);

	let result =
		call("item_filter", json!({ "genres": "comedy", "actors": ["Xyzzy Qwerty"] })).await;

	assert!(result.is_success(), "{}", result.message);
	assert_eq!(result.data, Some(json!([1, 3])));
	assert!(result.message.contains("comedy -> Comedy"), "{}", result.message);
	assert!(result.message.contains("tried but failed: Xyzzy Qwerty"), "{}", result.message);

	let result = call(
		"item_filter",
		json!({ "duration": { "comparison": "higher", "threshold": 150 }, "country": "unk" }),
	)
	.await;

	assert_eq!(result.data, Some(json!([2, 4])));
	assert!(!result.message.contains("corrections"));
}

#[tokio::test]
async fn item_filter_distinguishes_malformed_from_no_match() {
	let result = call("item_filter", json!({ "mood": ["happy"] })).await;

	assert!(result.message.starts_with(args::JSON_GENERATION_ERROR), "{}", result.message);

	let result = call("item_filter", json!({ "genres": ["Drama"], "duration": 81 })).await;

	assert_eq!(result.status, ToolStatus::Failure);
	assert!(result.message.contains("did not match any item"));

	let result = call("item_filter", Value::from(r#"{"genres": ["Crime"]}"#)).await;

	assert_eq!(result.data, Some(json!([2, 4])));
}

#[tokio::test]
async fn popular_items_apply_the_quantile_cutoff() {
	let result = call("get_popular_items", json!({ "popularity": "standard", "k": 2 })).await;

	assert_eq!(result.data, Some(json!([1])));
	assert!(result.message.contains("Only 1 items qualify"), "{}", result.message);

	let result = call(
		"get_popular_items",
		json!({ "popularity": "by_user_group", "user_group": ["kid"] }),
	)
	.await;

	assert_eq!(result.data, Some(json!([1])));

	let result = call("get_popular_items", json!({ "popularity": "by_user_group" })).await;

	assert_eq!(result.status, ToolStatus::Failure);

	let result = call("get_popular_items", json!({ "popularity": "trending" })).await;

	assert_eq!(result.status, ToolStatus::Failure);
}

#[tokio::test]
async fn item_metadata_follows_request_order() {
	let result = call(
		"get_item_metadata",
		json!({ "items": [3, "1", 42], "get": ["title", "duration", "director"] }),
	)
	.await;

	assert_eq!(
		result.data,
		Some(json!([
			{ "item_id": 3, "title": "Jumanji", "duration": 104, "director": "unknown" },
			{ "item_id": 1, "title": "Toy Story", "duration": 81, "director": "unknown" },
		]))
	);

	let result = call("get_item_metadata", json!({ "items": [] })).await;

	assert_eq!(result.message, args::EMPTY_ITEMS);

	let result = call("get_item_metadata", json!({ "items": [42] })).await;

	assert_eq!(result.message, "No information found for the given items: [42].");
}

#[tokio::test]
async fn user_metadata_and_interactions() {
	let result = call("get_user_metadata", json!({ "user": 1, "get": ["gender"] })).await;

	assert_eq!(result.data, Some(json!({ "gender": "female" })));

	let result = call("get_user_metadata", json!({ "user": 99 })).await;

	assert_eq!(result.message, "No information found for user 99.");

	let settings = ToolSettings { interacted_limit: 2, ..Default::default() };
	let result = call_with(settings.clone(), "get_interacted_items", json!({ "user": 1 })).await;

	assert_eq!(result.data, Some(json!([1, 3])));
	assert!(result.message.contains("more than 2 items"), "{}", result.message);

	let result = call_with(settings.clone(), "get_interacted_items", json!({ "user": 2 })).await;

	assert_eq!(result.data, Some(json!([1])));
	assert_eq!(result.message, "All items user 2 interacted with are returned.");

	let result = call_with(settings, "get_interacted_items", json!({ "user": 3 })).await;

	assert_eq!(result.message, "No interaction information found for user 3.");
}

#[tokio::test]
async fn like_percentage_is_a_share_of_all_users() {
	let result = call("get_like_percentage", json!({ "items": [1] })).await;

	assert_eq!(result.data, Some(json!("66.67%")));

	let result = call("get_like_percentage", json!({ "items": [] })).await;

	assert_eq!(result.message, args::EMPTY_ITEMS);
}

#[tokio::test]
async fn recommendations_use_the_default_k() {
	let result = call("get_top_k_recommendations", json!({ "user": "1" })).await;

	assert_eq!(result.data, Some(json!([1, 2, 3, 4])));

	let result = call("get_top_k_recommendations", json!({ "user": 1, "k": 2 })).await;

	assert_eq!(result.data, Some(json!([1, 2])));
	assert_eq!(result.message, "The top 2 recommendations for user 1 are returned.");

	let result = call("get_top_k_recommendations", json!({ "user": 1, "items": [] })).await;

	assert_eq!(result.message, args::EMPTY_ITEMS);

	let result = call("get_top_k_recommendations", json!({ "k": 2 })).await;

	assert_eq!(result.status, ToolStatus::Failure);
}

#[tokio::test]
async fn vector_search_skips_self_matches() {
	let result =
		call("vector_store_search", json!({ "query": "Two men plan a heist in LA." })).await;

	assert_eq!(result.data, Some(json!([1])));

	let result = call("vector_store_search", json!({ "query": "  " })).await;

	assert_eq!(result.status, ToolStatus::Failure);
}

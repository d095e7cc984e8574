mod common;

use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use color_eyre::eyre;
use serde_json::{Value, json};

use marquee_service::{
	BoxFuture, Conversation, Dispatcher, Error, Example, ExampleRetriever, MarqueeService,
	Message, MessageContent, Orchestrator, OrchestratorSettings, ReasoningEngine, ReasoningStep,
	Role, ToolHandler, ToolResult, ToolSettings, ToolSpec, TurnState,
};

use common::{ScriptedEngine, orchestrator, request, settings};

/// Requests the same tool forever.
struct LoopingEngine {
	calls: AtomicUsize,
}
impl ReasoningEngine for LoopingEngine {
	fn invoke<'a>(
		&'a self,
		_messages: &'a [Message],
		_tools: &'a [ToolSpec],
	) -> BoxFuture<'a, color_eyre::Result<ReasoningStep>> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);
		let step = ReasoningStep::tools(vec![request(
			&format!("call_{call}"),
			"get_like_percentage",
			json!({ "items": [1] }),
		)]);

		Box::pin(async move { Ok(step) })
	}
}

struct SlowEngine;
impl ReasoningEngine for SlowEngine {
	fn invoke<'a>(
		&'a self,
		_messages: &'a [Message],
		_tools: &'a [ToolSpec],
	) -> BoxFuture<'a, color_eyre::Result<ReasoningStep>> {
		Box::pin(async move {
			tokio::time::sleep(Duration::from_secs(5)).await;

			Ok(ReasoningStep::answer("Too late."))
		})
	}
}

/// A tool that outlives any reasonable caller.
struct StalledTool;
impl ToolHandler for StalledTool {
	fn spec(&self) -> ToolSpec {
		ToolSpec {
			name: "stalled".to_string(),
			description: "Never answers in time.".to_string(),
			parameters: json!({ "type": "object" }),
		}
	}

	fn call<'a>(
		&'a self,
		_arguments: &'a Value,
	) -> BoxFuture<'a, marquee_service::Result<ToolResult>> {
		Box::pin(async move {
			tokio::time::sleep(Duration::from_secs(3)).await;

			Ok(ToolResult::success("Done.", Value::Null))
		})
	}
}

fn assert_requests_answered(window: &[Message]) {
	for (idx, message) in window.iter().enumerate() {
		if message.role != Role::Assistant || message.tool_requests.is_empty() {
			continue;
		}

		let answered =
			window[idx + 1..].iter().take_while(|next| next.role == Role::Tool).count();

		assert_eq!(answered, message.tool_requests.len(), "Unanswered request in {window:?}");
	}
}

struct FixedExamples {
	score: Option<f32>,
}
impl ExampleRetriever for FixedExamples {
	fn retrieve<'a>(
		&'a self,
		_query: &'a str,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Example>>> {
		let score = self.score;

		Box::pin(async move {
			let score = score.ok_or_else(|| eyre::eyre!("Examples are unavailable."))?;

			Ok(vec![Example {
				query: "Recommend some comedies to user 1.".to_string(),
				plan: "item_filter(genres=[Comedy]) -> get_top_k_recommendations(user=1)"
					.to_string(),
				score,
			}])
		})
	}
}

fn tool_data(message: &Message) -> Option<Value> {
	match &message.content {
		MessageContent::ToolResult(result) => result.data.clone(),
		MessageContent::Text(_) => None,
	}
}

#[tokio::test]
async fn filter_then_recommend_then_answer() {
	let engine = Arc::new(ScriptedEngine::new(vec![
		ReasoningStep::tools(vec![request(
			"call_1",
			"item_filter",
			json!({ "genres": ["Commedy"] }),
		)]),
		ReasoningStep::tools(vec![request(
			"call_2",
			"get_top_k_recommendations",
			json!({ "user": 1, "k": 1, "items": [1, 3] }),
		)]),
		ReasoningStep::answer("You might enjoy Toy Story."),
	]));
	let orchestrator = orchestrator(engine.clone(), settings());
	let mut conversation = Conversation::new("thread-1");
	let report = orchestrator
		.advance(&mut conversation, "Recommend a comedy for user 1.")
		.await
		.expect("Turn failed.");

	assert_eq!(report.answer, "You might enjoy Toy Story.");
	assert_eq!(report.iterations, 3);
	assert_eq!(report.tool_invocations, 2);
	assert_eq!(report.state, TurnState::Done);

	let roles = conversation.messages().iter().map(|message| message.role).collect::<Vec<_>>();

	assert_eq!(
		roles,
		vec![
			Role::System,
			Role::User,
			Role::Assistant,
			Role::Tool,
			Role::Assistant,
			Role::Tool,
			Role::Assistant,
		]
	);

	let filter_message = &conversation.messages()[3];

	assert_eq!(filter_message.tool_call_id.as_deref(), Some("call_1"));
	assert!(filter_message.text_content().contains("Commedy -> Comedy"));
	assert_eq!(tool_data(filter_message), Some(json!([1, 3])));
	assert_eq!(tool_data(&conversation.messages()[5]), Some(json!([1])));

	// The second reasoning call sees the filter result.
	let windows = engine.windows();

	assert_eq!(windows.len(), 3);
	assert_eq!(windows[1].last().map(|message| message.role), Some(Role::Tool));
}

#[tokio::test]
async fn always_calling_tools_hits_the_iteration_limit() {
	let engine = Arc::new(LoopingEngine { calls: AtomicUsize::new(0) });
	let orchestrator =
		orchestrator(engine.clone(), OrchestratorSettings { max_iterations: 3, ..settings() });
	let mut conversation = Conversation::new("thread-loop");
	let err = orchestrator
		.advance(&mut conversation, "How many people like Toy Story?")
		.await
		.expect_err("Expected the iteration limit.");

	assert!(matches!(err, Error::IterationLimit { limit: 3 }));
	assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
	// Messages appended before the failure stay in history.
	assert_eq!(conversation.len(), 2 + 3 * 2);
}

#[tokio::test]
async fn unknown_tools_are_reported_back_to_the_engine() {
	let engine = Arc::new(ScriptedEngine::new(vec![
		ReasoningStep::tools(vec![request("call_1", "does_not_exist", json!({}))]),
		ReasoningStep::answer("I could not do that."),
	]));
	let orchestrator = orchestrator(engine, settings());
	let mut conversation = Conversation::new("thread-unknown");
	let report =
		orchestrator.advance(&mut conversation, "Do something odd.").await.expect("Turn failed.");

	assert_eq!(report.answer, "I could not do that.");
	assert_eq!(
		conversation.messages()[3].text_content(),
		r#"{"status":"failure","message":"Unknown tool: does_not_exist.","data":null}"#
	);
}

#[tokio::test]
async fn tool_results_keep_request_order() {
	let batch = vec![
		request("call_a", "get_user_metadata", json!({ "user": 1 })),
		request("call_b", "get_like_percentage", json!({ "items": [1] })),
		request("call_c", "get_interacted_items", json!({ "user": 1 })),
	];

	for parallel in [false, true] {
		let engine = Arc::new(ScriptedEngine::new(vec![
			ReasoningStep::tools(batch.clone()),
			ReasoningStep::answer("Done."),
		]));
		let orchestrator =
			orchestrator(engine, OrchestratorSettings { parallel_tools: parallel, ..settings() });
		let mut conversation = Conversation::new("thread-batch");

		orchestrator
			.advance(&mut conversation, "Tell me about user 1.")
			.await
			.expect("Turn failed.");

		let call_ids = conversation
			.messages()
			.iter()
			.filter_map(|message| message.tool_call_id.as_deref())
			.collect::<Vec<_>>();

		assert_eq!(call_ids, vec!["call_a", "call_b", "call_c"]);
	}
}

#[tokio::test]
async fn preamble_is_injected_once_and_history_persists() {
	let engine = Arc::new(ScriptedEngine::new(vec![
		ReasoningStep::answer("Hello."),
		ReasoningStep::answer("Hello again."),
	]));
	let orchestrator = orchestrator(engine.clone(), settings());
	let mut conversation = Conversation::new("thread-2");

	orchestrator.advance(&mut conversation, "Hi.").await.expect("Turn failed.");
	orchestrator.advance(&mut conversation, "Hi again.").await.expect("Turn failed.");

	let systems =
		conversation.messages().iter().filter(|message| message.role == Role::System).count();

	assert_eq!(systems, 1);
	assert_eq!(conversation.len(), 5);
	assert_eq!(engine.windows()[1].len(), 4);
}

#[tokio::test]
async fn reasoning_timeout_and_errors_abort_the_turn() {
	let orchestrator = orchestrator(
		Arc::new(SlowEngine),
		OrchestratorSettings { reasoning_timeout: Duration::from_millis(20), ..settings() },
	);
	let mut conversation = Conversation::new("thread-slow");
	let err = orchestrator
		.advance(&mut conversation, "Anything?")
		.await
		.expect_err("Expected a timeout.");

	assert!(matches!(err, Error::Timeout { stage: "reasoning", timeout_ms: 20 }));

	let orchestrator = orchestrator_with_empty_script();
	let mut conversation = Conversation::new("thread-empty");
	let err = orchestrator
		.advance(&mut conversation, "Anything?")
		.await
		.expect_err("Expected a provider error.");

	assert!(matches!(err, Error::Provider { .. }));
}

fn orchestrator_with_empty_script() -> Orchestrator {
	orchestrator(Arc::new(ScriptedEngine::new(Vec::new())), settings())
}

#[tokio::test]
async fn close_examples_rewrite_the_user_message() {
	for (score, rewritten) in [(Some(0.9), true), (Some(0.5), false), (None, false)] {
		let engine = Arc::new(ScriptedEngine::new(vec![ReasoningStep::answer("Sure.")]));
		let orchestrator = orchestrator(engine, settings())
			.with_examples(Arc::new(FixedExamples { score }));
		let mut conversation = Conversation::new("thread-examples");

		orchestrator.advance(&mut conversation, "Any comedies?").await.expect("Turn failed.");

		let user = conversation.messages()[1].text_content();

		assert_eq!(user.contains("Target user query: Any comedies?"), rewritten, "{score:?}");

		if !rewritten {
			assert_eq!(user, "Any comedies?");
		}
	}
}

#[tokio::test]
async fn service_hosts_conversations_by_thread() {
	let engine = Arc::new(ScriptedEngine::new(vec![ReasoningStep::answer("Hello.")]));
	let service = MarqueeService::new(orchestrator(engine, settings()));
	let thread_id = service.start_conversation();

	assert!(service.history(&thread_id).await.expect("history").is_empty());

	let response = service.chat(&thread_id, "  Hi.  ").await.expect("Turn failed.");

	assert_eq!(response.answer, "Hello.");
	assert_eq!(response.thread_id, thread_id);
	assert_eq!(service.history(&thread_id).await.expect("history")[1].text_content(), "Hi.");

	let err = service.chat(&thread_id, "   ").await.expect_err("Expected invalid input.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let err = service.history("missing").await.expect_err("Expected a missing thread.");

	assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn cancelled_turn_leaves_usable_history() {
	let mut registry = common::registry(ToolSettings::default());

	registry.register(Arc::new(StalledTool)).expect("Failed to register tool.");

	let engine = Arc::new(ScriptedEngine::new(vec![
		ReasoningStep::tools(vec![request("call_1", "stalled", json!({}))]),
		ReasoningStep::answer("Here is what I found."),
	]));
	let dispatcher = Dispatcher::new(Arc::new(registry), Duration::from_secs(5));
	let orchestrator = Orchestrator::new(engine.clone(), dispatcher, settings());
	let mut conversation = Conversation::new("t1");
	let cancelled = tokio::time::timeout(
		Duration::from_millis(100),
		orchestrator.advance(&mut conversation, "Find something slow."),
	)
	.await;

	assert!(cancelled.is_err());

	let roles = conversation.messages().iter().map(|message| message.role).collect::<Vec<_>>();

	assert_eq!(roles, vec![Role::System, Role::User]);

	let report = orchestrator
		.advance(&mut conversation, "Never mind, just answer.")
		.await
		.expect("Turn failed.");

	assert_eq!(report.answer, "Here is what I found.");

	let windows = engine.windows();

	assert_eq!(windows.len(), 2);

	for window in &windows {
		assert_requests_answered(window);
	}

	assert_requests_answered(conversation.messages());
}

#[tokio::test]
async fn unanswered_requests_in_history_never_reach_the_engine() {
	let engine = Arc::new(ScriptedEngine::new(vec![ReasoningStep::answer("Sure.")]));
	let orchestrator = orchestrator(engine.clone(), settings());
	let mut conversation = Conversation::new("t1");

	conversation
		.append(Message::system("You are a movie recommendation assistant."))
		.expect("append failed");
	conversation.mark_started();
	conversation.append(Message::user("Find comedies.")).expect("append failed");
	conversation
		.append(Message::assistant("", vec![request("lost", "item_filter", json!({}))]))
		.expect("append failed");

	orchestrator.advance(&mut conversation, "Any comedy will do.").await.expect("Turn failed.");

	let windows = engine.windows();
	let roles = windows[0].iter().map(|message| message.role).collect::<Vec<_>>();

	assert_eq!(roles, vec![Role::System, Role::User, Role::User]);
	assert_requests_answered(&windows[0]);
}

//! The tool-calling turn loop.
//!
//! A turn alternates between asking the reasoning engine for the next step and running the tools
//! it requested, until the engine answers without requesting tools.

use std::{sync::Arc, time::Duration};

use tokio::time;

use crate::{
	BoxFuture, Error, Result,
	conversation::{Conversation, Message},
	dispatch::Dispatcher,
	tool::{ToolInvocationRequest, ToolSpec},
	trim,
};

/// Stage label used in timeout errors.
const REASONING_STAGE: &str = "reasoning";

pub trait ReasoningEngine
where
	Self: Send + Sync,
{
	fn invoke<'a>(
		&'a self,
		messages: &'a [Message],
		tools: &'a [ToolSpec],
	) -> BoxFuture<'a, color_eyre::Result<ReasoningStep>>;
}

pub trait ExampleRetriever
where
	Self: Send + Sync,
{
	fn retrieve<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Example>>>;
}

/// What the reasoning engine returned for one window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReasoningStep {
	pub text: Option<String>,
	pub tool_requests: Vec<ToolInvocationRequest>,
}
impl ReasoningStep {
	pub fn answer(text: impl Into<String>) -> Self {
		Self { text: Some(text.into()), tool_requests: Vec::new() }
	}

	pub fn tools(tool_requests: Vec<ToolInvocationRequest>) -> Self {
		Self { text: None, tool_requests }
	}
}

/// A stored query with the tool plan that answered it.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
	pub query: String,
	pub plan: String,
	pub score: f32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
	AwaitingReasoning,
	AwaitingTools,
	Done,
}

#[derive(Clone, Debug)]
pub struct OrchestratorSettings {
	pub system_prompt: String,
	pub max_iterations: u32,
	pub max_window_tokens: usize,
	pub reasoning_timeout: Duration,
	pub parallel_tools: bool,
	pub examples_min_score: f32,
	pub examples_limit: u32,
}
impl OrchestratorSettings {
	pub fn from_config(cfg: &marquee_config::Config) -> Self {
		let agent = &cfg.agent;

		Self {
			system_prompt: agent.system_prompt.clone(),
			max_iterations: agent.max_iterations,
			max_window_tokens: agent.max_window_tokens,
			reasoning_timeout: Duration::from_millis(cfg.providers.reasoning.timeout_ms),
			parallel_tools: agent.parallel_tools,
			examples_min_score: agent.in_context_examples.min_score,
			examples_limit: agent.in_context_examples.limit,
		}
	}
}
impl Default for OrchestratorSettings {
	fn default() -> Self {
		Self {
			system_prompt: String::new(),
			max_iterations: 16,
			max_window_tokens: trim::DEFAULT_MAX_TOKENS,
			reasoning_timeout: Duration::from_secs(60),
			parallel_tools: false,
			examples_min_score: 0.7,
			examples_limit: 3,
		}
	}
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TurnReport {
	pub answer: String,
	/// Reasoning calls made during the turn.
	pub iterations: u32,
	pub tool_invocations: usize,
	pub state: TurnState,
}

pub struct Orchestrator {
	engine: Arc<dyn ReasoningEngine>,
	dispatcher: Dispatcher,
	examples: Option<Arc<dyn ExampleRetriever>>,
	settings: OrchestratorSettings,
}
impl Orchestrator {
	pub fn new(
		engine: Arc<dyn ReasoningEngine>,
		dispatcher: Dispatcher,
		settings: OrchestratorSettings,
	) -> Self {
		Self { engine, dispatcher, examples: None, settings }
	}

	pub fn with_examples(mut self, examples: Arc<dyn ExampleRetriever>) -> Self {
		self.examples = Some(examples);

		self
	}

	pub fn settings(&self) -> &OrchestratorSettings {
		&self.settings
	}

	/// Runs one turn: appends `input`, then loops reasoning and tool calls until the engine
	/// answers. Errors abort the turn; messages appended before the error stay in history. An
	/// assistant message requesting tools is appended only together with all of its results.
	pub async fn advance(
		&self,
		conversation: &mut Conversation,
		input: &str,
	) -> Result<TurnReport> {
		if !conversation.is_started() {
			if !self.settings.system_prompt.is_empty() {
				conversation.append(Message::system(self.settings.system_prompt.clone()))?;
			}

			conversation.mark_started();
		}

		let content = self.rewrite_input(input).await;

		conversation.append(Message::user(content))?;

		let specs = self.dispatcher.registry().specs();
		let mut state = TurnState::AwaitingReasoning;
		let mut iterations = 0;
		let mut tool_invocations = 0;

		loop {
			if iterations >= self.settings.max_iterations {
				tracing::error!(
					thread_id = %conversation.thread_id(),
					limit = self.settings.max_iterations,
					"Turn exceeded the iteration limit."
				);

				return Err(Error::IterationLimit { limit: self.settings.max_iterations });
			}

			iterations += 1;

			let window = trim::trim(conversation.messages(), self.settings.max_window_tokens);
			let step = match time::timeout(
				self.settings.reasoning_timeout,
				self.engine.invoke(&window, &specs),
			)
			.await
			{
				Ok(step) => step?,
				Err(_) =>
					return Err(Error::Timeout {
						stage: REASONING_STAGE,
						timeout_ms: self.settings.reasoning_timeout.as_millis() as u64,
					}),
			};
			let ReasoningStep { text, tool_requests } = step;

			let assistant =
				Message::assistant(text.clone().unwrap_or_default(), tool_requests.clone());

			if tool_requests.is_empty() {
				conversation.append(assistant)?;

				state = transition(conversation, state, TurnState::Done, iterations);

				return Ok(TurnReport {
					answer: text.unwrap_or_default(),
					iterations,
					tool_invocations,
					state,
				});
			}

			state = transition(conversation, state, TurnState::AwaitingTools, iterations);

			let results =
				self.dispatcher.dispatch_all(&tool_requests, self.settings.parallel_tools).await;

			tool_invocations += results.len();

			// The request batch and its results land together, so dropping the turn while tools
			// run leaves no unanswered request in history.
			conversation.append(assistant)?;

			for (request, result) in tool_requests.iter().zip(results) {
				conversation.append(Message::tool(request, result))?;
			}

			state = transition(conversation, state, TurnState::AwaitingReasoning, iterations);
		}
	}

	/// Prepends retrieved example plans to `input` when the best one is close enough.
	async fn rewrite_input(&self, input: &str) -> String {
		let Some(retriever) = self.examples.as_ref() else {
			return input.to_string();
		};
		let examples = match retriever.retrieve(input, self.settings.examples_limit).await {
			Ok(examples) => examples,
			Err(err) => {
				tracing::warn!(error = %err, "Example retrieval failed. Using the raw input.");

				return input.to_string();
			},
		};
		let best = examples.iter().map(|example| example.score).fold(f32::NEG_INFINITY, f32::max);

		if examples.is_empty() || best <= self.settings.examples_min_score {
			return input.to_string();
		}

		format_examples(&examples, input)
	}
}

fn transition(
	conversation: &Conversation,
	from: TurnState,
	to: TurnState,
	iteration: u32,
) -> TurnState {
	tracing::debug!(
		thread_id = %conversation.thread_id(),
		iteration,
		from = ?from,
		to = ?to,
		"Turn state changed."
	);

	to
}

fn format_examples(examples: &[Example], input: &str) -> String {
	let mut out = String::from(
		"Here are some examples of user queries and the tool plans that answer them.\n\n",
	);

	for (idx, example) in examples.iter().enumerate() {
		out.push_str(&format!(
			"Example {}:\nUser query: {}\nPlan: {}\n\n",
			idx + 1,
			example.query,
			example.plan
		));
	}

	out.push_str(&format!("Target user query: {input}\n\n**Call** the planned tools."));

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_examples_before_the_target_query() {
		let examples = vec![Example {
			query: "Recommend comedies.".to_string(),
			plan: "item_filter -> get_top_k_recommendations".to_string(),
			score: 0.9,
		}];
		let content = format_examples(&examples, "Any funny films?");

		assert!(content.contains("Example 1:\nUser query: Recommend comedies."));
		assert!(
			content.ends_with("Target user query: Any funny films?\n\n**Call** the planned tools.")
		);
	}
}

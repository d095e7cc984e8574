pub mod catalog;
pub mod conversation;
pub mod dispatch;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod tool;
pub mod tools;
pub mod trim;

mod error;

pub use catalog::{Catalog, MemoryCatalog, PgCatalog};
pub use conversation::{Conversation, ConversationStore, Message, MessageContent, Role};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use orchestrator::{
	Example, ExampleRetriever, Orchestrator, OrchestratorSettings, ReasoningEngine, ReasoningStep,
	TurnReport, TurnState,
};
pub use providers::{Recommender, SemanticIndex};
pub use registry::ToolRegistry;
pub use tool::{ToolHandler, ToolInvocationRequest, ToolResult, ToolSpec, ToolStatus};
pub use tools::{ToolContext, ToolSettings};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde::Serialize;

use marquee_config::Config;
use marquee_storage::{db::Db, qdrant::QdrantStore};
use providers::{
	HttpRecommender, ProviderReasoningEngine, QdrantExampleRetriever, QdrantSemanticIndex,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatResponse {
	pub thread_id: String,
	pub answer: String,
	pub iterations: u32,
	pub tool_invocations: usize,
}

pub struct MarqueeService {
	orchestrator: Orchestrator,
	conversations: ConversationStore,
}
impl MarqueeService {
	pub fn new(orchestrator: Orchestrator) -> Self {
		Self { orchestrator, conversations: ConversationStore::default() }
	}

	/// Wires the service against Postgres, Qdrant and the configured providers.
	pub async fn connect(cfg: &Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;

		db.ensure_schema().await?;

		let catalog = PgCatalog::new(db.pool.clone());
		let vocabulary = catalog.vocabulary().await?;
		let qdrant = Arc::new(QdrantStore::new(&cfg.storage.qdrant)?);
		let ctx = Arc::new(ToolContext {
			catalog: Arc::new(catalog),
			vocabulary: Arc::new(vocabulary),
			recommender: Arc::new(HttpRecommender::new(cfg.providers.recommender.clone())),
			semantic: Arc::new(QdrantSemanticIndex::new(
				qdrant.clone(),
				cfg.providers.embedding.clone(),
			)),
			settings: ToolSettings::from_config(cfg),
		});
		let mut registry = ToolRegistry::new();

		tools::register_default_tools(&mut registry, ctx)?;

		let tool_count = registry.len();
		let dispatcher = Dispatcher::new(
			Arc::new(registry),
			Duration::from_millis(cfg.agent.tool_timeout_ms),
		);
		let engine = Arc::new(ProviderReasoningEngine::new(cfg.providers.reasoning.clone()));
		let mut orchestrator =
			Orchestrator::new(engine, dispatcher, OrchestratorSettings::from_config(cfg));

		if cfg.agent.in_context_examples.enabled {
			orchestrator = orchestrator.with_examples(Arc::new(QdrantExampleRetriever::new(
				qdrant,
				cfg.providers.embedding.clone(),
			)));
		}

		tracing::info!(
			tools = tool_count,
			examples = cfg.agent.in_context_examples.enabled,
			"Service ready."
		);

		Ok(Self::new(orchestrator))
	}

	pub fn conversations(&self) -> &ConversationStore {
		&self.conversations
	}

	/// Opens an empty conversation and returns its thread id.
	pub fn start_conversation(&self) -> String {
		let thread_id = self.conversations.create();

		tracing::info!(thread_id = %thread_id, "Conversation started.");

		thread_id
	}

	/// Runs one turn on `thread_id`, creating the conversation on first use. Turns on the same
	/// thread are serialized.
	pub async fn chat(&self, thread_id: &str, input: &str) -> Result<ChatResponse> {
		let input = input.trim();

		if thread_id.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "thread_id must not be empty.".to_string(),
			});
		}
		if input.is_empty() {
			return Err(Error::InvalidRequest { message: "input must not be empty.".to_string() });
		}

		let conversation = self.conversations.get_or_create(thread_id);
		let mut conversation = conversation.lock().await;
		let report = match self.orchestrator.advance(&mut conversation, input).await {
			Ok(report) => report,
			Err(err) => {
				tracing::error!(thread_id = %thread_id, error = %err, "Turn failed.");

				return Err(err);
			},
		};

		tracing::info!(
			thread_id = %thread_id,
			iterations = report.iterations,
			tool_invocations = report.tool_invocations,
			"Turn finished."
		);

		Ok(ChatResponse {
			thread_id: thread_id.to_string(),
			answer: report.answer,
			iterations: report.iterations,
			tool_invocations: report.tool_invocations,
		})
	}

	pub async fn history(&self, thread_id: &str) -> Result<Vec<Message>> {
		let Some(conversation) = self.conversations.get(thread_id) else {
			return Err(Error::NotFound { message: format!("Unknown thread {thread_id}.") });
		};
		let conversation = conversation.lock().await;

		Ok(conversation.messages().to_vec())
	}
}

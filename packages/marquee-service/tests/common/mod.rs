#![allow(dead_code)]

use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
	time::Duration,
};

use color_eyre::eyre;
use serde_json::Value;

use marquee_domain::{Item, ItemId, RatingCounts, User, UserId};
use marquee_service::{
	BoxFuture, Dispatcher, MemoryCatalog, Message, Orchestrator, OrchestratorSettings,
	ReasoningEngine, ReasoningStep, Recommender, SemanticIndex, ToolContext,
	ToolInvocationRequest, ToolRegistry, ToolSettings, ToolSpec, tools,
};
use marquee_storage::qdrant::StorylineHit;

pub fn items() -> Vec<Item> {
	vec![
		Item {
			item_id: 1,
			title: Some("Toy Story".to_string()),
			genres: vec!["Animation".to_string(), "Comedy".to_string()],
			actors: vec!["Tom Hanks".to_string(), "Tim Allen".to_string()],
			country: Some("USA".to_string()),
			duration: Some(81),
			ratings: RatingCounts { total: 120, kid: 40, ..Default::default() },
			..Default::default()
		},
		Item {
			item_id: 2,
			title: Some("Heat".to_string()),
			genres: vec!["Action".to_string(), "Crime".to_string()],
			actors: vec!["Al Pacino".to_string()],
			country: Some("USA".to_string()),
			duration: Some(170),
			ratings: RatingCounts { total: 90, adult: 60, ..Default::default() },
			..Default::default()
		},
		Item {
			item_id: 3,
			title: Some("Jumanji".to_string()),
			genres: vec!["Adventure".to_string(), "Comedy".to_string()],
			actors: vec!["Robin Williams".to_string()],
			country: Some("USA".to_string()),
			duration: Some(104),
			ratings: RatingCounts { total: 10, ..Default::default() },
			..Default::default()
		},
		Item {
			item_id: 4,
			title: Some("Casino".to_string()),
			genres: vec!["Crime".to_string(), "Drama".to_string()],
			actors: vec!["Robert De Niro".to_string()],
			country: Some("USA".to_string()),
			duration: Some(178),
			ratings: RatingCounts { total: 5, ..Default::default() },
			..Default::default()
		},
	]
}

pub fn catalog() -> MemoryCatalog {
	let users = (1..=3)
		.map(|user_id| User {
			user_id,
			age_category: Some("adult".to_string()),
			gender: Some("female".to_string()),
		})
		.collect();

	MemoryCatalog::new(items(), users, vec![(1, 2), (1, 1), (1, 3), (2, 1)])
}

/// Returns the given candidates, or the whole catalog, in order.
pub struct EchoRecommender;
impl Recommender for EchoRecommender {
	fn recommend<'a>(
		&'a self,
		_user: UserId,
		k: u32,
		items: Option<&'a [ItemId]>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ItemId>>> {
		let mut ranked = items.map(<[ItemId]>::to_vec).unwrap_or_else(|| vec![1, 2, 3, 4]);

		ranked.truncate(k as usize);

		Box::pin(async move { Ok(ranked) })
	}
}

/// Returns a fixed hit list where item 2's storyline equals the query.
pub struct FixedSemanticIndex;
impl SemanticIndex for FixedSemanticIndex {
	fn search<'a>(
		&'a self,
		query: &'a str,
		_items: Option<&'a [ItemId]>,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<StorylineHit>>> {
		let hits = vec![
			StorylineHit {
				item_id: 1,
				storyline: Some("A cowboy doll feels threatened.".to_string()),
				score: 0.9,
			},
			StorylineHit { item_id: 2, storyline: Some(query.to_string()), score: 0.8 },
			StorylineHit { item_id: 3, storyline: None, score: 0.7 },
		];

		Box::pin(async move { Ok(hits) })
	}
}

pub fn tool_context(settings: ToolSettings) -> Arc<ToolContext> {
	let catalog = catalog();

	Arc::new(ToolContext {
		vocabulary: Arc::new(catalog.vocabulary()),
		catalog: Arc::new(catalog),
		recommender: Arc::new(EchoRecommender),
		semantic: Arc::new(FixedSemanticIndex),
		settings,
	})
}

pub fn registry(settings: ToolSettings) -> ToolRegistry {
	let mut registry = ToolRegistry::new();

	tools::register_default_tools(&mut registry, tool_context(settings))
		.expect("Failed to register tools.");

	registry
}

pub fn dispatcher() -> Dispatcher {
	Dispatcher::new(Arc::new(registry(ToolSettings::default())), Duration::from_secs(5))
}

pub fn request(id: &str, name: &str, arguments: Value) -> ToolInvocationRequest {
	ToolInvocationRequest { id: id.to_string(), name: name.to_string(), arguments }
}

/// Plays back a fixed list of steps and records every window it was shown.
pub struct ScriptedEngine {
	steps: Mutex<VecDeque<ReasoningStep>>,
	windows: Mutex<Vec<Vec<Message>>>,
}
impl ScriptedEngine {
	pub fn new(steps: Vec<ReasoningStep>) -> Self {
		Self { steps: Mutex::new(steps.into()), windows: Mutex::new(Vec::new()) }
	}

	pub fn windows(&self) -> Vec<Vec<Message>> {
		self.windows.lock().expect("windows lock").clone()
	}
}
impl ReasoningEngine for ScriptedEngine {
	fn invoke<'a>(
		&'a self,
		messages: &'a [Message],
		_tools: &'a [ToolSpec],
	) -> BoxFuture<'a, color_eyre::Result<ReasoningStep>> {
		self.windows.lock().expect("windows lock").push(messages.to_vec());

		let step = self.steps.lock().expect("steps lock").pop_front();

		Box::pin(async move { step.ok_or_else(|| eyre::eyre!("The script is exhausted.")) })
	}
}

pub fn settings() -> OrchestratorSettings {
	OrchestratorSettings {
		system_prompt: "You are a movie recommendation assistant.".to_string(),
		..Default::default()
	}
}

pub fn orchestrator(
	engine: Arc<dyn ReasoningEngine>,
	settings: OrchestratorSettings,
) -> Orchestrator {
	Orchestrator::new(engine, dispatcher(), settings)
}

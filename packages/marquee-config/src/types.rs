use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub agent: Agent,
	#[serde(default)]
	pub filter: Filter,
	#[serde(default)]
	pub popularity: Popularity,
	#[serde(default)]
	pub tools: Tools,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	/// Storyline vectors, one point per catalog item.
	pub collection: String,
	/// Optional. Example queries paired with their tool plans.
	pub examples_collection: Option<String>,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub reasoning: LlmProviderConfig,
	pub embedding: EmbeddingProviderConfig,
	pub recommender: ProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Agent {
	pub system_prompt: String,
	/// Upper bound on reasoning calls within one turn. Hitting it fails the turn.
	#[serde(default = "default_max_iterations")]
	pub max_iterations: u32,
	#[serde(default = "default_max_window_tokens")]
	pub max_window_tokens: usize,
	#[serde(default = "default_tool_timeout_ms")]
	pub tool_timeout_ms: u64,
	/// Run the tool calls of one reasoning step concurrently. Results are still appended in
	/// request order.
	#[serde(default)]
	pub parallel_tools: bool,
	#[serde(default)]
	pub in_context_examples: InContextExamples,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InContextExamples {
	pub enabled: bool,
	pub min_score: f32,
	pub limit: u32,
}
impl Default for InContextExamples {
	fn default() -> Self {
		Self { enabled: false, min_score: 0.7, limit: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Filter {
	/// Minimum fuzzy similarity (0-100) for a free-text value to be corrected.
	pub fuzzy_threshold: f64,
}
impl Default for Filter {
	fn default() -> Self {
		Self { fuzzy_threshold: 70.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Popularity {
	pub quantile: f64,
	pub default_k: u32,
	pub statistics_k: u32,
}
impl Default for Popularity {
	fn default() -> Self {
		Self { quantile: 0.75, default_k: 20, statistics_k: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Tools {
	pub recommend_default_k: u32,
	pub interacted_limit: u32,
	pub semantic_top_k: u32,
}
impl Default for Tools {
	fn default() -> Self {
		Self { recommend_default_k: 5, interacted_limit: 20, semantic_top_k: 11 }
	}
}

fn default_max_iterations() -> u32 {
	16
}

fn default_max_window_tokens() -> usize {
	20_000
}

fn default_tool_timeout_ms() -> u64 {
	30_000
}

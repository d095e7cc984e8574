//! The catalog tools exposed to the reasoning engine.

pub mod args;

mod interactions;
mod item_filter;
mod metadata;
mod popular;
mod recommendations;
mod semantic;

pub use interactions::{InteractedItemsTool, LikePercentageTool};
pub use item_filter::ItemFilterTool;
pub use metadata::{ItemMetadataTool, UserMetadataTool};
pub use popular::PopularItemsTool;
pub use recommendations::TopKRecommendationsTool;
pub use semantic::VectorStoreSearchTool;

use std::sync::Arc;

use marquee_domain::{VocabularyIndex, fuzzy, popularity};

use crate::{
	Result,
	catalog::Catalog,
	providers::{Recommender, SemanticIndex},
	registry::ToolRegistry,
};

/// Shared, read-only state the tools run against.
pub struct ToolContext {
	pub catalog: Arc<dyn Catalog>,
	pub vocabulary: Arc<VocabularyIndex>,
	pub recommender: Arc<dyn Recommender>,
	pub semantic: Arc<dyn SemanticIndex>,
	pub settings: ToolSettings,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolSettings {
	pub fuzzy_threshold: f64,
	pub quantile: f64,
	pub popular_default_k: u32,
	pub statistics_k: u32,
	pub recommend_default_k: u32,
	pub interacted_limit: u32,
	pub semantic_top_k: u32,
}
impl ToolSettings {
	pub fn from_config(cfg: &marquee_config::Config) -> Self {
		Self {
			fuzzy_threshold: cfg.filter.fuzzy_threshold,
			quantile: cfg.popularity.quantile,
			popular_default_k: cfg.popularity.default_k,
			statistics_k: cfg.popularity.statistics_k,
			recommend_default_k: cfg.tools.recommend_default_k,
			interacted_limit: cfg.tools.interacted_limit,
			semantic_top_k: cfg.tools.semantic_top_k,
		}
	}
}
impl Default for ToolSettings {
	fn default() -> Self {
		Self {
			fuzzy_threshold: fuzzy::DEFAULT_THRESHOLD,
			quantile: popularity::DEFAULT_QUANTILE,
			popular_default_k: 20,
			statistics_k: 3,
			recommend_default_k: 5,
			interacted_limit: 20,
			semantic_top_k: 11,
		}
	}
}

/// Registers all eight catalog tools.
pub fn register_default_tools(registry: &mut ToolRegistry, ctx: Arc<ToolContext>) -> Result<()> {
	registry.register(Arc::new(ItemFilterTool::new(ctx.clone())))?;
	registry.register(Arc::new(TopKRecommendationsTool::new(ctx.clone())))?;
	registry.register(Arc::new(PopularItemsTool::new(ctx.clone())))?;
	registry.register(Arc::new(ItemMetadataTool::new(ctx.clone())))?;
	registry.register(Arc::new(UserMetadataTool::new(ctx.clone())))?;
	registry.register(Arc::new(InteractedItemsTool::new(ctx.clone())))?;
	registry.register(Arc::new(LikePercentageTool::new(ctx.clone())))?;
	registry.register(Arc::new(VectorStoreSearchTool::new(ctx)))?;

	Ok(())
}

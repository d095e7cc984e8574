mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Agent, Config, EmbeddingProviderConfig, Filter, InContextExamples, LlmProviderConfig,
	Popularity, Postgres, ProviderConfig, Providers, Qdrant, Service, Storage, Tools,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.reasoning.temperature.is_finite() || cfg.providers.reasoning.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.reasoning.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}

	for (label, key) in [
		("reasoning", &cfg.providers.reasoning.api_key),
		("embedding", &cfg.providers.embedding.api_key),
		("recommender", &cfg.providers.recommender.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, timeout_ms) in [
		("reasoning", cfg.providers.reasoning.timeout_ms),
		("embedding", cfg.providers.embedding.timeout_ms),
		("recommender", cfg.providers.recommender.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.agent.system_prompt.is_empty() {
		return Err(Error::Validation {
			message: "agent.system_prompt must be non-empty.".to_string(),
		});
	}
	if cfg.agent.max_iterations == 0 {
		return Err(Error::Validation {
			message: "agent.max_iterations must be greater than zero.".to_string(),
		});
	}
	if cfg.agent.max_window_tokens == 0 {
		return Err(Error::Validation {
			message: "agent.max_window_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.agent.tool_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "agent.tool_timeout_ms must be greater than zero.".to_string(),
		});
	}

	let examples = &cfg.agent.in_context_examples;

	if examples.enabled {
		if cfg.storage.qdrant.examples_collection.is_none() {
			return Err(Error::Validation {
				message: "storage.qdrant.examples_collection is required when agent.in_context_examples.enabled is true."
					.to_string(),
			});
		}
		if !(0.0..=1.0).contains(&examples.min_score) {
			return Err(Error::Validation {
				message: "agent.in_context_examples.min_score must be in the range 0.0-1.0."
					.to_string(),
			});
		}
		if examples.limit == 0 {
			return Err(Error::Validation {
				message: "agent.in_context_examples.limit must be greater than zero.".to_string(),
			});
		}
	}

	if !cfg.filter.fuzzy_threshold.is_finite()
		|| !(0.0..=100.0).contains(&cfg.filter.fuzzy_threshold)
	{
		return Err(Error::Validation {
			message: "filter.fuzzy_threshold must be in the range 0-100.".to_string(),
		});
	}
	if !cfg.popularity.quantile.is_finite()
		|| cfg.popularity.quantile <= 0.0
		|| cfg.popularity.quantile >= 1.0
	{
		return Err(Error::Validation {
			message: "popularity.quantile must be strictly between 0.0 and 1.0.".to_string(),
		});
	}

	for (label, value) in [
		("popularity.default_k", cfg.popularity.default_k),
		("popularity.statistics_k", cfg.popularity.statistics_k),
		("tools.recommend_default_k", cfg.tools.recommend_default_k),
		("tools.interacted_limit", cfg.tools.interacted_limit),
		("tools.semantic_top_k", cfg.tools.semantic_top_k),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.storage
		.qdrant
		.examples_collection
		.as_deref()
		.map(|collection| collection.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.storage.qdrant.examples_collection = None;
	}

	let prompt = cfg.agent.system_prompt.trim();

	if prompt.len() != cfg.agent.system_prompt.len() {
		cfg.agent.system_prompt = prompt.to_string();
	}
}

use std::{collections::BTreeMap, sync::Arc};

use crate::{
	Error, Result,
	tool::{ToolHandler, ToolSpec},
};

/// Tool handlers by name. Populated at startup, read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
	tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}
impl ToolRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` under its spec name. A name can be registered once.
	pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
		let name = handler.spec().name;

		if self.tools.contains_key(&name) {
			return Err(Error::DuplicateTool { name });
		}

		tracing::debug!(tool = %name, "Registered tool.");

		self.tools.insert(name, handler);

		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
		self.tools.get(name).cloned()
	}

	/// Specs of every registered tool, ordered by name.
	pub fn specs(&self) -> Vec<ToolSpec> {
		self.tools.values().map(|handler| handler.spec()).collect()
	}

	pub fn names(&self) -> Vec<&str> {
		self.tools.keys().map(String::as_str).collect()
	}

	pub fn len(&self) -> usize {
		self.tools.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tools.is_empty()
	}
}
impl std::fmt::Debug for ToolRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
	}
}

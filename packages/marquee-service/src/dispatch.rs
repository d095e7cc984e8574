//! Runs tool invocation requests against the registry.
//!
//! Every outcome becomes a [`ToolResult`]. Unknown tools, handler errors, handler panics and
//! timeouts are reported as failures so the turn can continue.

use std::{any::Any, sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time};

use crate::{
	registry::ToolRegistry,
	tool::{ToolInvocationRequest, ToolResult},
};

#[derive(Clone, Debug)]
pub struct Dispatcher {
	registry: Arc<ToolRegistry>,
	timeout: Duration,
}
impl Dispatcher {
	pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
		Self { registry, timeout }
	}

	pub fn registry(&self) -> &ToolRegistry {
		&self.registry
	}

	pub async fn dispatch(&self, request: &ToolInvocationRequest) -> ToolResult {
		let task = self.spawn(request);

		self.finish(request, task).await
	}

	/// Dispatches a batch and returns the results in request order. With `parallel` the handlers
	/// run concurrently.
	pub async fn dispatch_all(
		&self,
		requests: &[ToolInvocationRequest],
		parallel: bool,
	) -> Vec<ToolResult> {
		let mut results = Vec::with_capacity(requests.len());

		if !parallel {
			for request in requests {
				results.push(self.dispatch(request).await);
			}

			return results;
		}

		let tasks = requests.iter().map(|request| self.spawn(request)).collect::<Vec<_>>();

		for (request, task) in requests.iter().zip(tasks) {
			results.push(self.finish(request, task).await);
		}

		results
	}

	fn spawn(&self, request: &ToolInvocationRequest) -> Option<TaskGuard> {
		let handler = self.registry.get(&request.name)?;
		let arguments = request.arguments.clone();
		let timeout = self.timeout;

		tracing::info!(tool = %request.name, call_id = %request.id, "Tool call started.");

		// Each call gets its own deadline from the moment it is spawned.
		Some(TaskGuard(tokio::spawn(async move {
			match time::timeout(timeout, handler.call(&arguments)).await {
				Ok(Ok(result)) => result,
				Ok(Err(err)) => ToolResult::failure(format!("The tool call failed: {err}")),
				Err(_) => ToolResult::failure(format!(
					"The tool call timed out after {} ms.",
					timeout.as_millis()
				)),
			}
		})))
	}

	async fn finish(
		&self,
		request: &ToolInvocationRequest,
		task: Option<TaskGuard>,
	) -> ToolResult {
		let Some(mut task) = task else {
			tracing::warn!(tool = %request.name, call_id = %request.id, "Unknown tool requested.");

			return ToolResult::failure(format!("Unknown tool: {}.", request.name));
		};
		let result = match (&mut task.0).await {
			Ok(result) => result,
			Err(err) if err.is_panic() => ToolResult::failure(format!(
				"The tool call failed: {}",
				panic_message(err.into_panic().as_ref())
			)),
			Err(err) => ToolResult::failure(format!("The tool call failed: {err}")),
		};

		tracing::info!(
			tool = %request.name,
			call_id = %request.id,
			status = ?result.status,
			"Tool call finished."
		);

		result
	}
}

/// A spawned tool call that is aborted when dropped, so a cancelled dispatch stops its handlers.
struct TaskGuard(JoinHandle<ToolResult>);
impl Drop for TaskGuard {
	fn drop(&mut self) {
		self.0.abort();
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(message) = payload.downcast_ref::<&str>() {
		*message
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.as_str()
	} else {
		"handler panicked"
	}
}

//! Conversation history and the per-thread store that hosts it.

use std::{
	collections::{HashMap, HashSet},
	sync::{Arc, Mutex as StdMutex},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
	Error, Result,
	tool::{ToolInvocationRequest, ToolResult},
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	System,
	User,
	Assistant,
	Tool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
	Text(String),
	ToolResult(ToolResult),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Message {
	pub role: Role,
	pub content: MessageContent,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tool_requests: Vec<ToolInvocationRequest>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tool_call_id: Option<String>,
	/// Tool name, on tool messages.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl Message {
	pub fn system(text: impl Into<String>) -> Self {
		Self::text(Role::System, text.into())
	}

	pub fn user(text: impl Into<String>) -> Self {
		Self::text(Role::User, text.into())
	}

	pub fn assistant(text: impl Into<String>, tool_requests: Vec<ToolInvocationRequest>) -> Self {
		Self { tool_requests, ..Self::text(Role::Assistant, text.into()) }
	}

	pub fn tool(request: &ToolInvocationRequest, result: ToolResult) -> Self {
		Self {
			role: Role::Tool,
			content: MessageContent::ToolResult(result),
			tool_requests: Vec::new(),
			tool_call_id: Some(request.id.clone()),
			name: Some(request.name.clone()),
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Content as plain text. Tool results render as their JSON form.
	pub fn text_content(&self) -> String {
		match &self.content {
			MessageContent::Text(text) => text.clone(),
			MessageContent::ToolResult(result) => result.to_content(),
		}
	}

	fn text(role: Role, text: String) -> Self {
		Self {
			role,
			content: MessageContent::Text(text),
			tool_requests: Vec::new(),
			tool_call_id: None,
			name: None,
			created_at: OffsetDateTime::now_utc(),
		}
	}
}

/// Append-only history of one thread.
#[derive(Clone, Debug)]
pub struct Conversation {
	thread_id: String,
	started: bool,
	messages: Vec<Message>,
	request_ids: HashSet<String>,
}
impl Conversation {
	pub fn new(thread_id: impl Into<String>) -> Self {
		Self {
			thread_id: thread_id.into(),
			started: false,
			messages: Vec::new(),
			request_ids: HashSet::new(),
		}
	}

	pub fn thread_id(&self) -> &str {
		&self.thread_id
	}

	/// Whether the system preamble has been injected.
	pub fn is_started(&self) -> bool {
		self.started
	}

	pub fn mark_started(&mut self) {
		self.started = true;
	}

	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	/// Appends `message`. Tool messages must answer a request an earlier assistant message made.
	pub fn append(&mut self, message: Message) -> Result<()> {
		if message.role == Role::Tool {
			let Some(call_id) = message.tool_call_id.as_deref() else {
				return Err(Error::InvalidRequest {
					message: "Tool message is missing its tool_call_id.".to_string(),
				});
			};

			if !self.request_ids.contains(call_id) {
				return Err(Error::InvalidRequest {
					message: format!("Tool message answers unknown request {call_id}."),
				});
			}
		}

		for request in &message.tool_requests {
			self.request_ids.insert(request.id.clone());
		}

		self.messages.push(message);

		Ok(())
	}
}

/// Conversations by thread id. Each conversation sits behind its own async mutex so a thread
/// runs one turn at a time while distinct threads proceed independently.
#[derive(Debug, Default)]
pub struct ConversationStore {
	threads: StdMutex<HashMap<String, Arc<Mutex<Conversation>>>>,
}
impl ConversationStore {
	/// Registers an empty conversation under a fresh thread id.
	pub fn create(&self) -> String {
		let thread_id = Uuid::new_v4().to_string();

		self.get_or_create(&thread_id);

		thread_id
	}

	pub fn get(&self, thread_id: &str) -> Option<Arc<Mutex<Conversation>>> {
		let threads = self.threads.lock().unwrap_or_else(|err| err.into_inner());

		threads.get(thread_id).cloned()
	}

	pub fn get_or_create(&self, thread_id: &str) -> Arc<Mutex<Conversation>> {
		let mut threads = self.threads.lock().unwrap_or_else(|err| err.into_inner());

		threads
			.entry(thread_id.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(Conversation::new(thread_id))))
			.clone()
	}

	pub fn remove(&self, thread_id: &str) -> bool {
		let mut threads = self.threads.lock().unwrap_or_else(|err| err.into_inner());

		threads.remove(thread_id).is_some()
	}

	pub fn len(&self) -> usize {
		self.threads.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

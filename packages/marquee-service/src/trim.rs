//! Bounds the history handed to the reasoning engine.
//!
//! The window is the most recent run of messages that fits the token budget. It starts on a user
//! message, ends on a user or tool message, and keeps an assistant message together with the
//! tool messages answering its requests. The first system message is always kept in front.

use crate::conversation::{Message, Role};

pub const DEFAULT_MAX_TOKENS: usize = 20_000;

const CHARS_PER_TOKEN: usize = 4;
const TOKENS_PER_MESSAGE: usize = 3;

/// Length-based token estimate. Counts text, tool request names and arguments.
pub fn estimate_tokens(message: &Message) -> usize {
	let mut chars = message.text_content().chars().count();

	for request in &message.tool_requests {
		chars += request.name.chars().count();
		chars += request.arguments.to_string().chars().count();
	}

	chars.div_ceil(CHARS_PER_TOKEN) + TOKENS_PER_MESSAGE
}

pub fn trim(messages: &[Message], max_tokens: usize) -> Vec<Message> {
	let system_idx = messages.iter().position(|message| message.role == Role::System);
	let system_tokens = system_idx.map(|idx| estimate_tokens(&messages[idx])).unwrap_or(0);
	let budget = max_tokens.saturating_sub(system_tokens);
	let rest = messages
		.iter()
		.enumerate()
		.filter(|(idx, message)| Some(*idx) != system_idx && message.role != Role::System)
		.map(|(_, message)| message)
		.collect::<Vec<_>>();
	let mut blocks = blocks(&rest);
	let before = blocks.len();

	// Requests without all of their results never reach the engine, wherever they sit.
	blocks.retain(|block| !block.unanswered());

	if blocks.len() < before {
		tracing::warn!(
			dropped = before - blocks.len(),
			"Dropped tool requests without results from the window."
		);
	}

	// The window must not end on an assistant message.
	while blocks.last().map(|block| !block.closed()).unwrap_or(false) {
		blocks.pop();
	}

	let mut used = 0;
	let mut start = blocks.len();

	for (idx, block) in blocks.iter().enumerate().rev() {
		if used + block.tokens > budget {
			break;
		}

		used += block.tokens;
		start = idx;
	}

	let kept = &blocks[start..];
	let first_user = kept.iter().position(|block| block.starts_with(Role::User));
	let mut window = Vec::with_capacity(rest.len() + 1);

	if let Some(idx) = system_idx {
		window.push(messages[idx].clone());
	}

	match first_user {
		Some(first_user) => {
			for block in &kept[first_user..] {
				window.extend(block.messages.iter().map(|message| (*message).clone()));
			}
		},
		None =>
			if !rest.is_empty() {
				tracing::warn!(
					max_tokens,
					messages = messages.len(),
					"No user message fits the context window."
				);
			},
	}

	let dropped = messages.len() - window.len();

	if dropped > 0 {
		tracing::debug!(dropped, kept = window.len(), "Trimmed conversation window.");
	}

	window
}

/// An assistant message with its tool answers, or a single other message.
struct Block<'a> {
	messages: Vec<&'a Message>,
	tokens: usize,
}
impl Block<'_> {
	fn starts_with(&self, role: Role) -> bool {
		self.messages.first().map(|message| message.role == role).unwrap_or(false)
	}

	/// An assistant message whose tool requests are not all answered.
	fn unanswered(&self) -> bool {
		self.messages.first().is_some_and(|first| {
			first.role == Role::Assistant
				&& !first.tool_requests.is_empty()
				&& self.messages.len() != first.tool_requests.len() + 1
		})
	}

	fn closed(&self) -> bool {
		let Some(first) = self.messages.first() else {
			return false;
		};

		match first.role {
			Role::Assistant =>
				!first.tool_requests.is_empty()
					&& self.messages.len() == first.tool_requests.len() + 1,
			Role::User | Role::Tool => true,
			Role::System => false,
		}
	}
}

fn blocks<'a>(messages: &[&'a Message]) -> Vec<Block<'a>> {
	let mut out: Vec<Block<'a>> = Vec::new();

	for message in messages {
		let tokens = estimate_tokens(message);
		let joins_batch = message.role == Role::Tool
			&& out.last().map(|block| answers(block, message)).unwrap_or(false);

		if joins_batch && let Some(block) = out.last_mut() {
			block.messages.push(message);
			block.tokens += tokens;

			continue;
		}

		out.push(Block { messages: vec![message], tokens });
	}

	out
}

fn answers(block: &Block<'_>, message: &Message) -> bool {
	let Some(first) = block.messages.first() else {
		return false;
	};

	first.role == Role::Assistant
		&& first
			.tool_requests
			.iter()
			.any(|request| Some(&request.id) == message.tool_call_id.as_ref())
}

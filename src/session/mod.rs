// Session module: conversation state and the chat request/response cycle

pub mod chat; // Session controller
pub mod gemini; // Completion client
pub mod logger; // Per-session diagnostic logging

pub use chat::ChatSession;
pub use gemini::{CompletionApi, GeminiClient};

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Author of one conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

/// One role-tagged utterance. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: String,
	pub timestamp: u64,
}

impl Message {
	pub fn user(content: &str) -> Self {
		Self {
			role: Role::User,
			content: content.to_string(),
			timestamp: current_timestamp(),
		}
	}

	pub fn assistant(content: &str) -> Self {
		Self {
			role: Role::Assistant,
			content: content.to_string(),
			timestamp: current_timestamp(),
		}
	}
}

fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

/// Append-only, ordered turn history of one open chat session.
///
/// Pure data: there is no removal operation, and the whole conversation is
/// discarded when the session closes. Change notification lives on the
/// session controller, which owns this store behind its lock.
pub struct Conversation {
	messages: Vec<Message>,
}

impl Conversation {
	/// Create a conversation seeded with one synthetic assistant greeting
	pub fn new(greeting: &str) -> Self {
		Self {
			messages: vec![Message::assistant(greeting)],
		}
	}

	/// Append a message to the end of the history
	pub fn append(&mut self, message: Message) {
		self.messages.push(message);
	}

	/// Read-only view of the history, in chronological order
	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}

	pub fn last(&self) -> Option<&Message> {
		self.messages.last()
	}

	/// Discard the history and reseed the greeting.
	/// This is "close and reopen": a fresh conversation, not an edit.
	pub fn reset(&mut self, greeting: &str) {
		self.messages.clear();
		self.messages.push(Message::assistant(greeting));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_conversation_seeds_greeting() {
		let conversation = Conversation::new("Namaste!");
		assert_eq!(conversation.len(), 1);
		let greeting = conversation.last().unwrap();
		assert_eq!(greeting.role, Role::Assistant);
		assert_eq!(greeting.content, "Namaste!");
	}

	#[test]
	fn test_append_preserves_order() {
		let mut conversation = Conversation::new("hi");
		conversation.append(Message::user("first"));
		conversation.append(Message::assistant("second"));

		let contents: Vec<&str> = conversation
			.messages()
			.iter()
			.map(|m| m.content.as_str())
			.collect();
		assert_eq!(contents, vec!["hi", "first", "second"]);
	}

	#[test]
	fn test_reset_reseeds_greeting() {
		let mut conversation = Conversation::new("hi");
		conversation.append(Message::user("a"));
		conversation.append(Message::assistant("b"));

		conversation.reset("hello again");
		assert_eq!(conversation.len(), 1);
		let greeting = conversation.last().unwrap();
		assert_eq!(greeting.role, Role::Assistant);
		assert_eq!(greeting.content, "hello again");
	}
}

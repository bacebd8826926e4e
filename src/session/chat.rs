// Chat session controller: owns the conversation and drives one
// request/response cycle per accepted submit

use parking_lot::Mutex;
use std::sync::Arc;

use super::{logger, CompletionApi, Conversation, Message};
use crate::config::Config;
use crate::log_error;
use crate::prompt;

// Callbacks are invoked with the lock released, so an observer may call
// back into the session
type Observer = Arc<dyn Fn(&Message) + Send + Sync>;

struct SessionState {
	conversation: Conversation,
	// At most one request in flight; checked before any mutation
	pending: bool,
	// Uncommitted text the user is composing
	draft: String,
	// Cleared on close; a late settle must not touch a closed session
	open: bool,
	// Bumped by reset; a settle carrying an older generation belongs to
	// a torn-down conversation and is dropped whole
	generation: u64,
}

/// Controller for one open chat surface.
///
/// Handles are cheap clones over shared state, so a view can keep one while
/// a submit runs on another. All mutation is serialized through the inner
/// mutex; the lock is never held across the network await, which is why the
/// explicit `pending` guard exists at all. Observers are called only after
/// the lock is released.
#[derive(Clone)]
pub struct ChatSession {
	state: Arc<Mutex<SessionState>>,
	observers: Arc<Mutex<Vec<Observer>>>,
	client: Arc<dyn CompletionApi>,
	system_prompt: String,
	greeting: String,
	// Diagnostics log name; None disables per-session logging
	log_name: Option<String>,
}

impl ChatSession {
	pub fn new(client: Arc<dyn CompletionApi>, config: &Config) -> Self {
		Self {
			state: Arc::new(Mutex::new(SessionState {
				conversation: Conversation::new(&config.greeting),
				pending: false,
				draft: String::new(),
				open: true,
				generation: 0,
			})),
			observers: Arc::new(Mutex::new(Vec::new())),
			client,
			system_prompt: config.system_prompt.clone(),
			greeting: config.greeting.clone(),
			log_name: None,
		}
	}

	/// Enable the per-session JSONL diagnostics log
	pub fn with_diagnostics(mut self, name: &str) -> Self {
		self.log_name = Some(name.to_string());
		self
	}

	/// Snapshot of the conversation for rendering
	pub fn messages(&self) -> Vec<Message> {
		self.state.lock().conversation.messages().to_vec()
	}

	pub fn last_message(&self) -> Option<Message> {
		self.state.lock().conversation.last().cloned()
	}

	/// Register an observer notified on every appended turn. Observers run
	/// with no session lock held, so they may read the session freely.
	pub fn subscribe<F>(&self, observer: F)
	where
		F: Fn(&Message) + Send + Sync + 'static,
	{
		self.observers.lock().push(Arc::new(observer));
	}

	fn notify_observers(&self, message: &Message) {
		// Snapshot the list so the registry lock is not held during calls
		let observers: Vec<Observer> = self.observers.lock().clone();
		for observer in observers {
			observer(message);
		}
	}

	pub fn is_pending(&self) -> bool {
		self.state.lock().pending
	}

	pub fn is_open(&self) -> bool {
		self.state.lock().open
	}

	pub fn draft(&self) -> String {
		self.state.lock().draft.clone()
	}

	pub fn set_draft(&self, text: &str) {
		self.state.lock().draft = text.to_string();
	}

	/// Whether the submit affordance should be enabled: open session,
	/// nothing in flight, draft not empty after trimming
	pub fn can_submit(&self) -> bool {
		let state = self.state.lock();
		state.open && !state.pending && !state.draft.trim().is_empty()
	}

	/// Dismiss the chat surface. The conversation is discarded, never
	/// persisted; an in-flight request keeps running but its settle is
	/// dropped on arrival.
	pub fn close(&self) {
		self.state.lock().open = false;
	}

	/// Reopen with a fresh conversation, as if the surface was closed and
	/// opened again. Observers stay registered. A request still in flight
	/// now belongs to the discarded conversation: its settle is dropped
	/// whole and cannot touch the new one.
	pub fn reset(&self) {
		let mut state = self.state.lock();
		state.conversation.reset(&self.greeting);
		state.pending = false;
		state.draft.clear();
		state.open = true;
		state.generation += 1;
	}

	/// Submit the current draft
	pub async fn submit_draft(&self) {
		let draft = self.state.lock().draft.clone();
		self.submit(&draft).await;
	}

	/// One full turn cycle: validate, append the user turn, call the
	/// completion endpoint, append the assistant turn (or a fallback).
	///
	/// Violated preconditions (blank input, request already pending,
	/// closed session) are silent no-ops. Completion failures never
	/// propagate; they surface only as the apology turn and a diagnostic
	/// log entry. `pending` is cleared on every settle path of the
	/// conversation that accepted the submit.
	pub async fn submit(&self, raw_text: &str) {
		let text = raw_text.trim();

		let user_message = Message::user(text);
		let generation = {
			let mut state = self.state.lock();
			if text.is_empty() || state.pending || !state.open {
				return;
			}
			state.conversation.append(user_message.clone());
			state.draft.clear();
			state.pending = true;
			state.generation
		};
		self.notify_observers(&user_message);

		if let Some(name) = &self.log_name {
			if let Err(e) = logger::log_user_input(name, text) {
				log_error!("Failed to write session log: {}", e);
			}
		}

		let combined_prompt = prompt::build_prompt(&self.system_prompt, text);
		let reply = match self.client.complete(&combined_prompt).await {
			Ok(Some(text)) => text,
			Ok(None) => prompt::EMPTY_REPLY_FALLBACK.to_string(),
			Err(e) => {
				log_error!("Completion request failed: {:#}", e);
				if let Some(name) = &self.log_name {
					let _ = logger::log_completion_error(name, &e);
				}
				prompt::FAILURE_FALLBACK.to_string()
			}
		};

		let assistant_message = Message::assistant(&reply);
		{
			let mut state = self.state.lock();
			if state.generation != generation {
				// The conversation was reset mid-flight; this settle
				// belongs to the discarded one. Leave `pending` alone,
				// it now guards the fresh conversation's own request.
				return;
			}
			state.pending = false;
			if !state.open {
				// Surface was dismissed while the request was in flight
				return;
			}
			state.conversation.append(assistant_message.clone());
		}
		self.notify_observers(&assistant_message);

		if let Some(name) = &self.log_name {
			if let Err(e) = logger::log_assistant_reply(name, &reply) {
				log_error!("Failed to write session log: {}", e);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::Role;
	use anyhow::Result;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;
	use tokio::sync::Notify;

	struct FixedClient {
		reply: Option<String>,
	}

	#[async_trait]
	impl CompletionApi for FixedClient {
		async fn complete(&self, _prompt: &str) -> Result<Option<String>> {
			Ok(self.reply.clone())
		}
	}

	struct FailingClient;

	#[async_trait]
	impl CompletionApi for FailingClient {
		async fn complete(&self, _prompt: &str) -> Result<Option<String>> {
			Err(anyhow::anyhow!("connection refused"))
		}
	}

	// Holds the request in flight until the test releases the gate
	struct GatedClient {
		gate: Arc<Notify>,
	}

	#[async_trait]
	impl CompletionApi for GatedClient {
		async fn complete(&self, _prompt: &str) -> Result<Option<String>> {
			self.gate.notified().await;
			Ok(Some("done".to_string()))
		}
	}

	// Records the prompt it was handed
	struct RecordingClient {
		seen: Arc<Mutex<Option<String>>>,
	}

	#[async_trait]
	impl CompletionApi for RecordingClient {
		async fn complete(&self, prompt: &str) -> Result<Option<String>> {
			*self.seen.lock() = Some(prompt.to_string());
			Ok(Some("ok".to_string()))
		}
	}

	fn session_with(client: Arc<dyn CompletionApi>) -> ChatSession {
		ChatSession::new(client, &Config::default())
	}

	async fn wait_until_pending(session: &ChatSession) {
		for _ in 0..200 {
			if session.is_pending() {
				return;
			}
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
		panic!("request never became pending");
	}

	#[tokio::test]
	async fn test_successful_submit_appends_two_turns() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("Plot A is 25 lakh.".to_string()),
		}));
		assert!(!session.is_pending());
		assert_eq!(session.messages().len(), 1);

		session.submit("What is the price of Plot A?").await;

		let messages = session.messages();
		assert_eq!(messages.len(), 3);
		assert_eq!(messages[0].role, Role::Assistant);
		assert_eq!(messages[1].role, Role::User);
		assert_eq!(messages[1].content, "What is the price of Plot A?");
		assert_eq!(messages[2].role, Role::Assistant);
		assert_eq!(messages[2].content, "Plot A is 25 lakh.");
		assert!(!session.is_pending());
	}

	#[tokio::test]
	async fn test_input_is_trimmed() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("ok".to_string()),
		}));
		session.submit("  hello  ").await;
		assert_eq!(session.messages()[1].content, "hello");
	}

	#[tokio::test]
	async fn test_blank_submit_is_noop() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("ok".to_string()),
		}));
		session.submit("").await;
		session.submit("   \n\t ").await;
		assert_eq!(session.messages().len(), 1);
		assert!(!session.is_pending());
	}

	#[tokio::test]
	async fn test_transport_error_appends_apology() {
		let session = session_with(Arc::new(FailingClient));
		session.submit("hello").await;

		let messages = session.messages();
		assert_eq!(messages.len(), 3);
		assert_eq!(messages[2].role, Role::Assistant);
		assert_eq!(messages[2].content, prompt::FAILURE_FALLBACK);
		assert!(!session.is_pending());
	}

	#[tokio::test]
	async fn test_session_usable_after_failure() {
		let session = session_with(Arc::new(FailingClient));
		session.submit("first").await;
		session.submit("second").await;
		// Both attempts completed a full cycle
		assert_eq!(session.messages().len(), 5);
		assert!(!session.is_pending());
	}

	#[tokio::test]
	async fn test_empty_payload_appends_placeholder() {
		let session = session_with(Arc::new(FixedClient { reply: None }));
		session.submit("hello").await;

		let messages = session.messages();
		assert_eq!(messages.len(), 3);
		assert_eq!(messages[2].content, prompt::EMPTY_REPLY_FALLBACK);
	}

	#[tokio::test]
	async fn test_submit_while_pending_is_dropped() {
		let gate = Arc::new(Notify::new());
		let session = session_with(Arc::new(GatedClient { gate: gate.clone() }));

		let first = {
			let session = session.clone();
			tokio::spawn(async move { session.submit("a").await })
		};
		wait_until_pending(&session).await;

		// Second submit must be rejected before any mutation
		session.submit("b").await;
		assert_eq!(session.messages().len(), 2);
		assert_eq!(session.messages()[1].content, "a");

		gate.notify_one();
		first.await.unwrap();

		let messages = session.messages();
		assert_eq!(messages.len(), 3);
		assert_eq!(messages[2].content, "done");
		assert!(!session.is_pending());
	}

	#[tokio::test]
	async fn test_close_discards_late_settle() {
		let gate = Arc::new(Notify::new());
		let session = session_with(Arc::new(GatedClient { gate: gate.clone() }));

		let notified = Arc::new(AtomicUsize::new(0));
		let count = notified.clone();
		session.subscribe(move |_| {
			count.fetch_add(1, Ordering::SeqCst);
		});

		let inflight = {
			let session = session.clone();
			tokio::spawn(async move { session.submit("a").await })
		};
		wait_until_pending(&session).await;

		session.close();
		gate.notify_one();
		inflight.await.unwrap();

		// The reply arrived after close: pending cleared, nothing appended,
		// only the user turn was ever announced
		assert!(!session.is_pending());
		assert!(!session.is_open());
		assert_eq!(session.messages().len(), 2);
		assert_eq!(notified.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_reset_discards_stale_settle() {
		let gate = Arc::new(Notify::new());
		let session = session_with(Arc::new(GatedClient { gate: gate.clone() }));

		let stale = {
			let session = session.clone();
			tokio::spawn(async move { session.submit("a").await })
		};
		wait_until_pending(&session).await;

		session.reset();
		assert!(!session.is_pending());
		assert_eq!(session.messages().len(), 1);

		// The fresh conversation accepts a submit of its own while the
		// orphaned request is still running
		let fresh = {
			let session = session.clone();
			tokio::spawn(async move { session.submit("b").await })
		};
		wait_until_pending(&session).await;
		assert_eq!(session.messages().len(), 2);

		// Waiters wake in order: the first release settles the orphan,
		// which must neither append nor clear the fresh request's guard
		gate.notify_one();
		stale.await.unwrap();
		assert_eq!(session.messages().len(), 2);
		assert!(session.is_pending());

		gate.notify_one();
		fresh.await.unwrap();

		let messages = session.messages();
		assert_eq!(messages.len(), 3);
		assert_eq!(messages[1].content, "b");
		assert_eq!(messages[2].content, "done");
		assert!(!session.is_pending());
	}

	#[tokio::test]
	async fn test_submit_on_closed_session_is_noop() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("ok".to_string()),
		}));
		session.close();
		session.submit("hello").await;
		assert_eq!(session.messages().len(), 1);
	}

	#[tokio::test]
	async fn test_draft_and_can_submit() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("ok".to_string()),
		}));
		assert!(!session.can_submit());

		session.set_draft("   ");
		assert!(!session.can_submit());

		session.set_draft("kya rate hai?");
		assert!(session.can_submit());

		session.submit_draft().await;
		assert_eq!(session.messages()[1].content, "kya rate hai?");
		// Draft cleared by the accepted submit
		assert!(session.draft().is_empty());
		assert!(!session.can_submit());
	}

	#[tokio::test]
	async fn test_prompt_combines_instructions_and_user_text() {
		let seen = Arc::new(Mutex::new(None));
		let session = session_with(Arc::new(RecordingClient { seen: seen.clone() }));

		session.submit("  What about Plot B?  ").await;

		let config = Config::default();
		let expected = format!("{}\n\nUser: What about Plot B?", config.system_prompt);
		assert_eq!(seen.lock().as_deref(), Some(expected.as_str()));
	}

	#[tokio::test]
	async fn test_observer_sees_each_turn_and_may_read_session() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("ok".to_string()),
		}));

		let seen: Arc<Mutex<Vec<(Role, usize)>>> = Arc::new(Mutex::new(Vec::new()));
		let handle = session.clone();
		let log = seen.clone();
		session.subscribe(move |message| {
			// Reading the session back from inside a notification must
			// not block on the session's own lock
			log.lock().push((message.role, handle.messages().len()));
		});

		session.submit("hello").await;

		let seen = seen.lock();
		assert_eq!(*seen, vec![(Role::User, 2), (Role::Assistant, 3)]);
	}

	#[tokio::test]
	async fn test_reset_starts_fresh_conversation() {
		let session = session_with(Arc::new(FixedClient {
			reply: Some("ok".to_string()),
		}));
		session.submit("hello").await;
		assert_eq!(session.messages().len(), 3);

		session.reset();
		let messages = session.messages();
		assert_eq!(messages.len(), 1);
		assert_eq!(messages[0].role, Role::Assistant);
		assert!(session.is_open());
	}
}

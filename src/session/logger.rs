// Per-session diagnostic logging - single JSONL file with typed entries.
// This is the developer-facing channel only; conversations themselves are
// never persisted.

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the diagnostics log file path for a session
pub fn get_session_log_file(session_name: &str) -> Result<PathBuf> {
	let sessions_dir = crate::directories::get_sessions_dir()?;
	Ok(sessions_dir.join(format!("{}.jsonl", session_name)))
}

fn get_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

fn append_to_log(log_file: &PathBuf, content: &str) -> Result<()> {
	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(log_file)?;
	writeln!(file, "{}", content)?;
	Ok(())
}

/// Log a session start marker with the model in use
pub fn log_session_start(session_name: &str, model: &str) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;
	let log_entry = serde_json::json!({
		"type": "START",
		"timestamp": get_timestamp(),
		"model": model
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)
}

/// Log accepted user input (after trimming)
pub fn log_user_input(session_name: &str, content: &str) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;
	let log_entry = serde_json::json!({
		"type": "USER",
		"timestamp": get_timestamp(),
		"content": content
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)
}

/// Log the assistant turn that settled a cycle (real reply or fallback)
pub fn log_assistant_reply(session_name: &str, content: &str) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;
	let log_entry = serde_json::json!({
		"type": "ASSISTANT",
		"timestamp": get_timestamp(),
		"content": content
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)
}

/// Log the raw detail of a failed completion request
pub fn log_completion_error(session_name: &str, error: &anyhow::Error) -> Result<()> {
	let log_file = get_session_log_file(session_name)?;
	let log_entry = serde_json::json!({
		"type": "ERROR",
		"timestamp": get_timestamp(),
		"detail": format!("{:#}", error)
	});
	append_to_log(&log_file, &serde_json::to_string(&log_entry)?)
}

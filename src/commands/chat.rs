// Interactive chat session in the terminal: the stand-in for the
// website chat surface

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use crossterm::{cursor, execute};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config as RustylineConfig, EditMode, Editor};
use std::io::{stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use gharmitra::config::Config;
use gharmitra::session::{logger, ChatSession, GeminiClient, Role};

use super::chat_helper::CommandHelper;

// Chat commands
const HELP_COMMAND: &str = "/help";
const EXIT_COMMAND: &str = "/exit";
const QUIT_COMMAND: &str = "/quit";
const CLEAR_COMMAND: &str = "/clear";
const NEW_COMMAND: &str = "/new";

// List of all available commands for autocomplete
pub const COMMANDS: [&str; 5] = [
	HELP_COMMAND,
	EXIT_COMMAND,
	QUIT_COMMAND,
	CLEAR_COMMAND,
	NEW_COMMAND,
];

#[derive(Args, Debug)]
pub struct ChatArgs {
	/// Name for this session's diagnostics log
	#[arg(long, short)]
	pub name: Option<String>,

	/// Use a specific model instead of the configured one
	#[arg(long)]
	pub model: Option<String>,
}

// Animation frames for the pending-request indicator
const LOADING_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

pub async fn run(args: &ChatArgs, config: &Config) -> Result<()> {
	let mut gemini = config.gemini.clone();
	if let Some(model) = &args.model {
		gemini.model = model.clone();
	}
	if gemini.api_key.is_none() {
		anyhow::bail!(
			"Gemini API key not configured. Set GEMINI_API_KEY or run 'gharmitra config --api-key <KEY>'"
		);
	}

	let session_name = args.name.clone().unwrap_or_else(|| {
		let timestamp = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs();
		format!("chat_{}", timestamp)
	});
	logger::log_session_start(&session_name, &gemini.model)?;
	gharmitra::log_info!("Session diagnostics: {}", session_name);

	let client = Arc::new(GeminiClient::new(gemini));
	let session = ChatSession::new(client, config).with_diagnostics(&session_name);

	ctrlc::set_handler(move || {
		println!("\nSession closed.");
		std::process::exit(0);
	})?;

	println!(
		"{}",
		"GharMitra property chat. Type /help for commands, /exit to leave.".bright_black()
	);
	print_greeting(&session);

	loop {
		let line = read_user_input()?;
		let input = line.trim();

		if input.is_empty() {
			continue;
		}

		if input.starts_with('/') {
			if process_command(input, &session)? {
				break;
			}
			continue;
		}

		session.set_draft(input);
		if !session.can_submit() {
			continue;
		}

		// Spinner runs while the request is in flight
		let cancel_flag = Arc::new(AtomicBool::new(false));
		let animation = tokio::spawn(show_loading_animation(cancel_flag.clone()));

		session.submit_draft().await;

		cancel_flag.store(true, Ordering::SeqCst);
		let _ = animation.await;

		if let Some(message) = session.last_message() {
			if message.role == Role::Assistant {
				println!("{}", message.content.bright_green());
			}
		}
	}

	session.close();
	Ok(())
}

fn print_greeting(session: &ChatSession) {
	if let Some(greeting) = session.last_message() {
		println!("{}", greeting.content.bright_green());
	}
}

// Returns true when the session should end
fn process_command(input: &str, session: &ChatSession) -> Result<bool> {
	match input {
		EXIT_COMMAND | QUIT_COMMAND => {
			println!("Ending session. The conversation is discarded.");
			return Ok(true);
		}
		HELP_COMMAND => {
			println!("\nAvailable commands:\n");
			println!("{} or {} - Close the chat", EXIT_COMMAND, QUIT_COMMAND);
			println!("{} - Discard the conversation and start fresh", NEW_COMMAND);
			println!("{} - Clear the screen", CLEAR_COMMAND);
			println!("{} - Show this help message\n", HELP_COMMAND);
		}
		NEW_COMMAND => {
			session.reset();
			println!("Started a fresh conversation.");
			print_greeting(session);
		}
		CLEAR_COMMAND => {
			// ANSI escape code to clear screen and move cursor to top-left
			print!("\x1B[2J\x1B[1;1H");
			stdout().flush()?;
		}
		unknown => {
			println!("Unknown command: {}. Type {} for help.", unknown, HELP_COMMAND);
		}
	}

	Ok(false)
}

// Read user input with command completion
fn read_user_input() -> Result<String> {
	let config = RustylineConfig::builder()
		.completion_type(CompletionType::List)
		.edit_mode(EditMode::Emacs)
		.auto_add_history(true)
		.bell_style(rustyline::config::BellStyle::None)
		.build();

	let mut editor: Editor<CommandHelper, DefaultHistory> = Editor::with_config(config)?;
	editor.set_helper(Some(CommandHelper::new()));

	match editor.readline("> ") {
		Ok(line) => {
			let _ = editor.add_history_entry(line.clone());
			Ok(line)
		}
		Err(ReadlineError::Interrupted) => {
			// Ctrl+C
			println!("\nCancelled");
			Ok(String::new())
		}
		Err(ReadlineError::Eof) => {
			// Ctrl+D
			println!("\nExiting session.");
			Ok(EXIT_COMMAND.to_string())
		}
		Err(err) => {
			println!("Error: {:?}", err);
			Ok(String::new())
		}
	}
}

// Show loading animation while waiting for a completion
async fn show_loading_animation(cancel_flag: Arc<AtomicBool>) -> Result<()> {
	let mut stdout = stdout();
	let mut frame_idx = 0;

	execute!(stdout, cursor::SavePosition)?;

	while !cancel_flag.load(Ordering::SeqCst) {
		execute!(stdout, cursor::RestorePosition)?;
		print!(" {} Thinking...", LOADING_FRAMES[frame_idx]);
		stdout.flush()?;

		frame_idx = (frame_idx + 1) % LOADING_FRAMES.len();

		tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
	}

	// Clear loading message
	execute!(stdout, cursor::RestorePosition)?;
	print!("                    ");
	execute!(stdout, cursor::RestorePosition)?;
	stdout.flush()?;

	Ok(())
}

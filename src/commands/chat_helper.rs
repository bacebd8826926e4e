// Rustyline helper: completion and inline hints for the slash commands

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;

pub struct CommandHelper;

impl CommandHelper {
	pub fn new() -> Self {
		Self
	}

	fn matches(line: &str) -> impl Iterator<Item = &'static str> + '_ {
		super::chat::COMMANDS
			.iter()
			.copied()
			.filter(move |cmd| cmd.starts_with(line))
	}
}

impl Completer for CommandHelper {
	type Candidate = Pair;

	fn complete(
		&self,
		line: &str,
		_pos: usize,
		_ctx: &rustyline::Context<'_>,
	) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
		// Only slash commands are completed; regular chat text is free-form
		if !line.starts_with('/') {
			return Ok((0, vec![]));
		}

		let candidates = Self::matches(line)
			.map(|cmd| Pair {
				display: cmd.to_string(),
				replacement: cmd.to_string(),
			})
			.collect();

		Ok((0, candidates))
	}
}

impl Hinter for CommandHelper {
	type Hint = String;

	fn hint(&self, line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
		if !line.starts_with('/') {
			return None;
		}

		// Inline remainder of the first matching command
		Self::matches(line).next().map(|cmd| cmd[line.len()..].to_string())
	}
}

impl Highlighter for CommandHelper {
	fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
		// Dim the hint so it reads as a suggestion, not typed input
		Cow::Owned(hint.bright_black().to_string())
	}
}

impl Validator for CommandHelper {}

impl Helper for CommandHelper {}

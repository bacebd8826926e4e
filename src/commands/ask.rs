// One-shot question against the property assistant

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use gharmitra::config::Config;
use gharmitra::session::{ChatSession, GeminiClient, Role};

#[derive(Args, Debug)]
pub struct AskArgs {
	/// Question to ask the property assistant
	#[arg(value_name = "QUESTION")]
	pub question: String,

	/// Use a specific model instead of the configured one
	#[arg(long)]
	pub model: Option<String>,
}

pub async fn run(args: &AskArgs, config: &Config) -> Result<()> {
	let mut gemini = config.gemini.clone();
	if let Some(model) = &args.model {
		gemini.model = model.clone();
	}
	if gemini.api_key.is_none() {
		anyhow::bail!(
			"Gemini API key not configured. Set GEMINI_API_KEY or run 'gharmitra config --api-key <KEY>'"
		);
	}

	let client = Arc::new(GeminiClient::new(gemini));
	let session = ChatSession::new(client, config);

	// Render assistant turns as the store appends them; the seed greeting
	// predates the subscription, so only the answer is printed
	session.subscribe(|message| {
		if message.role == Role::Assistant {
			println!("{}", message.content.bright_green());
		}
	});

	session.submit(&args.question).await;
	session.close();

	Ok(())
}

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gharmitra::config::{set_thread_config, Config};

#[derive(Parser)]
#[command(name = "gharmitra")]
#[command(version = "0.1.0")]
#[command(about = "GharMitra is an AI property assistant for real-estate guidance")]
struct GharmitraArgs {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Start an interactive chat session with the property assistant
	Chat(commands::chat::ChatArgs),

	/// Ask a single question and print the reply
	Ask(commands::ask::AskArgs),

	/// View or update configuration
	Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = GharmitraArgs::parse();

	// Load configuration and make it visible to the log macros
	let config = Config::load()?;
	set_thread_config(config.clone());

	match &args.command {
		Commands::Chat(chat_args) => commands::chat::run(chat_args, &config).await,
		Commands::Ask(ask_args) => commands::ask::run(ask_args, &config).await,
		Commands::Config(config_args) => commands::config::run(config_args, config),
	}
}

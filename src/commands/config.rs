// View or update the configuration file

use anyhow::Result;
use clap::Args;

use gharmitra::config::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
	/// Set the Gemini model
	#[arg(long)]
	pub model: Option<String>,

	/// Set the Gemini API key (stored in the config file)
	#[arg(long)]
	pub api_key: Option<String>,

	/// Set the log level (none, info or debug)
	#[arg(long)]
	pub log_level: Option<String>,
}

pub fn run(args: &ConfigArgs, mut config: Config) -> Result<()> {
	let mut modified = false;

	if let Some(model) = &args.model {
		config.gemini.model = model.clone();
		println!("Set Gemini model to {}", model);
		modified = true;
	}

	if let Some(api_key) = &args.api_key {
		config.set_api_key(api_key.clone());
		println!("Set Gemini API key in configuration");
		modified = true;
	}

	if let Some(log_level) = &args.log_level {
		config.log_level = log_level.parse()?;
		println!("Set log level to {}", config.log_level);
		modified = true;
	}

	if modified {
		config.save()?;
		return Ok(());
	}

	// No setters given: print the current settings, key masked
	println!("model: {}", config.gemini.model);
	println!("base_url: {}", config.gemini.base_url);
	println!("log_level: {}", config.log_level);
	println!(
		"api_key: {}",
		if config.gemini.api_key.is_some() {
			"set"
		} else {
			"not set"
		}
	);

	Ok(())
}

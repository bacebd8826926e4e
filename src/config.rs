// Configuration handling: TOML file, environment overrides, log level

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use crate::prompt;

/// Log verbosity for the developer-facing diagnostic channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	None,
	#[default]
	Info,
	Debug,
}

impl LogLevel {
	pub fn is_info_enabled(&self) -> bool {
		matches!(self, LogLevel::Info | LogLevel::Debug)
	}

	pub fn is_debug_enabled(&self) -> bool {
		matches!(self, LogLevel::Debug)
	}
}

impl std::fmt::Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			LogLevel::None => "none",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
		};
		write!(f, "{}", name)
	}
}

impl std::str::FromStr for LogLevel {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"none" => Ok(LogLevel::None),
			"info" => Ok(LogLevel::Info),
			"debug" => Ok(LogLevel::Debug),
			other => Err(anyhow::anyhow!(
				"Unknown log level '{}', expected none, info or debug",
				other
			)),
		}
	}
}

/// Settings for the Gemini generative-language endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
	/// API key; the GEMINI_API_KEY environment variable takes precedence
	#[serde(skip_serializing_if = "Option::is_none")]
	pub api_key: Option<String>,
	/// Model identifier templated into the endpoint URL
	pub model: String,
	/// Base URL of the generative-language API
	pub base_url: String,
}

impl Default for GeminiConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			model: "gemini-1.5-flash".to_string(),
			base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub log_level: LogLevel,
	/// Assistant greeting that seeds every fresh conversation
	pub greeting: String,
	/// Persona/instruction block prepended to every prompt
	pub system_prompt: String,
	pub gemini: GeminiConfig,

	#[serde(skip)]
	config_path: Option<PathBuf>,
	// Set when the API key came from the environment, so save() never
	// writes it into the config file
	#[serde(skip)]
	api_key_from_env: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_level: LogLevel::default(),
			greeting: prompt::DEFAULT_GREETING.to_string(),
			system_prompt: prompt::SYSTEM_INSTRUCTIONS.to_string(),
			gemini: GeminiConfig::default(),
			config_path: None,
			api_key_from_env: false,
		}
	}
}

impl Config {
	/// Load configuration from the system-wide config file
	pub fn load() -> Result<Self> {
		let config_path = crate::directories::get_config_file_path()?;

		let mut config = if config_path.exists() {
			let config_str = fs::read_to_string(&config_path).context(format!(
				"Failed to read config from {}",
				config_path.display()
			))?;
			toml::from_str::<Config>(&config_str)
				.context("Failed to parse TOML configuration")?
		} else {
			Config::default()
		};

		// Store the config path for future saves
		config.config_path = Some(config_path);

		// Environment variables take precedence over config file values
		config.apply_env_overrides();

		Ok(config)
	}

	/// Apply environment variable overrides on top of file values
	pub fn apply_env_overrides(&mut self) {
		if let Ok(key) = std::env::var("GEMINI_API_KEY") {
			if !key.is_empty() {
				self.gemini.api_key = Some(key);
				self.api_key_from_env = true;
			}
		}
	}

	/// Save the configuration to its TOML file
	pub fn save(&self) -> Result<()> {
		let config_path = match &self.config_path {
			Some(path) => path.clone(),
			None => crate::directories::get_config_file_path()?,
		};

		let clean = self.clean_copy_for_saving();
		let toml_str =
			toml::to_string_pretty(&clean).context("Failed to serialize configuration")?;
		fs::write(&config_path, toml_str).context(format!(
			"Failed to write config to {}",
			config_path.display()
		))?;

		Ok(())
	}

	// Keys injected from the environment must never leak into the file
	fn clean_copy_for_saving(&self) -> Config {
		let mut copy = self.clone();
		if copy.api_key_from_env {
			copy.gemini.api_key = None;
		}
		copy
	}

	/// Store an explicit API key, superseding any environment-sourced one
	pub fn set_api_key(&mut self, key: String) {
		self.gemini.api_key = Some(key);
		self.api_key_from_env = false;
	}

	pub fn get_log_level(&self) -> LogLevel {
		self.log_level
	}
}

// Thread-local configuration so log macros can check the configured level
// without threading a Config handle through every call site
thread_local! {
	static THREAD_CONFIG: RefCell<Option<Config>> = RefCell::new(None);
}

/// Install the configuration for the current thread
pub fn set_thread_config(config: Config) {
	THREAD_CONFIG.with(|cell| {
		*cell.borrow_mut() = Some(config);
	});
}

/// Run a closure against the current thread's configuration, if installed
pub fn with_thread_config<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Config) -> R,
{
	THREAD_CONFIG.with(|cell| cell.borrow().as_ref().map(f))
}

/// Info logging macro with automatic cyan coloring
#[macro_export]
macro_rules! log_info {
	($fmt:expr) => {
		if $crate::config::with_thread_config(|config| config.get_log_level().is_info_enabled())
			.unwrap_or(false)
		{
			use colored::Colorize;
			println!("{}", $fmt.cyan());
		}
	};
	($fmt:expr, $($arg:expr),*) => {
		if $crate::config::with_thread_config(|config| config.get_log_level().is_info_enabled())
			.unwrap_or(false)
		{
			use colored::Colorize;
			println!("{}", format!($fmt, $($arg),*).cyan());
		}
	};
}

/// Debug logging macro with automatic bright blue coloring
#[macro_export]
macro_rules! log_debug {
	($fmt:expr) => {
		if $crate::config::with_thread_config(|config| config.get_log_level().is_debug_enabled())
			.unwrap_or(false)
		{
			use colored::Colorize;
			println!("{}", $fmt.bright_blue());
		}
	};
	($fmt:expr, $($arg:expr),*) => {
		if $crate::config::with_thread_config(|config| config.get_log_level().is_debug_enabled())
			.unwrap_or(false)
		{
			use colored::Colorize;
			println!("{}", format!($fmt, $($arg),*).bright_blue());
		}
	};
}

/// Error logging macro with automatic bright red coloring
/// Always visible regardless of log level
#[macro_export]
macro_rules! log_error {
	($fmt:expr) => {{
		use colored::Colorize;
		eprintln!("{}", $fmt.bright_red());
	}};
	($fmt:expr, $($arg:expr),*) => {{
		use colored::Colorize;
		eprintln!("{}", format!($fmt, $($arg),*).bright_red());
	}};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config() {
		let config = Config::default();
		assert_eq!(config.log_level, LogLevel::Info);
		assert_eq!(config.gemini.model, "gemini-1.5-flash");
		assert!(config.gemini.api_key.is_none());
		assert!(config
			.gemini
			.base_url
			.starts_with("https://generativelanguage.googleapis.com"));
		assert!(!config.greeting.is_empty());
		assert!(!config.system_prompt.is_empty());
	}

	#[test]
	fn test_toml_round_trip() {
		let mut config = Config::default();
		config.gemini.model = "gemini-1.5-pro".to_string();
		config.log_level = LogLevel::Debug;

		let toml_str = toml::to_string_pretty(&config).unwrap();
		let parsed: Config = toml::from_str(&toml_str).unwrap();

		assert_eq!(parsed.gemini.model, "gemini-1.5-pro");
		assert_eq!(parsed.log_level, LogLevel::Debug);
		assert_eq!(parsed.greeting, config.greeting);
	}

	#[test]
	fn test_partial_toml_fills_defaults() {
		let parsed: Config = toml::from_str("[gemini]\nmodel = \"gemini-2.0-flash\"\n").unwrap();
		assert_eq!(parsed.gemini.model, "gemini-2.0-flash");
		assert_eq!(parsed.log_level, LogLevel::Info);
		assert_eq!(parsed.greeting, prompt::DEFAULT_GREETING);
	}

	#[test]
	fn test_env_key_never_saved() {
		let mut config = Config::default();
		config.gemini.api_key = Some("from-env".to_string());
		config.api_key_from_env = true;

		let toml_str = toml::to_string_pretty(&config.clean_copy_for_saving()).unwrap();
		assert!(
			!toml_str.contains("from-env"),
			"env-sourced key leaked into TOML: {}",
			toml_str
		);
	}

	#[test]
	fn test_log_level_parsing() {
		assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
		assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
		assert_eq!("none".parse::<LogLevel>().unwrap(), LogLevel::None);
		assert!("verbose".parse::<LogLevel>().is_err());
	}
}

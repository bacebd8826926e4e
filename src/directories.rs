// Directory utilities for cross-platform data directory management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the system-wide data directory for gharmitra
///
/// - macOS/Linux: ~/.local/share/gharmitra
/// - Windows: %LOCALAPPDATA%/gharmitra
pub fn get_gharmitra_data_dir() -> Result<PathBuf> {
	let data_dir = match dirs::home_dir() {
		Some(home) => {
			#[cfg(target_os = "windows")]
			let path = {
				match dirs::data_local_dir() {
					Some(dir) => dir.join("gharmitra"),
					None => home.join("AppData").join("Local").join("gharmitra"),
				}
			};

			#[cfg(not(target_os = "windows"))]
			let path = home.join(".local").join("share").join("gharmitra");

			path
		}
		None => {
			return Err(anyhow::anyhow!("Unable to determine home directory"));
		}
	};

	if !data_dir.exists() {
		fs::create_dir_all(&data_dir).context(format!(
			"Failed to create gharmitra data directory: {}",
			data_dir.display()
		))?;
	}

	Ok(data_dir)
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
	let data_dir = get_gharmitra_data_dir()?;
	let config_dir = data_dir.join("config");

	if !config_dir.exists() {
		fs::create_dir_all(&config_dir)?;
	}

	Ok(config_dir)
}

/// Get the path of the TOML configuration file
pub fn get_config_file_path() -> Result<PathBuf> {
	Ok(get_config_dir()?.join("config.toml"))
}

/// Get the sessions directory path (diagnostic logs, not conversation state)
pub fn get_sessions_dir() -> Result<PathBuf> {
	let data_dir = get_gharmitra_data_dir()?;
	let sessions_dir = data_dir.join("sessions");

	if !sessions_dir.exists() {
		fs::create_dir_all(&sessions_dir)?;
	}

	Ok(sessions_dir)
}

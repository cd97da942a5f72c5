// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{DatabaseConfigLayer, LoggingConfigLayer, RekeyConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/loom/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LOOM_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			rekey: Some(load_rekey_from_env()?),
			database: Some(load_database_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_rekey_from_env() -> Result<RekeyConfigLayer, ConfigError> {
	Ok(RekeyConfigLayer {
		session_timeout_secs: env_u64("LOOM_SERVER_REKEY_SESSION_TIMEOUT_SECS")?,
		reaper_interval_secs: env_u64("LOOM_SERVER_REKEY_REAPER_INTERVAL_SECS")?,
		verification_required_default: env_bool("LOOM_SERVER_REKEY_VERIFICATION_REQUIRED"),
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("LOOM_SERVER_DATABASE_URL"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("LOOM_SERVER_LOG_LEVEL"),
		json: env_bool("LOOM_SERVER_LOG_JSON"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.rekey.is_none());
		assert!(layer.database.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/config.toml").load().unwrap();
		assert!(layer.rekey.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[rekey]\nreaper_interval_secs = 5").unwrap();
		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.rekey.unwrap().reaper_interval_secs, Some(5));
	}

	#[test]
	fn test_toml_source_parse_error_names_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[rekey\nbroken").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		match err {
			ConfigError::TomlParse { path, .. } => assert_eq!(path, file.path()),
			other => panic!("expected TomlParse, got {other:?}"),
		}
	}

	#[test]
	fn test_env_u64_rejects_garbage() {
		std::env::set_var("LOOM_SERVER_TEST_ENV_U64_GARBAGE", "soon");
		let err = env_u64("LOOM_SERVER_TEST_ENV_U64_GARBAGE").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
		std::env::remove_var("LOOM_SERVER_TEST_ENV_U64_GARBAGE");
	}

	#[test]
	fn test_env_bool_forms() {
		std::env::set_var("LOOM_SERVER_TEST_ENV_BOOL_ONE", "1");
		std::env::set_var("LOOM_SERVER_TEST_ENV_BOOL_TRUE", "TRUE");
		std::env::set_var("LOOM_SERVER_TEST_ENV_BOOL_NO", "no");
		assert_eq!(env_bool("LOOM_SERVER_TEST_ENV_BOOL_ONE"), Some(true));
		assert_eq!(env_bool("LOOM_SERVER_TEST_ENV_BOOL_TRUE"), Some(true));
		assert_eq!(env_bool("LOOM_SERVER_TEST_ENV_BOOL_NO"), Some(false));
		assert_eq!(env_bool("LOOM_SERVER_TEST_ENV_BOOL_UNSET"), None);
	}
}

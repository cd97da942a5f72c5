// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Loom seal service.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`LOOM_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use loom_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("rekey sessions expire after {:?}", config.rekey.session_timeout());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
	pub rekey: RekeyConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_SERVER_*`)
/// 2. Config file (`/etc/loom/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let rekey = layer.rekey.unwrap_or_default().finalize()?;
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&rekey)?;

	info!(
		database = %database.url,
		session_timeout_secs = rekey.session_timeout_secs,
		reaper_interval_secs = rekey.reaper_interval_secs,
		verification_required_default = rekey.verification_required_default,
		log_level = %logging.level,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		rekey,
		database,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(rekey: &RekeyConfig) -> Result<(), ConfigError> {
	if rekey.reaper_interval_secs > rekey.session_timeout_secs {
		return Err(ConfigError::Validation(format!(
			"rekey.reaper_interval_secs ({}) must not exceed rekey.session_timeout_secs ({}); \
			 abandoned sessions would outlive their timeout",
			rekey.reaper_interval_secs, rekey.session_timeout_secs
		)));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	struct StaticSource(Precedence, ServerConfigLayer);

	impl ConfigSource for StaticSource {
		fn name(&self) -> &'static str {
			"static"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn timeout_layer(secs: u64) -> ServerConfigLayer {
		ServerConfigLayer {
			rekey: Some(RekeyConfigLayer {
				session_timeout_secs: Some(secs),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults_only() {
		let config = load_from_sources(vec![Box::new(DefaultsSource)]).unwrap();
		assert_eq!(config, ServerConfig::default());
		assert_eq!(config.database.url, "sqlite:./loom.db");
		assert_eq!(config.rekey.session_timeout_secs, 1800);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(StaticSource(Precedence::Environment, timeout_layer(300))),
			Box::new(StaticSource(Precedence::ConfigFile, timeout_layer(900))),
		])
		.unwrap();
		assert_eq!(config.rekey.session_timeout_secs, 300);
	}

	#[test]
	fn test_reaper_interval_longer_than_timeout_rejected() {
		let layer = ServerConfigLayer {
			rekey: Some(RekeyConfigLayer {
				session_timeout_secs: Some(30),
				reaper_interval_secs: Some(120),
				..Default::default()
			}),
			..Default::default()
		};
		let source = StaticSource(Precedence::ConfigFile, layer);
		let err = load_from_sources(vec![Box::new(source)]).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn test_load_config_with_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[rekey]
session_timeout_secs = 600

[database]
url = "sqlite:/var/lib/loom/seal.db"
"#
		)
		.unwrap();

		let config = load_config_with_file(file.path()).unwrap();
		assert_eq!(config.rekey.session_timeout_secs, 600);
		assert_eq!(config.database.url, "sqlite:/var/lib/loom/seal.db");
	}
}

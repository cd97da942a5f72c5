// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rekey session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 1800;
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RekeyConfigLayer {
	pub session_timeout_secs: Option<u64>,
	pub reaper_interval_secs: Option<u64>,
	pub verification_required_default: Option<bool>,
}

impl RekeyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.session_timeout_secs.is_some() {
			self.session_timeout_secs = other.session_timeout_secs;
		}
		if other.reaper_interval_secs.is_some() {
			self.reaper_interval_secs = other.reaper_interval_secs;
		}
		if other.verification_required_default.is_some() {
			self.verification_required_default = other.verification_required_default;
		}
	}

	pub fn finalize(self) -> Result<RekeyConfig, ConfigError> {
		let config = RekeyConfig {
			session_timeout_secs: self
				.session_timeout_secs
				.unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS),
			reaper_interval_secs: self
				.reaper_interval_secs
				.unwrap_or(DEFAULT_REAPER_INTERVAL_SECS),
			verification_required_default: self.verification_required_default.unwrap_or(false),
		};
		config.validate()?;
		Ok(config)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RekeyConfig {
	/// Sessions older than this are cancelled.
	pub session_timeout_secs: u64,
	/// How often abandoned sessions are swept.
	pub reaper_interval_secs: u64,
	/// Whether new sessions require verification when the request is silent.
	pub verification_required_default: bool,
}

impl RekeyConfig {
	pub fn session_timeout(&self) -> Duration {
		Duration::from_secs(self.session_timeout_secs)
	}

	pub fn reaper_interval(&self) -> Duration {
		Duration::from_secs(self.reaper_interval_secs)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.session_timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "rekey.session_timeout_secs".to_string(),
				message: "must be greater than zero".to_string(),
			});
		}
		if self.reaper_interval_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "rekey.reaper_interval_secs".to_string(),
				message: "must be greater than zero".to_string(),
			});
		}
		Ok(())
	}
}

impl Default for RekeyConfig {
	fn default() -> Self {
		Self {
			session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
			reaper_interval_secs: DEFAULT_REAPER_INTERVAL_SECS,
			verification_required_default: false,
		}
	}
}

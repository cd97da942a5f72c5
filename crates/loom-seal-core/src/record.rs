// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted schema for seal configurations.
//!
//! The record is what gets written to storage and returned over the API. It is
//! kept separate from [`SealConfig`] so the entity can use typed fields while
//! the stored form stays stable.

use serde::{Deserialize, Serialize};

use crate::config::SealConfig;
use crate::error::RecordError;
use crate::seal_type::SealConfigType;

/// Wire form of a [`SealConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealConfigRecord {
	#[serde(rename = "type")]
	pub seal_type: String,

	pub secret_shares: i64,

	pub secret_threshold: i64,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub pgp_keys: Vec<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,

	#[serde(default)]
	pub backup: bool,

	#[serde(default)]
	pub stored_shares: i64,

	#[serde(default)]
	pub name: String,
}

impl From<&SealConfig> for SealConfigRecord {
	fn from(config: &SealConfig) -> Self {
		Self {
			seal_type: config.seal_type.as_str().to_string(),
			secret_shares: config.secret_shares,
			secret_threshold: config.secret_threshold,
			pgp_keys: config.pgp_keys.clone(),
			nonce: config.nonce.clone(),
			backup: config.backup,
			stored_shares: config.stored_shares,
			name: config.name.clone(),
		}
	}
}

impl SealConfigRecord {
	/// Decode a barrier (primary) seal configuration.
	pub fn into_config(self) -> Result<SealConfig, RecordError> {
		let seal_type = self.seal_type.parse::<SealConfigType>()?;
		Ok(self.build(seal_type))
	}

	/// Decode a recovery seal configuration. The stored type must be `shamir`.
	pub fn into_recovery_config(self) -> Result<SealConfig, RecordError> {
		if !SealConfigType::Recovery.is_same_as(&self.seal_type) {
			return Err(RecordError::RecoveryNotShamir(self.seal_type));
		}
		Ok(self.build(SealConfigType::Recovery))
	}

	/// Copy of the record with the nonce stripped.
	pub fn without_nonce(&self) -> Self {
		Self {
			nonce: None,
			..self.clone()
		}
	}

	fn build(self, seal_type: SealConfigType) -> SealConfig {
		SealConfig {
			seal_type,
			secret_shares: self.secret_shares,
			secret_threshold: self.secret_threshold,
			pgp_keys: self.pgp_keys,
			nonce: self.nonce,
			backup: self.backup,
			stored_shares: self.stored_shares,
			name: self.name,
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for seal configuration handling.

use thiserror::Error;

/// Reasons a seal configuration is rejected.
///
/// Variants are listed in the order [`SealConfig::validate`](crate::SealConfig::validate)
/// checks them; the first failing check is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("shares must be at least one")]
	ShareCount,

	#[error("threshold must be at least one")]
	ThresholdCount,

	#[error("threshold must be greater than one for multiple shares")]
	ThresholdTooLow,

	#[error("{field} must be less than 256")]
	Range { field: &'static str },

	#[error("threshold cannot be larger than shares")]
	ThresholdExceedsShares,

	#[error("stored keys must be 0 or 1")]
	StoredShares,

	#[error("count mismatch between number of provided PGP keys ({keys}) and number of shares ({shares})")]
	PgpKeyCount { keys: usize, shares: i64 },

	#[error("error parsing given PGP key at index {index}: {reason}")]
	PgpKeyParse { index: usize, reason: String },

	#[error("cannot request a backup of the new keys without providing PGP keys for encryption")]
	BackupRequiresPgpKeys,
}

/// Errors converting a persisted [`SealConfigRecord`](crate::SealConfigRecord)
/// into an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
	#[error("unknown seal type: {0}")]
	UnknownSealType(String),

	#[error("recovery configuration must use the shamir type, found {0}")]
	RecoveryNotShamir(String),
}

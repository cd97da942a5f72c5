// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the rekey protocol.

use loom_seal_core::{RecordError, ShareEncryptionError, ValidationError};
use thiserror::Error;

use crate::orchestrator::FatalReport;

/// Errors raised by storage and barrier collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Invalid stored record: {0}")]
	Record(#[from] RecordError),

	#[error("Internal: {0}")]
	Internal(String),
}

/// A presented nonce does not authorize the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
	#[error("nonce does not match the active rekey operation")]
	NonceMismatch,

	#[error("nonce belongs to a rekey operation that has ended")]
	StaleNonce,
}

/// The operation is not valid in the current session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
	#[error("a rekey operation is already in progress")]
	OperationInProgress,

	#[error("no rekey operation is in progress")]
	NoActiveOperation,

	#[error("operation is not valid in the {0} phase")]
	WrongPhase(&'static str),

	#[error("seal configuration has not been initialized")]
	NotInitialized,

	#[error("share has already been submitted")]
	DuplicateShare,

	#[error("a previous rekey left the barrier and seal configuration inconsistent; operator intervention is required")]
	OperatorInterventionRequired,
}

/// Failures of the Shamir, OpenPGP or key primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
	#[error("failed to combine key shares: {0}")]
	Combine(String),

	#[error("failed to split key: {0}")]
	Split(String),

	#[error("submitted shares do not reconstruct the current master key")]
	KeyVerification,

	#[error("verification shares do not match the new master key")]
	VerificationMismatch,

	#[error("invalid public key: {0}")]
	InvalidPublicKey(String),

	#[error("share encryption failed: {0}")]
	EncryptionFailure(String),

	#[error("failed to generate master key: {0}")]
	KeyGeneration(String),
}

impl From<ShareEncryptionError> for CryptoError {
	fn from(e: ShareEncryptionError) -> Self {
		match e {
			ShareEncryptionError::InvalidPublicKey(reason) => CryptoError::InvalidPublicKey(reason),
			other => CryptoError::EncryptionFailure(other.to_string()),
		}
	}
}

#[derive(Debug, Error)]
pub enum PersistenceError {
	#[error("storage error: {0}")]
	Storage(#[source] StoreError),

	#[error("barrier error: {0}")]
	Barrier(#[source] StoreError),
}

/// Every failure surfaced by [`RekeyOrchestrator`](crate::RekeyOrchestrator).
#[derive(Debug, Error)]
pub enum RekeyError {
	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error(transparent)]
	Security(#[from] SecurityError),

	#[error(transparent)]
	State(#[from] StateError),

	#[error(transparent)]
	Crypto(#[from] CryptoError),

	#[error(transparent)]
	Persistence(#[from] PersistenceError),

	#[error("fatal inconsistency: {0}")]
	Fatal(FatalReport),
}

impl RekeyError {
	/// True when the caller can correct the request and try again without the
	/// session having changed.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			RekeyError::Validation(_) | RekeyError::Security(_) | RekeyError::State(_)
		)
	}

	pub fn is_fatal(&self) -> bool {
		matches!(self, RekeyError::Fatal(_))
	}
}

pub type Result<T> = std::result::Result<T, RekeyError>;

/// Failures while starting the seal service.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error("configuration error: {0}")]
	Config(#[from] loom_server_config::ConfigError),

	#[error("storage error: {0}")]
	Store(#[from] StoreError),

	#[error("failed to install tracing subscriber: {0}")]
	Tracing(String),
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Contract for protecting key shares handed to operators.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareEncryptionError {
	#[error("invalid public key: {0}")]
	InvalidPublicKey(String),

	#[error("share encryption failed: {0}")]
	EncryptionFailure(String),

	#[error("expected {keys} public keys for {shares} shares")]
	KeyCount { keys: usize, shares: usize },
}

/// Public-key encryption of single shares.
///
/// Keys are passed as raw (already base64-decoded) key material.
pub trait ShareEncryptor: Send + Sync {
	/// Check that `key` is a usable public key.
	fn parse_public_key(&self, key: &[u8]) -> Result<(), ShareEncryptionError>;

	/// Encrypt `share` so that only the holder of the private half of `key`
	/// can read it.
	fn encrypt(&self, share: &[u8], key: &[u8]) -> Result<Vec<u8>, ShareEncryptionError>;
}

/// Encrypt each share for the key at the same position.
pub fn encrypt_shares<S: AsRef<[u8]>>(
	encryptor: &dyn ShareEncryptor,
	shares: &[S],
	keys: &[Vec<u8>],
) -> Result<Vec<Vec<u8>>, ShareEncryptionError> {
	if shares.len() != keys.len() {
		return Err(ShareEncryptionError::KeyCount {
			keys: keys.len(),
			shares: shares.len(),
		});
	}
	shares
		.iter()
		.zip(keys)
		.map(|(share, key)| encryptor.encrypt(share.as_ref(), key))
		.collect()
}

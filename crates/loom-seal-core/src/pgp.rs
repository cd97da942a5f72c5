// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenPGP implementation of [`ShareEncryptor`].

use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::ser::Serialize;
use pgp::types::PublicKeyTrait;
use pgp::{Deserializable, Message, SignedPublicKey};

use crate::share_encryption::{ShareEncryptionError, ShareEncryptor};

/// Encrypts shares to OpenPGP public keys.
///
/// Keys may be binary transferable public keys or ASCII armored. Shares are
/// encrypted to the first encryption-capable subkey, falling back to the
/// primary key, and returned as binary OpenPGP messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgpShareEncryptor;

impl PgpShareEncryptor {
	fn read_key(key: &[u8]) -> Result<SignedPublicKey, ShareEncryptionError> {
		let parsed = if key.starts_with(b"-----BEGIN") {
			SignedPublicKey::from_armor_single(key).map(|(k, _headers)| k)
		} else {
			SignedPublicKey::from_bytes(key)
		};
		let parsed = parsed.map_err(|e| ShareEncryptionError::InvalidPublicKey(e.to_string()))?;
		parsed
			.verify()
			.map_err(|e| ShareEncryptionError::InvalidPublicKey(e.to_string()))?;
		Ok(parsed)
	}

	/// Reject keys with neither an encryption subkey nor an encrypting
	/// primary, so they fail validation instead of encryption.
	fn ensure_can_encrypt(key: &SignedPublicKey) -> Result<(), ShareEncryptionError> {
		let subkey = key.public_subkeys.iter().any(|sk| sk.is_encryption_key());
		if subkey || key.is_encryption_key() {
			Ok(())
		} else {
			Err(no_encryption_component())
		}
	}

	fn encrypt_to<K: PublicKeyTrait>(
		share: &[u8],
		key: &K,
	) -> Result<Vec<u8>, ShareEncryptionError> {
		let mut rng = rand::thread_rng();
		Message::new_literal_bytes("", share)
			.encrypt_to_keys_seipdv1(&mut rng, SymmetricKeyAlgorithm::AES256, &[key])
			.and_then(|message| message.to_bytes())
			.map_err(|e| ShareEncryptionError::EncryptionFailure(e.to_string()))
	}
}

impl ShareEncryptor for PgpShareEncryptor {
	fn parse_public_key(&self, key: &[u8]) -> Result<(), ShareEncryptionError> {
		Self::ensure_can_encrypt(&Self::read_key(key)?)
	}

	fn encrypt(&self, share: &[u8], key: &[u8]) -> Result<Vec<u8>, ShareEncryptionError> {
		let key = Self::read_key(key)?;
		match key.public_subkeys.iter().find(|sk| sk.is_encryption_key()) {
			Some(subkey) => Self::encrypt_to(share, subkey),
			None if key.is_encryption_key() => Self::encrypt_to(share, &key),
			None => Err(no_encryption_component()),
		}
	}
}

fn no_encryption_component() -> ShareEncryptionError {
	ShareEncryptionError::InvalidPublicKey("key has no encryption capable component".to_string())
}

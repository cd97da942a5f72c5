// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The seal configuration entity and its validator.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use crate::error::ValidationError;
use crate::pgp::PgpShareEncryptor;
use crate::seal_type::SealConfigType;
use crate::share_encryption::ShareEncryptor;

/// Upper bound for both share count and threshold.
pub const MAX_SHARES: i64 = 255;

/// Describes how the master key is currently split.
///
/// Counts are kept as `i64` so that out-of-range input arriving from the
/// boundary is representable and rejected by [`SealConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealConfig {
	/// The seal type, for sanity checking.
	pub seal_type: SealConfigType,

	/// Number of shares the key is split into (Shamir N).
	pub secret_shares: i64,

	/// Number of shares required to reconstruct the key (Shamir T).
	pub secret_threshold: i64,

	/// Base64-encoded operator public keys. Share `i` is encrypted for key `i`.
	pub pgp_keys: Vec<String>,

	/// Binds share submissions to a specific rekey operation. Only set while a
	/// rekey is in flight.
	pub nonce: Option<String>,

	/// Persist PGP-encrypted shares for later retrieval after a rekey.
	pub backup: bool,

	/// How many keys the seal itself stores, for seals that support it.
	pub stored_shares: i64,

	/// Name identifying the seal mechanism.
	pub name: String,
}

impl SealConfig {
	/// A Shamir configuration with the given split and no optional settings.
	pub fn shamir(secret_shares: i64, secret_threshold: i64) -> Self {
		Self {
			seal_type: SealConfigType::Shamir,
			secret_shares,
			secret_threshold,
			pgp_keys: Vec::new(),
			nonce: None,
			backup: false,
			stored_shares: 0,
			name: String::new(),
		}
	}

	/// Validate the configuration, parsing PGP keys with the OpenPGP adapter.
	pub fn validate(&self) -> Result<(), ValidationError> {
		self.validate_with(&PgpShareEncryptor)
	}

	/// Validate the configuration, parsing PGP keys with `keys`.
	///
	/// Checks run in a fixed order and the first failure is returned.
	pub fn validate_with(&self, keys: &dyn ShareEncryptor) -> Result<(), ValidationError> {
		let result = self.check_counts().and_then(|()| self.check_pgp_keys(keys));
		if let Err(ref e) = result {
			debug!(error = %e, "seal configuration rejected");
		}
		result
	}

	fn check_counts(&self) -> Result<(), ValidationError> {
		if self.secret_shares < 1 {
			return Err(ValidationError::ShareCount);
		}
		if self.secret_threshold < 1 {
			return Err(ValidationError::ThresholdCount);
		}
		if self.secret_shares > 1 && self.secret_threshold == 1 {
			return Err(ValidationError::ThresholdTooLow);
		}
		if self.secret_shares > MAX_SHARES {
			return Err(ValidationError::Range { field: "shares" });
		}
		if self.secret_threshold > MAX_SHARES {
			return Err(ValidationError::Range { field: "threshold" });
		}
		if self.secret_threshold > self.secret_shares {
			return Err(ValidationError::ThresholdExceedsShares);
		}
		if !(0..=1).contains(&self.stored_shares) {
			return Err(ValidationError::StoredShares);
		}
		Ok(())
	}

	fn check_pgp_keys(&self, keys: &dyn ShareEncryptor) -> Result<(), ValidationError> {
		if self.pgp_keys.is_empty() {
			return Ok(());
		}
		if self.pgp_keys.len() as i64 != self.secret_shares {
			return Err(ValidationError::PgpKeyCount {
				keys: self.pgp_keys.len(),
				shares: self.secret_shares,
			});
		}
		for (index, decoded) in self.decoded_pgp_keys()?.iter().enumerate() {
			keys
				.parse_public_key(decoded)
				.map_err(|e| ValidationError::PgpKeyParse {
					index,
					reason: e.to_string(),
				})?;
		}
		Ok(())
	}

	/// Decode the base64 PGP keys, preserving their order.
	pub fn decoded_pgp_keys(&self) -> Result<Vec<Vec<u8>>, ValidationError> {
		self
			.pgp_keys
			.iter()
			.enumerate()
			.map(|(index, key)| {
				BASE64
					.decode(key.trim())
					.map_err(|e| ValidationError::PgpKeyParse {
						index,
						reason: format!("error decoding given PGP key: {e}"),
					})
			})
			.collect()
	}

	/// Share count as `usize`. Only meaningful after validation.
	pub fn share_count(&self) -> usize {
		usize::try_from(self.secret_shares).unwrap_or(0)
	}

	/// Threshold as `usize`. Only meaningful after validation.
	pub fn threshold(&self) -> usize {
		usize::try_from(self.secret_threshold).unwrap_or(0)
	}

	/// Copy of this configuration with the nonce removed, for display.
	pub fn without_nonce(&self) -> Self {
		Self {
			nonce: None,
			..self.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::share_encryption::ShareEncryptionError;
	use proptest::prelude::*;

	/// Accepts any key whose bytes start with `PK`.
	struct PrefixKeys;

	impl ShareEncryptor for PrefixKeys {
		fn parse_public_key(&self, key: &[u8]) -> Result<(), ShareEncryptionError> {
			if key.starts_with(b"PK") {
				Ok(())
			} else {
				Err(ShareEncryptionError::InvalidPublicKey("not a key".to_string()))
			}
		}

		fn encrypt(&self, share: &[u8], _key: &[u8]) -> Result<Vec<u8>, ShareEncryptionError> {
			Ok(share.to_vec())
		}
	}

	fn key(n: u8) -> String {
		BASE64.encode([b'P', b'K', n])
	}

	fn config(shares: i64, threshold: i64) -> SealConfig {
		SealConfig::shamir(shares, threshold)
	}

	#[test]
	fn test_valid_configurations() {
		for (shares, threshold) in [(1, 1), (2, 2), (5, 3), (255, 255), (255, 2)] {
			assert_eq!(config(shares, threshold).validate_with(&PrefixKeys), Ok(()));
		}
	}

	#[test]
	fn test_share_count_checked_first() {
		assert_eq!(
			config(0, 0).validate_with(&PrefixKeys),
			Err(ValidationError::ShareCount)
		);
	}

	#[test]
	fn test_threshold_count() {
		assert_eq!(
			config(3, 0).validate_with(&PrefixKeys),
			Err(ValidationError::ThresholdCount)
		);
	}

	#[test]
	fn test_threshold_too_low_for_multiple_shares() {
		assert_eq!(
			config(5, 1).validate_with(&PrefixKeys),
			Err(ValidationError::ThresholdTooLow)
		);
	}

	#[test]
	fn test_range() {
		assert_eq!(
			config(256, 3).validate_with(&PrefixKeys),
			Err(ValidationError::Range { field: "shares" })
		);
		assert_eq!(
			config(255, 256).validate_with(&PrefixKeys),
			Err(ValidationError::Range { field: "threshold" })
		);
	}

	#[test]
	fn test_threshold_exceeds_shares() {
		assert_eq!(
			config(3, 4).validate_with(&PrefixKeys),
			Err(ValidationError::ThresholdExceedsShares)
		);
	}

	#[test]
	fn test_stored_shares() {
		let mut cfg = config(1, 1);
		cfg.stored_shares = 2;
		assert_eq!(cfg.validate_with(&PrefixKeys), Err(ValidationError::StoredShares));
		cfg.stored_shares = -1;
		assert_eq!(cfg.validate_with(&PrefixKeys), Err(ValidationError::StoredShares));
		cfg.stored_shares = 1;
		assert_eq!(cfg.validate_with(&PrefixKeys), Ok(()));
	}

	#[test]
	fn test_pgp_key_count_mismatch() {
		let mut cfg = config(3, 2);
		cfg.pgp_keys = vec![key(1), key(2)];
		assert_eq!(
			cfg.validate_with(&PrefixKeys),
			Err(ValidationError::PgpKeyCount { keys: 2, shares: 3 })
		);
	}

	#[test]
	fn test_pgp_key_parse_error_names_index() {
		let mut cfg = config(3, 2);
		cfg.pgp_keys = vec![key(1), BASE64.encode(b"garbage"), key(3)];
		match cfg.validate_with(&PrefixKeys) {
			Err(ValidationError::PgpKeyParse { index, .. }) => assert_eq!(index, 1),
			other => panic!("expected PgpKeyParse, got {other:?}"),
		}
	}

	#[test]
	fn test_pgp_key_decode_error_names_index() {
		let mut cfg = config(2, 2);
		cfg.pgp_keys = vec![key(1), "not base64!!".to_string()];
		match cfg.validate_with(&PrefixKeys) {
			Err(ValidationError::PgpKeyParse { index, reason }) => {
				assert_eq!(index, 1);
				assert!(reason.contains("decoding"));
			}
			other => panic!("expected PgpKeyParse, got {other:?}"),
		}
	}

	#[test]
	fn test_valid_pgp_keys() {
		let mut cfg = config(3, 2);
		cfg.pgp_keys = vec![key(1), key(2), key(3)];
		assert_eq!(cfg.validate_with(&PrefixKeys), Ok(()));
	}

	#[test]
	fn test_default_validator_rejects_non_pgp_bytes() {
		let mut cfg = config(1, 1);
		cfg.pgp_keys = vec![BASE64.encode(b"definitely not an openpgp packet")];
		assert!(matches!(
			cfg.validate(),
			Err(ValidationError::PgpKeyParse { index: 0, .. })
		));
	}

	#[test]
	fn test_default_validator_checks_encryption_capability() {
		use crate::pgp::test_keys::operator_key;
		use pgp::ser::Serialize;

		let encrypting = BASE64.encode(operator_key(true).to_bytes().unwrap());
		let sign_only = BASE64.encode(operator_key(false).to_bytes().unwrap());

		let mut cfg = config(2, 2);
		cfg.pgp_keys = vec![encrypting.clone(), encrypting.clone()];
		assert_eq!(cfg.validate(), Ok(()));

		cfg.pgp_keys = vec![encrypting, sign_only];
		assert!(matches!(
			cfg.validate(),
			Err(ValidationError::PgpKeyParse { index: 1, .. })
		));
	}

	#[test]
	fn test_clone_is_independent() {
		let mut original = config(3, 2);
		original.pgp_keys = vec![key(1), key(2), key(3)];
		original.nonce = Some("nonce".to_string());

		let mut copy = original.clone();
		assert_eq!(copy, original);

		copy.pgp_keys[0] = key(9);
		copy.pgp_keys.push(key(10));
		assert_eq!(original.pgp_keys, vec![key(1), key(2), key(3)]);

		original.pgp_keys.clear();
		assert_eq!(copy.pgp_keys.len(), 4);
	}

	#[test]
	fn test_without_nonce() {
		let mut cfg = config(1, 1);
		cfg.nonce = Some("abc".to_string());
		assert_eq!(cfg.without_nonce().nonce, None);
		assert_eq!(cfg.nonce.as_deref(), Some("abc"));
	}

	proptest! {
		#[test]
		fn prop_validate_matches_invariants(
			shares in -2i64..300,
			threshold in -2i64..300,
			stored in -1i64..3,
		) {
			let mut cfg = config(shares, threshold);
			cfg.stored_shares = stored;

			let expected = (1..=threshold).contains(&1)
				&& threshold <= shares
				&& shares <= MAX_SHARES
				&& (shares == 1 || threshold > 1)
				&& (0..=1).contains(&stored);

			prop_assert_eq!(cfg.validate_with(&PrefixKeys).is_ok(), expected);
		}

		#[test]
		fn prop_pgp_keys_must_match_share_count(shares in 2i64..10, keys in 1usize..12) {
			let mut cfg = config(shares, 2);
			cfg.pgp_keys = (0..keys).map(|n| key(n as u8)).collect();
			prop_assert_eq!(cfg.validate_with(&PrefixKeys).is_ok(), keys as i64 == shares);
		}

		#[test]
		fn prop_clone_mutation_never_leaks(keys in proptest::collection::vec("[A-Za-z0-9]{4,16}", 0..8)) {
			let mut original = config(keys.len().max(1) as i64, 1);
			original.pgp_keys = keys.clone();
			let mut copy = original.clone();
			prop_assert_eq!(&copy, &original);
			for k in copy.pgp_keys.iter_mut() {
				k.push('x');
			}
			prop_assert_eq!(&original.pgp_keys, &keys);
		}
	}
}

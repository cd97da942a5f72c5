// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shamir secret sharing of master keys.

use loom_common_secret::SecretBytes;
use sharks::{Share, Sharks};

use crate::error::CryptoError;

/// Splits a key into shares and reconstructs it from a quorum.
pub trait KeySplitter: Send + Sync {
	/// Split `secret` into `shares` parts, any `threshold` of which rebuild it.
	fn split(
		&self,
		secret: &[u8],
		shares: usize,
		threshold: usize,
	) -> Result<Vec<SecretBytes>, CryptoError>;

	/// Rebuild the secret from at least a threshold of shares.
	fn combine(&self, shares: &[SecretBytes]) -> Result<SecretBytes, CryptoError>;
}

/// [`KeySplitter`] over GF(256) using the `sharks` crate.
///
/// A 1-of-1 split hands out the secret itself, and combining a single share
/// returns it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharksSplitter;

impl KeySplitter for SharksSplitter {
	fn split(
		&self,
		secret: &[u8],
		shares: usize,
		threshold: usize,
	) -> Result<Vec<SecretBytes>, CryptoError> {
		if secret.is_empty() {
			return Err(CryptoError::Split("secret is empty".to_string()));
		}
		if threshold == 0 || threshold > shares {
			return Err(CryptoError::Split(format!(
				"invalid split of {shares} shares with threshold {threshold}"
			)));
		}
		if shares == 1 {
			return Ok(vec![SecretBytes::new(secret.to_vec())]);
		}

		let threshold = u8::try_from(threshold)
			.map_err(|_| CryptoError::Split(format!("threshold {threshold} exceeds 255")))?;
		if shares > usize::from(u8::MAX) {
			return Err(CryptoError::Split(format!("{shares} shares exceeds 255")));
		}

		let dealer = Sharks(threshold).dealer(secret);
		Ok(dealer
			.take(shares)
			.map(|share| SecretBytes::new(Vec::from(&share)))
			.collect())
	}

	fn combine(&self, shares: &[SecretBytes]) -> Result<SecretBytes, CryptoError> {
		match shares {
			[] => Err(CryptoError::Combine("no shares provided".to_string())),
			[single] => Ok(single.clone()),
			many => {
				let parsed = many
					.iter()
					.map(|share| Share::try_from(share.expose().as_slice()))
					.collect::<Result<Vec<Share>, _>>()
					.map_err(|e| CryptoError::Combine(e.to_string()))?;
				let threshold = u8::try_from(parsed.len())
					.map_err(|_| CryptoError::Combine("too many shares".to_string()))?;
				Sharks(threshold)
					.recover(&parsed)
					.map(SecretBytes::new)
					.map_err(|e| CryptoError::Combine(e.to_string()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn key() -> Vec<u8> {
		(0u8..32).collect()
	}

	#[test]
	fn test_threshold_of_shares_recovers_key() {
		let shares = SharksSplitter.split(&key(), 5, 3).unwrap();
		assert_eq!(shares.len(), 5);

		let quorum = vec![shares[4].clone(), shares[0].clone(), shares[2].clone()];
		let recovered = SharksSplitter.combine(&quorum).unwrap();
		assert_eq!(recovered.expose(), &key());
	}

	#[test]
	fn test_below_threshold_does_not_recover_key() {
		let shares = SharksSplitter.split(&key(), 5, 3).unwrap();
		let partial = vec![shares[0].clone(), shares[1].clone()];
		let recovered = SharksSplitter.combine(&partial);
		assert!(recovered.map(|k| k.expose() != &key()).unwrap_or(true));
	}

	#[test]
	fn test_single_share_is_the_secret() {
		let shares = SharksSplitter.split(&key(), 1, 1).unwrap();
		assert_eq!(shares.len(), 1);
		assert_eq!(shares[0].expose(), &key());
		assert_eq!(SharksSplitter.combine(&shares).unwrap().expose(), &key());
	}

	#[test]
	fn test_invalid_split_parameters() {
		assert!(SharksSplitter.split(&key(), 2, 3).is_err());
		assert!(SharksSplitter.split(&key(), 3, 0).is_err());
		assert!(SharksSplitter.split(&[], 3, 2).is_err());
		assert!(SharksSplitter.split(&key(), 256, 2).is_err());
	}

	#[test]
	fn test_combine_rejects_empty_and_malformed() {
		assert!(SharksSplitter.combine(&[]).is_err());
		let malformed = vec![SecretBytes::new(vec![]), SecretBytes::new(vec![])];
		assert!(matches!(
			SharksSplitter.combine(&malformed),
			Err(CryptoError::Combine(_))
		));
	}
}

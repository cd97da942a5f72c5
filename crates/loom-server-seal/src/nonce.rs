// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability tokens binding share submissions to one rekey operation.
//!
//! Nonces are random UUIDv4 strings. Once a session ends its nonces are
//! retired; the guard remembers a SHA-256 digest of every retired nonce so
//! that it can reject replays without keeping the tokens themselves.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::SecurityError;

/// Issues nonces and remembers every one that has been retired.
///
/// The retired set is never pruned: it grows by one 32-byte digest per
/// retired nonce (at most two per rekey session) for the life of the process.
#[derive(Debug, Default)]
pub struct NonceGuard {
	retired: HashSet<[u8; 32]>,
}

impl NonceGuard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Mint a nonce that has never been retired.
	pub fn mint(&self) -> String {
		loop {
			let nonce = Uuid::new_v4().to_string();
			if !self.is_retired(&nonce) {
				return nonce;
			}
		}
	}

	/// Permanently retire `nonce`.
	pub fn retire(&mut self, nonce: &str) {
		self.retired.insert(digest(nonce));
	}

	pub fn is_retired(&self, nonce: &str) -> bool {
		self.retired.contains(&digest(nonce))
	}

	/// Reject nonces from sessions that have ended.
	pub fn ensure_live(&self, presented: &str) -> Result<(), SecurityError> {
		if self.is_retired(presented) {
			return Err(SecurityError::StaleNonce);
		}
		Ok(())
	}

	/// Constant-time comparison of a presented nonce with the active one.
	pub fn verify(&self, presented: &str, active: &str) -> Result<(), SecurityError> {
		self.ensure_live(presented)?;
		if bool::from(presented.as_bytes().ct_eq(active.as_bytes())) {
			Ok(())
		} else {
			Err(SecurityError::NonceMismatch)
		}
	}

	pub fn retired_count(&self) -> usize {
		self.retired.len()
	}
}

fn digest(nonce: &str) -> [u8; 32] {
	Sha256::digest(nonce.as_bytes()).into()
}

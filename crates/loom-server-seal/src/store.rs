// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Contracts for the storage and barrier subsystems the rekey protocol
//! depends on.

use async_trait::async_trait;
use loom_common_secret::SecretBytes;
use loom_seal_core::SealConfigRecord;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// PGP-encrypted shares persisted after a rekey that requested a backup.
///
/// `encrypted_shares[i]` is the hex-encoded ciphertext for `pgp_keys[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RekeyBackup {
	/// Nonce of the rekey operation that produced the shares.
	pub nonce: String,
	pub pgp_keys: Vec<String>,
	pub encrypted_shares: Vec<String>,
}

/// Durable storage for the seal configuration and rekey backups.
#[async_trait]
pub trait SealStore: Send + Sync {
	async fn load_seal_config(&self) -> Result<Option<SealConfigRecord>, StoreError>;
	async fn store_seal_config(&self, record: &SealConfigRecord) -> Result<(), StoreError>;
	async fn store_rekey_backup(&self, backup: &RekeyBackup) -> Result<(), StoreError>;
	async fn load_rekey_backup(&self) -> Result<Option<RekeyBackup>, StoreError>;
	async fn delete_rekey_backup(&self) -> Result<(), StoreError>;
}

/// The encryption barrier protecting stored data with the master key.
#[async_trait]
pub trait Barrier: Send + Sync {
	/// Generate fresh master key material.
	async fn generate_key(&self) -> Result<SecretBytes, StoreError>;

	/// Check whether `key` is the master key currently in use.
	async fn verify_master_key(&self, key: &SecretBytes) -> Result<bool, StoreError>;

	/// Replace the master key. Either fully succeeds or leaves the old key.
	async fn install_master_key(&self, key: &SecretBytes) -> Result<(), StoreError>;
}

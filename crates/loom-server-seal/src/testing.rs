// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborators with fault injection, for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use loom_common_secret::SecretBytes;
use loom_seal_core::SealConfigRecord;
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{Barrier, RekeyBackup, SealStore};

pub const TEST_KEY_SIZE: usize = 32;

fn injected(what: &str) -> StoreError {
	StoreError::Internal(format!("injected {what} failure"))
}

#[derive(Default)]
pub struct MemorySealStore {
	config: Mutex<Option<SealConfigRecord>>,
	backup: Mutex<Option<RekeyBackup>>,
	fail_config_writes: AtomicBool,
	fail_backup_writes: AtomicBool,
	config_writes: AtomicUsize,
}

impl MemorySealStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(record: SealConfigRecord) -> Self {
		Self {
			config: Mutex::new(Some(record)),
			..Self::default()
		}
	}

	pub fn fail_config_writes(&self, fail: bool) {
		self.fail_config_writes.store(fail, Ordering::SeqCst);
	}

	pub fn fail_backup_writes(&self, fail: bool) {
		self.fail_backup_writes.store(fail, Ordering::SeqCst);
	}

	/// Number of successful configuration writes.
	pub fn config_writes(&self) -> usize {
		self.config_writes.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl SealStore for MemorySealStore {
	async fn load_seal_config(&self) -> Result<Option<SealConfigRecord>, StoreError> {
		Ok(self.config.lock().await.clone())
	}

	async fn store_seal_config(&self, record: &SealConfigRecord) -> Result<(), StoreError> {
		if self.fail_config_writes.load(Ordering::SeqCst) {
			return Err(injected("seal config write"));
		}
		*self.config.lock().await = Some(record.clone());
		self.config_writes.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	async fn store_rekey_backup(&self, backup: &RekeyBackup) -> Result<(), StoreError> {
		if self.fail_backup_writes.load(Ordering::SeqCst) {
			return Err(injected("backup write"));
		}
		*self.backup.lock().await = Some(backup.clone());
		Ok(())
	}

	async fn load_rekey_backup(&self) -> Result<Option<RekeyBackup>, StoreError> {
		Ok(self.backup.lock().await.clone())
	}

	async fn delete_rekey_backup(&self) -> Result<(), StoreError> {
		*self.backup.lock().await = None;
		Ok(())
	}
}

/// Barrier holding its master key in memory.
pub struct MemoryBarrier {
	key: Mutex<SecretBytes>,
	fail_install: AtomicBool,
	fail_generate: AtomicBool,
	installs: AtomicUsize,
}

impl MemoryBarrier {
	pub fn new(key: SecretBytes) -> Self {
		Self {
			key: Mutex::new(key),
			fail_install: AtomicBool::new(false),
			fail_generate: AtomicBool::new(false),
			installs: AtomicUsize::new(0),
		}
	}

	/// A barrier with a random master key.
	pub fn random() -> Self {
		Self::new(random_key())
	}

	pub async fn current_key(&self) -> SecretBytes {
		self.key.lock().await.clone()
	}

	pub fn fail_install(&self, fail: bool) {
		self.fail_install.store(fail, Ordering::SeqCst);
	}

	pub fn fail_generate(&self, fail: bool) {
		self.fail_generate.store(fail, Ordering::SeqCst);
	}

	pub fn installs(&self) -> usize {
		self.installs.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Barrier for MemoryBarrier {
	async fn generate_key(&self) -> Result<SecretBytes, StoreError> {
		if self.fail_generate.load(Ordering::SeqCst) {
			return Err(injected("key generation"));
		}
		Ok(random_key())
	}

	async fn verify_master_key(&self, key: &SecretBytes) -> Result<bool, StoreError> {
		let current = self.key.lock().await;
		Ok(bool::from(current.expose().ct_eq(key.expose())))
	}

	async fn install_master_key(&self, key: &SecretBytes) -> Result<(), StoreError> {
		if self.fail_install.load(Ordering::SeqCst) {
			return Err(injected("key install"));
		}
		*self.key.lock().await = key.clone();
		self.installs.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

pub fn random_key() -> SecretBytes {
	let mut key = vec![0u8; TEST_KEY_SIZE];
	OsRng.fill_bytes(&mut key);
	SecretBytes::new(key)
}

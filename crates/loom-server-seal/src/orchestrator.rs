// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The rekey state machine.
//!
//! A rekey replaces the master key and the seal configuration describing how
//! it is split. It is driven by operators who each submit one share of the
//! current key:
//!
//! 1. `init_rekey` validates the target configuration and opens the single
//!    session, returning a nonce that binds submissions to it.
//! 2. `submit_share` accumulates shares of the current key. When the current
//!    threshold is reached the key is reconstructed, checked against the
//!    barrier and a new key is generated, split and (optionally) encrypted for
//!    the configured PGP keys. The new shares are returned exactly once.
//! 3. With verification enabled, the session moves to a second phase with a
//!    fresh nonce. Operators prove they hold the new shares by submitting a
//!    threshold of them through `submit_verification_share`.
//! 4. The new key is installed in the barrier, then the new configuration is
//!    persisted, then the session is destroyed.
//!
//! A failure before installation cancels the session and leaves the old key
//! and configuration in place. A failure to persist the configuration after
//! the key was installed cannot be rolled back; it is surfaced as
//! [`RekeyError::Fatal`] and blocks new sessions until an operator calls
//! [`RekeyOrchestrator::retry_config_persist`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use loom_common_secret::{SecretBytes, SecretString};
use loom_seal_core::{
	encrypt_shares, SealConfig, SealConfigRecord, ShareEncryptor, ValidationError,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use zeroize::Zeroizing;

use crate::error::{CryptoError, PersistenceError, RekeyError, Result, StateError, StoreError};
use crate::nonce::NonceGuard;
use crate::shamir::KeySplitter;
use crate::store::{Barrier, RekeyBackup, SealStore};

/// Default lifetime of a rekey session.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// Public types
// =============================================================================

/// Phases of a rekey operation.
///
/// `ThresholdMet`, `CommitPending` and `VerifiedThresholdMet` are transient
/// and only exist while a single transition holds the session lock.
/// `CommitPending` is also reported while a fatal inconsistency is waiting for
/// [`RekeyOrchestrator::retry_config_persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RekeyPhase {
	Idle,
	Initialized,
	Accumulating,
	ThresholdMet,
	CommitPending,
	VerifyPending,
	Verifying,
	VerifiedThresholdMet,
	Committed,
	Cancelled,
}

impl RekeyPhase {
	pub fn as_str(&self) -> &'static str {
		match self {
			RekeyPhase::Idle => "idle",
			RekeyPhase::Initialized => "initialized",
			RekeyPhase::Accumulating => "accumulating",
			RekeyPhase::ThresholdMet => "threshold_met",
			RekeyPhase::CommitPending => "commit_pending",
			RekeyPhase::VerifyPending => "verify_pending",
			RekeyPhase::Verifying => "verifying",
			RekeyPhase::VerifiedThresholdMet => "verified_threshold_met",
			RekeyPhase::Committed => "committed",
			RekeyPhase::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for RekeyPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RekeySettings {
	pub session_timeout: Duration,
	/// Used when a request does not say whether verification is required.
	pub verification_required_default: bool,
}

impl Default for RekeySettings {
	fn default() -> Self {
		Self {
			session_timeout: DEFAULT_SESSION_TIMEOUT,
			verification_required_default: false,
		}
	}
}

/// Parameters for a new rekey operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RekeyRequest {
	pub secret_shares: i64,
	pub secret_threshold: i64,
	/// Base64-encoded operator public keys, one per new share.
	pub pgp_keys: Vec<String>,
	pub backup: bool,
	pub verification_required: Option<bool>,
}

impl RekeyRequest {
	pub fn new(secret_shares: i64, secret_threshold: i64) -> Self {
		Self {
			secret_shares,
			secret_threshold,
			..Self::default()
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RekeyInitResponse {
	pub nonce: String,
	/// Number of current-key shares needed before the new key is generated.
	pub required_threshold: usize,
	pub shares_submitted: usize,
	pub secret_shares: i64,
	pub secret_threshold: i64,
	pub verification_required: bool,
	pub backup: bool,
	pub pgp_keys: Vec<String>,
}

/// The new key shares, handed out once.
#[derive(Debug, Clone)]
pub struct RekeyResult {
	/// Hex-encoded shares, PGP ciphertext when PGP keys were given.
	pub keys: Vec<SecretString>,
	/// The same shares, base64-encoded.
	pub keys_base64: Vec<SecretString>,
	pub pgp_keys: Vec<String>,
	pub backup: bool,
	pub verification_required: bool,
	/// Nonce for the verification phase, when verification is pending.
	pub verification_nonce: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub struct ShareProgress {
	pub shares_submitted: usize,
	pub required_threshold: usize,
	pub complete: bool,
	pub result: Option<RekeyResult>,
}

/// Snapshot of the rekey state. Never carries nonces or key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RekeyStatus {
	pub state: RekeyPhase,
	pub required_threshold: usize,
	pub shares_submitted: usize,
	pub verification_required: bool,
}

/// Record of a key installation whose configuration could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalReport {
	pub occurred_at: DateTime<Utc>,
	pub reason: String,
	pub secret_shares: i64,
	pub secret_threshold: i64,
}

impl fmt::Display for FatalReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"new master key installed but seal configuration ({} shares, threshold {}) not persisted: {}",
			self.secret_shares, self.secret_threshold, self.reason
		)
	}
}

// =============================================================================
// Session
// =============================================================================

/// The in-flight rekey. Dropping it zeroizes every share and key it holds.
struct RekeySession {
	target: SealConfig,
	nonce: String,
	progress: Vec<SecretBytes>,
	required_threshold: usize,
	verification_required: bool,
	verification_key: Option<SecretBytes>,
	verification_nonce: Option<String>,
	verification_progress: Vec<SecretBytes>,
	/// Set when a backup for this session has been written.
	backup_written: bool,
	started_at: Instant,
}

impl RekeySession {
	fn in_verification(&self) -> bool {
		self.verification_key.is_some()
	}

	fn phase(&self) -> RekeyPhase {
		match (
			self.in_verification(),
			self.progress.is_empty(),
			self.verification_progress.is_empty(),
		) {
			(false, true, _) => RekeyPhase::Initialized,
			(false, false, _) => RekeyPhase::Accumulating,
			(true, _, true) => RekeyPhase::VerifyPending,
			(true, _, false) => RekeyPhase::Verifying,
		}
	}

	/// The nonce that authorizes operations in the current phase.
	fn active_nonce(&self) -> &str {
		match &self.verification_nonce {
			Some(nonce) if self.in_verification() => nonce,
			_ => &self.nonce,
		}
	}

	fn nonces(&self) -> impl Iterator<Item = &str> {
		std::iter::once(self.nonce.as_str()).chain(self.verification_nonce.as_deref())
	}

	fn is_expired(&self, timeout: Duration) -> bool {
		self.started_at.elapsed() >= timeout
	}

	fn status(&self) -> RekeyStatus {
		let (required_threshold, shares_submitted) = if self.in_verification() {
			(self.target.threshold(), self.verification_progress.len())
		} else {
			(self.required_threshold, self.progress.len())
		};
		RekeyStatus {
			state: self.phase(),
			required_threshold,
			shares_submitted,
			verification_required: self.verification_required,
		}
	}
}

fn contains_share(progress: &[SecretBytes], share: &SecretBytes) -> bool {
	progress
		.iter()
		.any(|existing| bool::from(existing.expose().ct_eq(share.expose())))
}

/// A configuration persist that failed after the key was installed.
struct PendingCommit {
	report: FatalReport,
	record: SealConfigRecord,
	result: Option<RekeyResult>,
}

struct RekeyState {
	session: Option<RekeySession>,
	guard: NonceGuard,
	last_outcome: RekeyPhase,
	pending: Option<PendingCommit>,
}

impl RekeyState {
	/// Destroy the session, retiring its nonces.
	fn end_session(&mut self, outcome: RekeyPhase) -> Option<RekeySession> {
		let session = self.session.take()?;
		for nonce in session.nonces() {
			self.guard.retire(nonce);
		}
		self.last_outcome = outcome;
		Some(session)
	}
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Owns the one rekey session and drives it to commit.
pub struct RekeyOrchestrator {
	store: Arc<dyn SealStore>,
	barrier: Arc<dyn Barrier>,
	splitter: Arc<dyn KeySplitter>,
	encryptor: Arc<dyn ShareEncryptor>,
	settings: RekeySettings,
	state: RwLock<RekeyState>,
}

impl RekeyOrchestrator {
	pub fn new(
		store: Arc<dyn SealStore>,
		barrier: Arc<dyn Barrier>,
		splitter: Arc<dyn KeySplitter>,
		encryptor: Arc<dyn ShareEncryptor>,
		settings: RekeySettings,
	) -> Self {
		Self {
			store,
			barrier,
			splitter,
			encryptor,
			settings,
			state: RwLock::new(RekeyState {
				session: None,
				guard: NonceGuard::new(),
				last_outcome: RekeyPhase::Idle,
				pending: None,
			}),
		}
	}

	pub fn settings(&self) -> &RekeySettings {
		&self.settings
	}

	/// Start a rekey operation.
	#[instrument(
		skip(self, request),
		fields(
			secret_shares = request.secret_shares,
			secret_threshold = request.secret_threshold
		)
	)]
	pub async fn init_rekey(&self, request: RekeyRequest) -> Result<RekeyInitResponse> {
		let mut state = self.state.write().await;
		self.expire_locked(&mut state);

		if state.pending.is_some() {
			return Err(StateError::OperatorInterventionRequired.into());
		}
		if state.session.is_some() {
			return Err(StateError::OperationInProgress.into());
		}

		let current = self.load_current_config().await?;

		let target = SealConfig {
			seal_type: current.seal_type,
			secret_shares: request.secret_shares,
			secret_threshold: request.secret_threshold,
			pgp_keys: request.pgp_keys,
			nonce: None,
			backup: request.backup,
			stored_shares: current.stored_shares,
			name: current.name.clone(),
		};
		target.validate_with(self.encryptor.as_ref())?;
		if target.backup && target.pgp_keys.is_empty() {
			return Err(ValidationError::BackupRequiresPgpKeys.into());
		}

		let verification_required = request
			.verification_required
			.unwrap_or(self.settings.verification_required_default);
		let nonce = state.guard.mint();
		let required_threshold = current.threshold();

		let response = RekeyInitResponse {
			nonce: nonce.clone(),
			required_threshold,
			shares_submitted: 0,
			secret_shares: target.secret_shares,
			secret_threshold: target.secret_threshold,
			verification_required,
			backup: target.backup,
			pgp_keys: target.pgp_keys.clone(),
		};

		let mut target = target;
		target.nonce = Some(nonce.clone());
		state.session = Some(RekeySession {
			target,
			nonce,
			progress: Vec::new(),
			required_threshold,
			verification_required,
			verification_key: None,
			verification_nonce: None,
			verification_progress: Vec::new(),
			backup_written: false,
			started_at: Instant::now(),
		});

		info!(
			required_threshold,
			verification_required,
			backup = response.backup,
			"rekey session started"
		);
		Ok(response)
	}

	/// Submit one share of the current master key.
	#[instrument(skip(self, nonce, share))]
	pub async fn submit_share(&self, nonce: &str, share: SecretBytes) -> Result<ShareProgress> {
		let mut state = self.state.write().await;
		self.expire_locked(&mut state);

		let RekeyState { session, guard, .. } = &mut *state;
		guard.ensure_live(nonce)?;
		let session = session.as_mut().ok_or(StateError::NoActiveOperation)?;
		if session.in_verification() {
			return Err(StateError::WrongPhase(session.phase().as_str()).into());
		}
		if let Err(e) = guard.verify(nonce, &session.nonce) {
			warn!("rejected share with mismatched nonce");
			return Err(e.into());
		}
		if contains_share(&session.progress, &share) {
			return Err(StateError::DuplicateShare.into());
		}

		session.progress.push(share);
		let shares_submitted = session.progress.len();
		let required_threshold = session.required_threshold;
		debug!(shares_submitted, required_threshold, "rekey share accepted");

		if shares_submitted < required_threshold {
			return Ok(ShareProgress {
				shares_submitted,
				required_threshold,
				complete: false,
				result: None,
			});
		}

		let result = self.on_threshold_met(&mut state).await?;
		Ok(ShareProgress {
			shares_submitted,
			required_threshold,
			complete: true,
			result: Some(result),
		})
	}

	/// Submit one share of the new master key during verification.
	#[instrument(skip(self, nonce, share))]
	pub async fn submit_verification_share(
		&self,
		nonce: &str,
		share: SecretBytes,
	) -> Result<ShareProgress> {
		let mut state = self.state.write().await;
		self.expire_locked(&mut state);

		let RekeyState { session, guard, .. } = &mut *state;
		guard.ensure_live(nonce)?;
		let session = session.as_mut().ok_or(StateError::NoActiveOperation)?;
		let active = match (&session.verification_nonce, session.in_verification()) {
			(Some(active), true) => active,
			_ => return Err(StateError::WrongPhase(session.phase().as_str()).into()),
		};
		if let Err(e) = guard.verify(nonce, active) {
			warn!("rejected verification share with mismatched nonce");
			return Err(e.into());
		}
		if contains_share(&session.verification_progress, &share) {
			return Err(StateError::DuplicateShare.into());
		}

		session.verification_progress.push(share);
		let shares_submitted = session.verification_progress.len();
		let required_threshold = session.target.threshold();
		debug!(shares_submitted, required_threshold, "verification share accepted");

		if shares_submitted < required_threshold {
			return Ok(ShareProgress {
				shares_submitted,
				required_threshold,
				complete: false,
				result: None,
			});
		}

		let shares = std::mem::take(&mut session.verification_progress);
		let recombined = match self.splitter.combine(&shares) {
			Ok(key) => key,
			Err(e) => {
				warn!(error = %e, "verification shares could not be combined");
				return Err(e.into());
			}
		};
		let matches = session
			.verification_key
			.as_ref()
			.map(|expected| bool::from(expected.expose().ct_eq(recombined.expose())))
			.unwrap_or(false);
		if !matches {
			warn!("verification shares do not match the new master key");
			return Err(CryptoError::VerificationMismatch.into());
		}
		debug!(phase = %RekeyPhase::VerifiedThresholdMet, "verification complete");

		let key = session
			.verification_key
			.take()
			.ok_or(CryptoError::VerificationMismatch)?;
		self.commit(&mut state, key, None).await?;

		Ok(ShareProgress {
			shares_submitted,
			required_threshold,
			complete: true,
			result: None,
		})
	}

	/// Cancel the rekey. `nonce` must be the token of the current phase.
	#[instrument(skip(self, nonce))]
	pub async fn cancel_rekey(&self, nonce: &str) -> Result<()> {
		let mut state = self.state.write().await;
		self.expire_locked(&mut state);

		state.guard.ensure_live(nonce)?;
		let session = state.session.as_ref().ok_or(StateError::NoActiveOperation)?;
		state.guard.verify(nonce, session.active_nonce())?;

		state.end_session(RekeyPhase::Cancelled);
		info!("rekey session cancelled");
		Ok(())
	}

	/// Current state of the rekey protocol.
	pub async fn status(&self) -> RekeyStatus {
		let state = self.state.read().await;
		if let Some(session) = state
			.session
			.as_ref()
			.filter(|s| !s.is_expired(self.settings.session_timeout))
		{
			return session.status();
		}

		let phase = match (&state.pending, &state.session) {
			(Some(_), _) => RekeyPhase::CommitPending,
			(None, Some(_)) => RekeyPhase::Cancelled,
			(None, None) => state.last_outcome,
		};
		RekeyStatus {
			state: phase,
			required_threshold: 0,
			shares_submitted: 0,
			verification_required: false,
		}
	}

	/// The persisted seal configuration, without its nonce.
	pub async fn seal_config(&self) -> Result<SealConfigRecord> {
		let record = self
			.store
			.load_seal_config()
			.await
			.map_err(PersistenceError::Storage)?
			.ok_or(StateError::NotInitialized)?;
		Ok(record.without_nonce())
	}

	pub async fn rekey_backup(&self) -> Result<Option<RekeyBackup>> {
		Ok(self
			.store
			.load_rekey_backup()
			.await
			.map_err(PersistenceError::Storage)?)
	}

	#[instrument(skip(self))]
	pub async fn delete_rekey_backup(&self) -> Result<()> {
		self
			.store
			.delete_rekey_backup()
			.await
			.map_err(PersistenceError::Storage)?;
		info!("rekey backup deleted");
		Ok(())
	}

	/// The outstanding fatal inconsistency, if any.
	pub async fn fatal_inconsistency(&self) -> Option<FatalReport> {
		let state = self.state.read().await;
		state.pending.as_ref().map(|p| p.report.clone())
	}

	/// Retry persisting the configuration of an installed key.
	///
	/// Makes exactly one attempt. On success the inconsistency is cleared and
	/// any new shares that could not be handed out are returned.
	#[instrument(skip(self))]
	pub async fn retry_config_persist(&self) -> Result<Option<RekeyResult>> {
		let mut state = self.state.write().await;
		let pending = state.pending.as_ref().ok_or(StateError::NoActiveOperation)?;

		if let Err(e) = self.store.store_seal_config(&pending.record).await {
			error!(error = %e, "retry of seal configuration persist failed");
			return Err(PersistenceError::Storage(e).into());
		}

		let pending = state.pending.take();
		state.last_outcome = RekeyPhase::Committed;
		info!("seal configuration persisted after operator retry");
		Ok(pending.and_then(|p| p.result))
	}

	/// Cancel the session if it has outlived the configured timeout.
	///
	/// Returns true when a session was expired.
	pub async fn expire_stale_session(&self) -> bool {
		let mut state = self.state.write().await;
		self.expire_locked(&mut state)
	}

	// -------------------------------------------------------------------------
	// Internals
	// -------------------------------------------------------------------------

	fn expire_locked(&self, state: &mut RekeyState) -> bool {
		let expired = state
			.session
			.as_ref()
			.is_some_and(|s| s.is_expired(self.settings.session_timeout));
		if expired {
			state.end_session(RekeyPhase::Cancelled);
			warn!(
				timeout_secs = self.settings.session_timeout.as_secs(),
				"rekey session expired"
			);
		}
		expired
	}

	async fn load_current_config(&self) -> Result<SealConfig> {
		let record = self
			.store
			.load_seal_config()
			.await
			.map_err(PersistenceError::Storage)?
			.ok_or(StateError::NotInitialized)?;
		record
			.into_config()
			.map_err(|e| PersistenceError::Storage(StoreError::from(e)).into())
	}

	/// Reconstruct the current key, generate and split the new one.
	async fn on_threshold_met(&self, state: &mut RekeyState) -> Result<RekeyResult> {
		let Some(session) = state.session.as_mut() else {
			return Err(StateError::NoActiveOperation.into());
		};
		debug!(phase = %RekeyPhase::ThresholdMet, "rekey threshold reached");

		let shares = std::mem::take(&mut session.progress);
		let current = match self.splitter.combine(&shares) {
			Ok(key) => key,
			Err(e) => {
				warn!(error = %e, "rekey shares could not be combined");
				return Err(e.into());
			}
		};
		match self.barrier.verify_master_key(&current).await {
			Ok(true) => {}
			Ok(false) => {
				warn!("rekey shares do not reconstruct the current master key");
				return Err(CryptoError::KeyVerification.into());
			}
			Err(e) => return Err(PersistenceError::Barrier(e).into()),
		}
		drop(current);

		let new_key = match self.barrier.generate_key().await {
			Ok(key) => key,
			Err(e) => {
				let err = CryptoError::KeyGeneration(e.to_string()).into();
				return Err(self.abort(state, err).await);
			}
		};

		let result = match self.prepare_shares(state, &new_key).await {
			Ok(result) => result,
			Err(e) => return Err(self.abort(state, e).await),
		};

		let Some(session) = state.session.as_mut() else {
			return Err(StateError::NoActiveOperation.into());
		};
		if session.verification_required {
			let verification_nonce = state.guard.mint();
			state.guard.retire(&session.nonce);
			session.verification_key = Some(new_key);
			session.verification_nonce = Some(verification_nonce.clone());
			session.verification_progress.clear();
			info!("rekey awaiting verification of new shares");
			return Ok(RekeyResult {
				verification_nonce: Some(SecretString::new(verification_nonce)),
				..result
			});
		}

		self.commit(state, new_key, Some(result.clone())).await?;
		Ok(result)
	}

	/// Split the new key, encrypt the shares and write the backup.
	async fn prepare_shares(
		&self,
		state: &mut RekeyState,
		new_key: &SecretBytes,
	) -> Result<RekeyResult> {
		let Some(session) = state.session.as_mut() else {
			return Err(StateError::NoActiveOperation.into());
		};
		let target = session.target.clone();

		let raw = self
			.splitter
			.split(new_key.expose(), target.share_count(), target.threshold())?;

		let encoded: Zeroizing<Vec<Vec<u8>>> = if target.pgp_keys.is_empty() {
			Zeroizing::new(raw.iter().map(|share| share.expose().clone()).collect())
		} else {
			let keys = target.decoded_pgp_keys()?;
			let plain: Vec<&[u8]> = raw.iter().map(|share| share.expose().as_slice()).collect();
			Zeroizing::new(
				encrypt_shares(self.encryptor.as_ref(), &plain, &keys).map_err(CryptoError::from)?,
			)
		};
		drop(raw);

		if target.backup {
			let backup = RekeyBackup {
				nonce: session.nonce.clone(),
				pgp_keys: target.pgp_keys.clone(),
				encrypted_shares: encoded.iter().map(hex::encode).collect(),
			};
			self
				.store
				.store_rekey_backup(&backup)
				.await
				.map_err(PersistenceError::Storage)?;
			session.backup_written = true;
			info!(shares = backup.encrypted_shares.len(), "rekey backup stored");
		}

		Ok(RekeyResult {
			keys: encoded
				.iter()
				.map(|s| SecretString::new(hex::encode(s)))
				.collect(),
			keys_base64: encoded
				.iter()
				.map(|s| SecretString::new(BASE64.encode(s)))
				.collect(),
			pgp_keys: target.pgp_keys,
			backup: target.backup,
			verification_required: session.verification_required,
			verification_nonce: None,
		})
	}

	/// Install the key, persist the configuration, destroy the session.
	async fn commit(
		&self,
		state: &mut RekeyState,
		key: SecretBytes,
		result: Option<RekeyResult>,
	) -> Result<()> {
		let Some(session) = state.session.as_ref() else {
			return Err(StateError::NoActiveOperation.into());
		};
		debug!(phase = %RekeyPhase::CommitPending, "committing rekey");
		let record = SealConfigRecord::from(&session.target.without_nonce());

		if let Err(e) = self.barrier.install_master_key(&key).await {
			return Err(self.abort(state, PersistenceError::Barrier(e).into()).await);
		}
		drop(key);

		if let Err(e) = self.store.store_seal_config(&record).await {
			let report = FatalReport {
				occurred_at: Utc::now(),
				reason: e.to_string(),
				secret_shares: record.secret_shares,
				secret_threshold: record.secret_threshold,
			};
			error!(
				error = %e,
				secret_shares = record.secret_shares,
				secret_threshold = record.secret_threshold,
				"master key installed but seal configuration could not be persisted; operator intervention required"
			);
			state.end_session(RekeyPhase::CommitPending);
			state.pending = Some(PendingCommit {
				report: report.clone(),
				record,
				result,
			});
			return Err(RekeyError::Fatal(report));
		}

		state.end_session(RekeyPhase::Committed);
		info!(
			secret_shares = record.secret_shares,
			secret_threshold = record.secret_threshold,
			"rekey committed"
		);
		Ok(())
	}

	/// Cancel the session after a failure before key installation.
	async fn abort(&self, state: &mut RekeyState, err: RekeyError) -> RekeyError {
		warn!(error = %err, "rekey aborted before key installation");
		if let Some(session) = state.end_session(RekeyPhase::Cancelled) {
			if session.backup_written {
				if let Err(e) = self.store.delete_rekey_backup().await {
					warn!(error = %e, "failed to remove backup of aborted rekey");
				}
			}
		}
		err
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rekey orchestration for the Loom master key.
//!
//! This crate drives the quorum-gated replacement of the master key:
//!
//! - [`RekeyOrchestrator`]: the single-session state machine
//! - [`NonceGuard`]: capability tokens binding submissions to one session
//! - [`KeySplitter`] / [`SharksSplitter`]: Shamir split and combine
//! - [`SealStore`] / [`Barrier`]: the storage contracts it depends on, with a
//!   SQLite store in [`sqlite`] and in-memory doubles in [`testing`]
//! - [`spawn_session_reaper`]: background expiry of abandoned sessions
//! - [`SealService`]: the above assembled from [`loom_server_config::ServerConfig`]

pub mod error;
pub mod nonce;
pub mod orchestrator;
pub mod reaper;
pub mod service;
pub mod shamir;
pub mod sqlite;
pub mod store;
pub mod testing;

pub use error::{
	CryptoError, PersistenceError, RekeyError, Result, SecurityError, ServiceError, StateError,
	StoreError,
};
pub use nonce::NonceGuard;
pub use orchestrator::{
	FatalReport, RekeyInitResponse, RekeyOrchestrator, RekeyPhase, RekeyRequest, RekeyResult,
	RekeySettings, RekeyStatus, ShareProgress, DEFAULT_SESSION_TIMEOUT,
};
pub use reaper::spawn_session_reaper;
pub use service::{init_tracing, SealService};
pub use shamir::{KeySplitter, SharksSplitter};
pub use sqlite::{create_pool, SqliteSealStore};
pub use store::{Barrier, RekeyBackup, SealStore};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembly of the rekey service from resolved server configuration.

use std::sync::Arc;

use loom_seal_core::PgpShareEncryptor;
use loom_server_config::{LoggingConfig, RekeyConfig, ServerConfig};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::ServiceError;
use crate::orchestrator::{RekeyOrchestrator, RekeySettings};
use crate::reaper::spawn_session_reaper;
use crate::shamir::SharksSplitter;
use crate::sqlite::{create_pool, SqliteSealStore};
use crate::store::{Barrier, SealStore};

impl From<&RekeyConfig> for RekeySettings {
	fn from(config: &RekeyConfig) -> Self {
		Self {
			session_timeout: config.session_timeout(),
			verification_required_default: config.verification_required_default,
		}
	}
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes priority over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ServiceError> {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.level.clone().into());

	tracing_subscriber::registry()
		.with(filter)
		.with(config.json.then(|| tracing_subscriber::fmt::layer().json()))
		.with((!config.json).then(tracing_subscriber::fmt::layer))
		.try_init()
		.map_err(|e| ServiceError::Tracing(e.to_string()))
}

/// A running rekey orchestrator together with its session reaper.
pub struct SealService {
	orchestrator: Arc<RekeyOrchestrator>,
	shutdown_tx: broadcast::Sender<()>,
	reaper: JoinHandle<()>,
}

impl SealService {
	/// Open the configured SQLite database and start the service on it.
	#[tracing::instrument(skip_all, fields(database = %config.database.url))]
	pub async fn start(
		config: &ServerConfig,
		barrier: Arc<dyn Barrier>,
	) -> Result<Self, ServiceError> {
		let pool = create_pool(&config.database.url).await?;
		let store = SqliteSealStore::new(pool);
		store.ensure_schema().await?;
		Ok(Self::with_store(&config.rekey, Arc::new(store), barrier))
	}

	/// Start the service on an existing store.
	///
	/// Must be called from within a tokio runtime.
	pub fn with_store(
		config: &RekeyConfig,
		store: Arc<dyn SealStore>,
		barrier: Arc<dyn Barrier>,
	) -> Self {
		let orchestrator = Arc::new(RekeyOrchestrator::new(
			store,
			barrier,
			Arc::new(SharksSplitter),
			Arc::new(PgpShareEncryptor),
			RekeySettings::from(config),
		));

		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
		let reaper = spawn_session_reaper(
			Arc::clone(&orchestrator),
			config.reaper_interval(),
			shutdown_rx,
		);

		info!(
			session_timeout_secs = config.session_timeout_secs,
			reaper_interval_secs = config.reaper_interval_secs,
			"seal service started"
		);

		Self {
			orchestrator,
			shutdown_tx,
			reaper,
		}
	}

	pub fn orchestrator(&self) -> Arc<RekeyOrchestrator> {
		Arc::clone(&self.orchestrator)
	}

	/// Stop the reaper and wait for it to exit.
	pub async fn shutdown(self) {
		let _ = self.shutdown_tx.send(());
		if let Err(e) = self.reaper.await {
			tracing::warn!(error = %e, "session reaper task failed");
		}
		info!("seal service stopped");
	}
}

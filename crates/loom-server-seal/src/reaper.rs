// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic expiry of abandoned rekey sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::orchestrator::RekeyOrchestrator;

/// Spawn a task that expires stale rekey sessions every `interval` until a
/// message arrives on `shutdown`.
pub fn spawn_session_reaper(
	orchestrator: Arc<RekeyOrchestrator>,
	interval: Duration,
	mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		info!(interval_secs = interval.as_secs(), "rekey session reaper started");
		loop {
			tokio::select! {
				_ = tokio::time::sleep(interval) => {
					if orchestrator.expire_stale_session().await {
						debug!("reaper expired a rekey session");
					}
				}
				_ = shutdown.recv() => {
					info!("rekey session reaper shutting down");
					break;
				}
			}
		}
	})
}

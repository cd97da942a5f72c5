// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite implementation of [`SealStore`].
//!
//! Both the seal configuration and the rekey backup are singletons, stored as
//! JSON in single-row tables.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use loom_seal_core::SealConfigRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use sqlx::Row;

use crate::error::StoreError;
use crate::store::{RekeyBackup, SealStore};

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./loom.db")
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StoreError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| StoreError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

#[derive(Clone)]
pub struct SqliteSealStore {
	pool: SqlitePool,
}

impl SqliteSealStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the seal tables if they do not already exist.
	#[tracing::instrument(skip(self))]
	pub async fn ensure_schema(&self) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS seal_config (
				id INTEGER PRIMARY KEY CHECK (id = 1),
				record TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
		)
		.execute(&self.pool)
		.await?;

		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS rekey_backup (
				id INTEGER PRIMARY KEY CHECK (id = 1),
				backup TEXT NOT NULL,
				created_at TEXT NOT NULL
			)
			"#,
		)
		.execute(&self.pool)
		.await?;

		Ok(())
	}
}

#[async_trait]
impl SealStore for SqliteSealStore {
	#[tracing::instrument(skip(self))]
	async fn load_seal_config(&self) -> Result<Option<SealConfigRecord>, StoreError> {
		let row = sqlx::query("SELECT record FROM seal_config WHERE id = 1")
			.fetch_optional(&self.pool)
			.await?;

		row
			.map(|row| {
				let json: String = row.get("record");
				serde_json::from_str(&json).map_err(StoreError::from)
			})
			.transpose()
	}

	#[tracing::instrument(skip(self, record), fields(seal_type = %record.seal_type))]
	async fn store_seal_config(&self, record: &SealConfigRecord) -> Result<(), StoreError> {
		let json = serde_json::to_string(record)?;
		sqlx::query(
			r#"
			INSERT INTO seal_config (id, record, updated_at)
			VALUES (1, ?, ?)
			ON CONFLICT(id) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at
			"#,
		)
		.bind(json)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, backup), fields(shares = backup.encrypted_shares.len()))]
	async fn store_rekey_backup(&self, backup: &RekeyBackup) -> Result<(), StoreError> {
		let json = serde_json::to_string(backup)?;
		sqlx::query(
			r#"
			INSERT INTO rekey_backup (id, backup, created_at)
			VALUES (1, ?, ?)
			ON CONFLICT(id) DO UPDATE SET backup = excluded.backup, created_at = excluded.created_at
			"#,
		)
		.bind(json)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	async fn load_rekey_backup(&self) -> Result<Option<RekeyBackup>, StoreError> {
		let row = sqlx::query("SELECT backup FROM rekey_backup WHERE id = 1")
			.fetch_optional(&self.pool)
			.await?;

		row
			.map(|row| {
				let json: String = row.get("backup");
				serde_json::from_str(&json).map_err(StoreError::from)
			})
			.transpose()
	}

	#[tracing::instrument(skip(self))]
	async fn delete_rekey_backup(&self) -> Result<(), StoreError> {
		sqlx::query("DELETE FROM rekey_backup WHERE id = 1")
			.execute(&self.pool)
			.await?;
		Ok(())
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Root credentials and their rotation settings.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{Result, RotationError};
use crate::schedule::{ParsedSchedule, ScheduleParser};

/// When a root credential rotates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSchedule {
	/// Parsed form of `rotation_schedule`; `None` when no schedule is set.
	pub schedule: Option<ParsedSchedule>,
	pub rotation_schedule: String,
	/// How long after a scheduled occurrence the rotation may still run.
	pub rotation_window: Duration,
	pub ttl: Duration,
	pub next_rotation: Option<DateTime<Utc>>,
	pub last_rotation: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOptions {
	pub schedule: RootSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCredential {
	pub rotation: RotationOptions,
	/// Assigned by the server once the credential is registered.
	pub rotation_id: Option<String>,
	pub path: String,
	pub name: String,
}

impl RootCredential {
	/// Build a credential from raw rotation settings.
	///
	/// The schedule is only parsed when `rotation_schedule` is non-empty.
	/// Next and last rotation are left unset for the caller to fill in.
	pub fn new(
		rotation_schedule: &str,
		path: impl Into<String>,
		name: impl Into<String>,
		rotation_window_secs: i64,
		ttl_secs: i64,
		parser: &dyn ScheduleParser,
	) -> Result<Self> {
		let schedule = if rotation_schedule.is_empty() {
			None
		} else {
			Some(parser.parse(rotation_schedule)?)
		};

		let credential = Self {
			rotation: RotationOptions {
				schedule: RootSchedule {
					schedule,
					rotation_schedule: rotation_schedule.to_string(),
					rotation_window: seconds("rotation_window", rotation_window_secs)?,
					ttl: seconds("ttl", ttl_secs)?,
					next_rotation: None,
					last_rotation: None,
				},
			},
			rotation_id: None,
			path: path.into(),
			name: name.into(),
		};

		debug!(
			path = %credential.path,
			name = %credential.name,
			scheduled = credential.rotation.schedule.schedule.is_some(),
			"root credential built"
		);
		Ok(credential)
	}

	pub fn schedule(&self) -> &RootSchedule {
		&self.rotation.schedule
	}

	/// Check that the rotation settings are coherent.
	pub fn validate(&self) -> Result<()> {
		let schedule = self.schedule();
		if schedule.rotation_window < Duration::zero() {
			return Err(RotationError::NegativeDuration {
				field: "rotation_window",
			});
		}
		if schedule.ttl < Duration::zero() {
			return Err(RotationError::NegativeDuration { field: "ttl" });
		}

		let scheduled = !schedule.rotation_schedule.is_empty();
		if scheduled && !schedule.ttl.is_zero() {
			return Err(RotationError::ScheduleAndTtl);
		}
		if !scheduled && !schedule.rotation_window.is_zero() {
			return Err(RotationError::WindowWithoutSchedule);
		}
		Ok(())
	}

	/// The next time the credential should rotate after `after`.
	pub fn next_rotation_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
		let schedule = self.schedule();
		match &schedule.schedule {
			Some(parsed) => parsed.next_after(after),
			None if schedule.ttl > Duration::zero() => after.checked_add_signed(schedule.ttl),
			None => None,
		}
	}
}

fn seconds(field: &'static str, secs: i64) -> Result<Duration> {
	Duration::try_seconds(secs).ok_or(RotationError::DurationOutOfRange { field })
}

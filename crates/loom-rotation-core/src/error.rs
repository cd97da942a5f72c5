// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotationError {
	#[error("invalid rotation schedule '{expression}': {message}")]
	InvalidSchedule { expression: String, message: String },

	#[error("{field} must not be negative")]
	NegativeDuration { field: &'static str },

	#[error("{field} is out of range")]
	DurationOutOfRange { field: &'static str },

	#[error("rotation_schedule and ttl are mutually exclusive")]
	ScheduleAndTtl,

	#[error("rotation_window requires a rotation_schedule")]
	WindowWithoutSchedule,
}

pub type Result<T> = std::result::Result<T, RotationError>;

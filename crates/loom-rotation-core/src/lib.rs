// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Root credential rotation settings.
//!
//! A root credential rotates either on a cron schedule (optionally within a
//! window after each occurrence) or after a fixed TTL, never both.

pub mod credential;
pub mod error;
pub mod schedule;

pub use credential::{RootCredential, RootSchedule, RotationOptions};
pub use error::{Result, RotationError};
pub use schedule::{CronScheduleParser, ParsedSchedule, ScheduleParser};

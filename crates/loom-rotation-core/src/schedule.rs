// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parsing of rotation schedule expressions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::{Result, RotationError};

/// A parsed rotation schedule.
#[derive(Clone)]
pub struct ParsedSchedule {
	expression: String,
	schedule: Schedule,
}

impl ParsedSchedule {
	/// The expression as written by the operator.
	pub fn expression(&self) -> &str {
		&self.expression
	}

	/// First occurrence strictly after `after`.
	pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
		self.schedule.after(&after).next()
	}
}

impl fmt::Debug for ParsedSchedule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ParsedSchedule")
			.field("expression", &self.expression)
			.finish()
	}
}

impl PartialEq for ParsedSchedule {
	fn eq(&self, other: &Self) -> bool {
		self.expression == other.expression
	}
}

impl Eq for ParsedSchedule {}

/// Turns rotation schedule expressions into [`ParsedSchedule`]s.
pub trait ScheduleParser: Send + Sync {
	fn parse(&self, expression: &str) -> Result<ParsedSchedule>;
}

/// Parser for cron expressions.
///
/// Accepts standard 5-field Unix expressions as well as the 6 and 7 field
/// forms (with seconds, and year) and `@daily`-style shorthands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CronScheduleParser;

impl ScheduleParser for CronScheduleParser {
	fn parse(&self, expression: &str) -> Result<ParsedSchedule> {
		let schedule = Schedule::from_str(&to_cron_crate_format(expression)).map_err(|e| {
			RotationError::InvalidSchedule {
				expression: expression.to_string(),
				message: e.to_string(),
			}
		})?;
		Ok(ParsedSchedule {
			expression: expression.to_string(),
			schedule,
		})
	}
}

/// 5-field format: minute hour day-of-month month day-of-week
/// 7-field format: second minute hour day-of-month month day-of-week year
fn to_cron_crate_format(expression: &str) -> String {
	if expression.split_whitespace().count() == 5 {
		format!("0 {} *", expression.trim())
	} else {
		expression.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Timelike};
	use proptest::prelude::*;

	#[test]
	fn test_five_field_daily() {
		let schedule = CronScheduleParser.parse("0 3 * * *").unwrap();
		let after = Utc.with_ymd_and_hms(2026, 1, 19, 10, 30, 0).unwrap();
		let next = schedule.next_after(after).unwrap();
		assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 20, 3, 0, 0).unwrap());
	}

	#[test]
	fn test_six_field_passes_through() {
		let schedule = CronScheduleParser.parse("30 */15 * * * *").unwrap();
		let after = Utc.with_ymd_and_hms(2026, 1, 19, 10, 32, 0).unwrap();
		let next = schedule.next_after(after).unwrap();
		assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 19, 10, 45, 30).unwrap());
	}

	#[test]
	fn test_expression_is_kept_as_written() {
		let schedule = CronScheduleParser.parse("0 0 * * 1").unwrap();
		assert_eq!(schedule.expression(), "0 0 * * 1");
	}

	#[test]
	fn test_invalid_expressions() {
		for expression in ["invalid", "60 0 * * *", "* * * *"] {
			match CronScheduleParser.parse(expression) {
				Err(RotationError::InvalidSchedule { expression: got, .. }) => {
					assert_eq!(got, expression)
				}
				other => panic!("{expression}: expected InvalidSchedule, got {other:?}"),
			}
		}
	}

	proptest! {
		#[test]
		fn daily_schedule_lands_on_its_minute(minute in 0u32..60, hour in 0u32..24, offset in 0i64..86_400) {
			let schedule = CronScheduleParser.parse(&format!("{minute} {hour} * * *")).unwrap();
			let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
			let after = start + chrono::Duration::seconds(offset);
			let next = schedule.next_after(after).unwrap();
			prop_assert!(next > after);
			prop_assert!(next - after <= chrono::Duration::days(1));
			prop_assert_eq!((next.hour(), next.minute(), next.second()), (hour, minute, 0));
		}
	}
}

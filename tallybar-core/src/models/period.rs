//! Billing periods.
//!
//! A [`Period`] is one calendar month in UTC. Premium-request allowances
//! reset at 00:00:00 UTC on the first day of each month.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;

/// Shown instead of a countdown once the reset instant has passed.
pub const RESETS_SOON: &str = "Resets soon";

/// Earliest supported year.
const MIN_YEAR: i32 = 1970;

/// Latest supported year. One below chrono's comfortable range so that
/// `next_reset` of December always exists.
const MAX_YEAR: i32 = 9998;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

// ============================================================================
// Period
// ============================================================================

/// One calendar-month billing cycle in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PeriodRepr")]
pub struct Period {
    year: i32,
    month: u32,
}

/// Unvalidated wire form of [`Period`].
#[derive(Deserialize)]
struct PeriodRepr {
    year: i32,
    month: u32,
}

impl TryFrom<PeriodRepr> for Period {
    type Error = CoreError;

    fn try_from(repr: PeriodRepr) -> Result<Self, Self::Error> {
        Period::new(repr.year, repr.month)
    }
}

impl Period {
    /// Creates a period, rejecting months outside 1-12.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPeriod` if `month` is not in `1..=12` or
    /// `year` is outside the supported range.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidPeriod(format!(
                "month {month} out of range [1, 12]"
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CoreError::InvalidPeriod(format!(
                "year {year} out of range [{MIN_YEAR}, {MAX_YEAR}]"
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing `instant`.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year().clamp(MIN_YEAR, MAX_YEAR),
            month: instant.month(),
        }
    }

    /// The current period according to `clock`.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::containing(clock.now())
    }

    /// The current period according to the system clock.
    pub fn current_utc() -> Self {
        Self::current(&SystemClock)
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following period, wrapping December into January.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First instant of this period.
    pub fn start(&self) -> DateTime<Utc> {
        first_instant(self.year, self.month)
    }

    /// First instant of the following period: when the allowance resets.
    pub fn next_reset(&self) -> DateTime<Utc> {
        self.next().start()
    }

    /// Returns true if `instant` falls within this period.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.next_reset()
    }

    /// Human-readable countdown to the next reset. See [`reset_countdown`].
    pub fn reset_countdown(&self, now: DateTime<Utc>) -> String {
        reset_countdown(*self, now)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start().format("%b %Y"))
    }
}

/// Midnight UTC on the first of `month`. Both arguments are validated by
/// [`Period::new`], so the fallback is unreachable in practice.
fn first_instant(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MAX_UTC, |naive| naive.and_utc())
}

// ============================================================================
// Countdown
// ============================================================================

/// Formats the time left until `period` resets.
///
/// - `now >= next_reset`: [`RESETS_SOON`]
/// - more than a day left: `"Resets in 3d 4h"`
/// - less than a day left: `"Resets in 5h 12m"`
///
/// Units are truncated, never rounded up.
pub fn reset_countdown(period: Period, now: DateTime<Utc>) -> String {
    let remaining = period.next_reset() - now;
    if remaining <= chrono::TimeDelta::zero() {
        return RESETS_SOON.to_string();
    }

    let total = remaining.num_seconds();
    let days = total / SECS_PER_DAY;
    let hours = (total % SECS_PER_DAY) / SECS_PER_HOUR;

    if days > 0 {
        format!("Resets in {days}d {hours}h")
    } else {
        let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
        format!("Resets in {hours}h {minutes}m")
    }
}

// ============================================================================
// Tests
// ============================================================================

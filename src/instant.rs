// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Scale-independent instant.
//!
//! [`Instant`] is the core type of the time module. It identifies one point
//! of physical time; the [`TimeScale`] used to build it only affects how the
//! point is *rendered* as calendar fields, never which point it is.
//!
//! # Representation and precision
//!
//! An instant stores a whole number of seconds (`i64`) plus a fractional
//! second (`f64` in `[0, 1)`) elapsed since 2000-01-01T12:00:00 TAI. The
//! difference of two instants subtracts the integer parts exactly and only
//! then adds the difference of the fractions, so
//! [`duration_from`](Instant::duration_from) keeps ~1e-15 s resolution even
//! for instants decades away from the reference epoch. Shifting by `dt`
//! seconds loses at most one ULP of `dt`'s fractional part.
//!
//! The axis is bounded by [`Instant::MIN`] and [`Instant::MAX`].
//! [`shifted_by`](Instant::shifted_by) saturates at those bounds;
//! [`checked_shifted_by`](Instant::checked_shifted_by) reports them.
//!
//! Leap seconds follow a clock-reset model: physical time flows continuously
//! and the UTC calendar reading jumps back by the step size at the reset
//! instant. A calendar label inside the repeated second that follows a
//! reset therefore names two instants; [`Instant::from_calendar`] resolves
//! it to the later (post-leap) one.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use qtty::Seconds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CalendarField, KernelError, Result};
use crate::scales::{TimeScale, TAI, UTC};

pub(crate) const SECONDS_PER_DAY: i64 = 86_400;

/// `NaiveDate::num_days_from_ce` of 2000-01-01.
const J2000_DAY_FROM_CE: i32 = 730_120;

/// Seconds between 2000-01-01T00:00:00 and the noon reference of the same day.
const NOON_OFFSET: i64 = 43_200;

// ═══════════════════════════════════════════════════════════════════════════
// Instant
// ═══════════════════════════════════════════════════════════════════════════

/// A point in physical time, independent of any time scale.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instant {
    /// Whole seconds since 2000-01-01T12:00:00 TAI.
    epoch: i64,
    /// Fraction of second in `[0, 1)`.
    offset: f64,
}

impl Instant {
    /// The internal origin: 2000-01-01T12:00:00 TAI.
    pub const TAI_REFERENCE: Self = Self {
        epoch: 0,
        offset: 0.0,
    };

    /// J2000.0 epoch: 2000-01-01T12:00:00 TT (11:59:27.816 TAI).
    pub const J2000_EPOCH: Self = Self {
        epoch: -33,
        offset: 0.816,
    };

    /// Earliest representable instant.
    pub const MIN: Self = Self {
        epoch: i64::MIN,
        offset: 0.0,
    };

    /// Latest whole second of the representable range.
    pub const MAX: Self = Self {
        epoch: i64::MAX,
        offset: 0.0,
    };

    // ── constructors ──────────────────────────────────────────────────

    /// Build from whole seconds and an arbitrary (finite) fractional part,
    /// normalising the fraction into `[0, 1)`.
    ///
    /// Saturates at [`Instant::MIN`] / [`Instant::MAX`].
    pub(crate) fn from_parts(epoch: i64, offset: f64) -> Self {
        Self::checked_from_parts(epoch, offset)
            .unwrap_or(if epoch < 0 { Self::MIN } else { Self::MAX })
    }

    fn checked_from_parts(epoch: i64, offset: f64) -> Option<Self> {
        if !offset.is_finite() {
            return None;
        }
        let whole = offset.floor();
        let mut epoch = epoch.checked_add(whole_seconds(whole)?)?;
        let mut offset = offset - whole;
        if offset >= 1.0 {
            // `offset - floor(offset)` can round up to exactly 1.0 for tiny
            // negative inputs.
            offset -= 1.0;
            epoch = epoch.checked_add(1)?;
        }
        Some(Self {
            epoch,
            // `+ 0.0` folds a negative zero into positive zero.
            offset: offset + 0.0,
        })
    }

    /// Build the instant whose TAI reading is `seconds` past 2000-01-01T12:00:00 TAI.
    pub fn from_tai_seconds(seconds: Seconds) -> Self {
        Self::TAI_REFERENCE.shifted_by(seconds)
    }

    /// Build an instant from calendar components read on `scale`.
    ///
    /// `second` may carry a fraction; it must lie in `[0, 60)` because leap
    /// seconds are modelled as clock resets rather than as a 61st second.
    ///
    /// # Errors
    /// [`KernelError::InvalidCalendarField`] when a component is out of range
    /// or the date does not exist in the proleptic Gregorian calendar.
    pub fn from_calendar<S: TimeScale>(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
        scale: &S,
    ) -> Result<Self> {
        let reading = CalendarDateTime::new(year, month, day, hour, minute, second)?.reading();
        Ok(reading.shifted_by(scale.offset_to_reference(&reading)))
    }

    /// Build an instant from an already-validated calendar value.
    pub fn from_calendar_date_time<S: TimeScale>(value: &CalendarDateTime, scale: &S) -> Self {
        let reading = value.reading();
        reading.shifted_by(scale.offset_to_reference(&reading))
    }

    // ── accessors ─────────────────────────────────────────────────────

    /// Seconds elapsed since 2000-01-01T12:00:00 TAI.
    ///
    /// The single `f64` loses resolution far from the epoch; use
    /// [`duration_from`](Self::duration_from) for precise differences.
    pub fn tai_seconds(&self) -> Seconds {
        Seconds::new(self.epoch as f64 + self.offset)
    }

    /// Seconds elapsed since the noon reference of 2000-01-01, read on `scale`.
    pub(crate) fn scale_seconds<S: TimeScale>(&self, scale: &S) -> f64 {
        let reading = self.shifted_by(scale.offset_from_reference(self));
        reading.epoch as f64 + reading.offset
    }

    // ── arithmetic ────────────────────────────────────────────────────

    /// The instant `dt` seconds later (earlier for negative `dt`).
    ///
    /// Shifts past either end of the axis, infinite ones included, saturate
    /// at [`Instant::MIN`] or [`Instant::MAX`]. A NaN shift returns `self`.
    pub fn shifted_by(&self, dt: Seconds) -> Self {
        let value = dt.value();
        if value.is_nan() {
            return *self;
        }
        self.checked_shifted_by(dt)
            .unwrap_or(if value < 0.0 { Self::MIN } else { Self::MAX })
    }

    /// The instant `dt` seconds later, or `None` if `dt` is not finite or
    /// the result falls outside the representable range.
    pub fn checked_shifted_by(&self, dt: Seconds) -> Option<Self> {
        let dt = dt.value();
        if !dt.is_finite() {
            return None;
        }
        let whole = dt.floor();
        let epoch = self.epoch.checked_add(whole_seconds(whole)?)?;
        Self::checked_from_parts(epoch, self.offset + (dt - whole))
    }

    /// Signed elapsed time `self − other`.
    ///
    /// The result does not depend on the scales the instants were built on.
    pub fn duration_from(&self, other: &Self) -> Seconds {
        let whole = i128::from(self.epoch) - i128::from(other.epoch);
        Seconds::new(whole as f64 + (self.offset - other.offset))
    }

    /// Render this instant as calendar components on `scale`.
    ///
    /// # Errors
    /// [`KernelError::InvalidCalendarField`] if the year falls outside the
    /// range `chrono` can represent.
    pub fn to_calendar<S: TimeScale>(&self, scale: &S) -> Result<CalendarDateTime> {
        let reading = self.shifted_by(scale.offset_from_reference(self));
        CalendarDateTime::from_reading(reading.epoch, reading.offset)
    }

    // ── chrono interop ────────────────────────────────────────────────

    /// Build an instant from a `chrono::DateTime<Utc>`, applying leap seconds.
    pub fn from_utc(datetime: DateTime<Utc>, utc: &UTC) -> Self {
        const UNIX_EPOCH_FROM_NOON: i64 = -946_728_000;
        let reading = Self::from_parts(
            datetime.timestamp() + UNIX_EPOCH_FROM_NOON,
            datetime.timestamp_subsec_nanos() as f64 / 1e9,
        );
        reading.shifted_by(utc.offset_to_reference(&reading))
    }

    /// Convert to a `chrono::DateTime<Utc>`.
    ///
    /// Returns `None` if the value falls outside chrono's representable range.
    pub fn to_utc(&self, utc: &UTC) -> Option<DateTime<Utc>> {
        const UNIX_EPOCH_FROM_NOON: i64 = 946_728_000;
        let reading = self.shifted_by(utc.offset_from_reference(self));
        let nanos = (reading.offset * 1e9).round() as i64;
        let secs = reading
            .epoch
            .checked_add(UNIX_EPOCH_FROM_NOON + nanos / 1_000_000_000)?;
        DateTime::<Utc>::from_timestamp(secs, (nanos % 1_000_000_000) as u32)
    }

    // ── min / max ─────────────────────────────────────────────────────

    /// Earlier of two instants.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        std::cmp::min(self, other)
    }

    /// Later of two instants.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }
}

/// `whole` (an integral `f64`) as `i64`, if it fits.
fn whole_seconds(whole: f64) -> Option<i64> {
    // 2^63: `i64::MAX as f64` rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (-LIMIT..LIMIT).contains(&whole).then_some(whole as i64)
}

// ═══════════════════════════════════════════════════════════════════════════
// Generic trait implementations
// ═══════════════════════════════════════════════════════════════════════════

// ── Ordering ──────────────────────────────────────────────────────────────

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.offset.total_cmp(&other.offset))
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Instant {}

// ── Display ───────────────────────────────────────────────────────────────

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Millisecond rounding happens before the calendar split so that
        // 59.9996 s carries into the next minute instead of printing "60.000".
        let millis = (self.offset * 1_000.0).round() as i64;
        let seconds = self.epoch.saturating_add(millis / 1_000);
        let millis = millis % 1_000;
        match CalendarDateTime::from_reading(seconds, 0.0) {
            Ok(c) => write!(
                f,
                "{}T{:02}:{:02}:{:02}.{:03} {}",
                c.date,
                c.hour,
                c.minute,
                c.second as u32,
                millis,
                TAI::LABEL
            ),
            // Beyond chrono's calendar the millisecond is noise.
            Err(_) => write!(
                f,
                "{:+.3e} s from 2000-01-01T12:00:00 {}",
                self.tai_seconds().value(),
                TAI::LABEL
            ),
        }
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────

impl Add<Seconds> for Instant {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Seconds) -> Self::Output {
        self.shifted_by(rhs)
    }
}

impl AddAssign<Seconds> for Instant {
    #[inline]
    fn add_assign(&mut self, rhs: Seconds) {
        *self = self.shifted_by(rhs);
    }
}

impl Sub<Seconds> for Instant {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Seconds) -> Self::Output {
        self.shifted_by(Seconds::new(-rhs.value()))
    }
}

impl SubAssign<Seconds> for Instant {
    #[inline]
    fn sub_assign(&mut self, rhs: Seconds) {
        *self = *self - rhs;
    }
}

impl Sub for Instant {
    type Output = Seconds;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.duration_from(&rhs)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CalendarDateTime
// ═══════════════════════════════════════════════════════════════════════════

/// Validated calendar components: a Gregorian date plus time of day.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalendarDateTime {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
    /// Seconds within the minute, in `[0, 60)`.
    pub second: f64,
}

impl CalendarDateTime {
    /// Validate calendar components.
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self> {
        let invalid = |field, value: f64| KernelError::InvalidCalendarField { field, value };
        if !(1..=12).contains(&month) {
            return Err(invalid(CalendarField::Month, month as f64));
        }
        if hour > 23 {
            return Err(invalid(CalendarField::Hour, hour as f64));
        }
        if minute > 59 {
            return Err(invalid(CalendarField::Minute, minute as f64));
        }
        if !(0.0..60.0).contains(&second) {
            return Err(invalid(CalendarField::Second, second));
        }
        let date = match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => date,
            // Month already checked: either the day does not exist in that
            // month or the year is beyond chrono's range.
            None if !(1..=31).contains(&day) => {
                return Err(invalid(CalendarField::Day, day as f64))
            }
            None if NaiveDate::from_ymd_opt(year, month, 1).is_some() => {
                return Err(invalid(CalendarField::Day, day as f64))
            }
            None => return Err(invalid(CalendarField::Year, year as f64)),
        };
        Ok(Self {
            date,
            hour,
            minute,
            second,
        })
    }

    /// Midnight of `date`.
    pub fn midnight(date: NaiveDate) -> Self {
        Self {
            date,
            hour: 0,
            minute: 0,
            second: 0.0,
        }
    }

    /// The calendar reading encoded on the instant axis, as if the reading
    /// were a TAI label.
    pub(crate) fn reading(&self) -> Instant {
        let days = i64::from(self.date.num_days_from_ce() - J2000_DAY_FROM_CE);
        let whole = self.second.floor();
        let seconds = days * SECONDS_PER_DAY - NOON_OFFSET
            + i64::from(self.hour) * 3_600
            + i64::from(self.minute) * 60
            + whole as i64;
        Instant::from_parts(seconds, self.second - whole)
    }

    fn from_reading(epoch: i64, offset: f64) -> Result<Self> {
        let since_midnight = i128::from(epoch) + i128::from(NOON_OFFSET);
        let days = since_midnight.div_euclid(i128::from(SECONDS_PER_DAY));
        let second_of_day = since_midnight.rem_euclid(i128::from(SECONDS_PER_DAY)) as i64;
        let date = i32::try_from(days)
            .ok()
            .and_then(|d| d.checked_add(J2000_DAY_FROM_CE))
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or(KernelError::InvalidCalendarField {
                field: CalendarField::Year,
                value: 2000.0 + days as f64 / 365.25,
            })?;
        Ok(Self {
            date,
            hour: (second_of_day / 3_600) as u32,
            minute: ((second_of_day % 3_600) / 60) as u32,
            second: (second_of_day % 60) as f64 + offset,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

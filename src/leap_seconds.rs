// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Leap-second table: the step history relating UTC to TAI.
//!
//! Each entry records the UTC date at whose midnight a step takes effect, the
//! step size, and the cumulative **TAI − UTC** after the step. Lookups are
//! binary searches over the (small) sorted table.
//!
//! # Reset instant
//!
//! A step is applied as one clock reset. For the 2005 leap second the UTC
//! reading runs continuously from 23:59:59 to 00:00:00 and is then set back
//! to 23:59:59. The physical instant of the reset, exposed by
//! [`LeapSecond::boundary`], still uses the pre-leap offset; every instant
//! strictly after it uses the post-leap offset.

use chrono::{Datelike, NaiveDate};
use qtty::Seconds;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::instant::{Instant, SECONDS_PER_DAY};

const DATASET: &str = "leap-second table";

/// `NaiveDate::num_days_from_ce` of 2000-01-01.
const J2000_DAY_FROM_CE: i64 = 730_120;

/// One step as supplied by a leap-second source.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeapSecondRecord {
    /// UTC date at whose 00:00:00 the step takes effect.
    pub date: NaiveDate,
    /// Change of TAI − UTC in seconds (`+1.0` for an inserted second).
    pub step: f64,
}

impl LeapSecondRecord {
    pub const fn new(date: NaiveDate, step: f64) -> Self {
        Self { date, step }
    }
}

/// A validated step of the table.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LeapSecond {
    /// Days from 2000-01-01 to the step date.
    day: i64,
    step: f64,
    offset_after: f64,
    /// UTC reading of the step (midnight), encoded on the instant axis.
    reading: Instant,
    /// TAI instant of the clock reset.
    boundary: Instant,
}

impl LeapSecond {
    fn new(day: i64, step: f64, offset_after: f64) -> Self {
        let reading = Instant::from_parts(day * SECONDS_PER_DAY - SECONDS_PER_DAY / 2, 0.0);
        let boundary = reading.shifted_by(Seconds::new(offset_after - step));
        Self {
            day,
            step,
            offset_after,
            reading,
            boundary,
        }
    }

    /// UTC date at whose midnight the step takes effect.
    pub fn date(&self) -> Option<NaiveDate> {
        i32::try_from(self.day + J2000_DAY_FROM_CE)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
    }

    /// Step size in seconds.
    pub fn step(&self) -> Seconds {
        Seconds::new(self.step)
    }

    /// Cumulative TAI − UTC before the step.
    pub fn offset_before(&self) -> Seconds {
        Seconds::new(self.offset_after - self.step)
    }

    /// Cumulative TAI − UTC after the step.
    pub fn offset_after(&self) -> Seconds {
        Seconds::new(self.offset_after)
    }

    /// Physical instant of the clock reset.
    pub fn boundary(&self) -> Instant {
        self.boundary
    }
}

/// Leap-second table (TAI − UTC history).
///
/// Immutable once built. Dates are strictly increasing and every step
/// changes the cumulative offset.
#[derive(Debug, Clone, PartialEq)]
pub struct LeapSecondTable {
    entries: Vec<LeapSecond>,
}

/// IERS Bulletin C: (JD of 00:00:00 UTC on the day the step takes effect,
/// cumulative TAI − UTC after the step).
const IERS_LEAP_SECONDS: [(f64, f64); 28] = [
    (2_441_317.5, 10.0), // 1972-01-01
    (2_441_499.5, 11.0), // 1972-07-01
    (2_441_683.5, 12.0), // 1973-01-01
    (2_442_048.5, 13.0), // 1974-01-01
    (2_442_413.5, 14.0), // 1975-01-01
    (2_442_778.5, 15.0), // 1976-01-01
    (2_443_144.5, 16.0), // 1977-01-01
    (2_443_509.5, 17.0), // 1978-01-01
    (2_443_874.5, 18.0), // 1979-01-01
    (2_444_239.5, 19.0), // 1980-01-01
    (2_444_786.5, 20.0), // 1981-07-01
    (2_445_151.5, 21.0), // 1982-07-01
    (2_445_516.5, 22.0), // 1983-07-01
    (2_446_247.5, 23.0), // 1985-07-01
    (2_447_161.5, 24.0), // 1988-01-01
    (2_447_892.5, 25.0), // 1990-01-01
    (2_448_257.5, 26.0), // 1991-01-01
    (2_448_804.5, 27.0), // 1992-07-01
    (2_449_169.5, 28.0), // 1993-07-01
    (2_449_534.5, 29.0), // 1994-07-01
    (2_450_083.5, 30.0), // 1996-01-01
    (2_450_630.5, 31.0), // 1997-07-01
    (2_451_179.5, 32.0), // 1999-01-01
    (2_453_736.5, 33.0), // 2006-01-01
    (2_454_832.5, 34.0), // 2009-01-01
    (2_456_109.5, 35.0), // 2012-07-01
    (2_457_204.5, 36.0), // 2015-07-01
    (2_457_754.5, 37.0), // 2017-01-01
];

/// JD of 2000-01-01T00:00:00.
const JD_2000_MIDNIGHT: f64 = 2_451_544.5;

impl LeapSecondTable {
    /// The IERS Bulletin C table (1972-01-01 through 2017-01-01).
    ///
    /// The 1972 entry is a 10 s step from zero: the fractional pre-1972
    /// UTC drift is not modelled, so instants before it resolve to a zero
    /// offset.
    pub fn iers() -> Self {
        let mut previous = 0.0;
        let entries = IERS_LEAP_SECONDS
            .iter()
            .map(|&(jd, after)| {
                let day = (jd - JD_2000_MIDNIGHT) as i64;
                let entry = LeapSecond::new(day, after - previous, after);
                previous = after;
                entry
            })
            .collect();
        Self { entries }
    }

    /// Build from (date, step) pairs, accumulating TAI − UTC from zero.
    ///
    /// # Errors
    /// [`KernelError::DataUnavailable`] if the source is empty, unsorted,
    /// has duplicate dates, or a step is zero or not finite.
    pub fn from_steps<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = LeapSecondRecord>,
    {
        let mut cumulative = 0.0;
        Self::build(records.into_iter().map(|record| {
            cumulative += record.step;
            (record.date, record.step, cumulative)
        }))
    }

    /// Build from (date, cumulative TAI − UTC after the step) pairs.
    ///
    /// # Errors
    /// Same conditions as [`from_steps`](Self::from_steps).
    pub fn from_offsets<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut previous = 0.0;
        Self::build(entries.into_iter().map(|(date, after)| {
            let step = after - previous;
            previous = after;
            (date, step, after)
        }))
    }

    fn build(rows: impl Iterator<Item = (NaiveDate, f64, f64)>) -> Result<Self> {
        let mut entries: Vec<LeapSecond> = Vec::new();
        for (date, step, after) in rows {
            if !step.is_finite() || !after.is_finite() || step == 0.0 {
                return Err(KernelError::data(
                    DATASET,
                    None,
                    format!("step of {step} s on {date} does not change TAI − UTC"),
                ));
            }
            let day = i64::from(date.num_days_from_ce()) - J2000_DAY_FROM_CE;
            if let Some(last) = entries.last() {
                if day <= last.day {
                    return Err(KernelError::data(
                        DATASET,
                        None,
                        format!("step on {date} is not after the previous step"),
                    ));
                }
            }
            entries.push(LeapSecond::new(day, step, after));
        }
        if entries.is_empty() {
            return Err(KernelError::data(DATASET, None, "source contains no steps"));
        }
        debug!(steps = entries.len(), "leap-second table built");
        Ok(Self { entries })
    }

    /// TAI − UTC in effect at a physical instant.
    ///
    /// Zero before the first recorded step. At a step's reset instant the
    /// pre-leap value still applies.
    pub fn offset_at(&self, instant: &Instant) -> Seconds {
        let applied = self.entries.partition_point(|e| e.boundary < *instant);
        self.offset_after_count(applied)
    }

    /// TAI − UTC for a UTC calendar reading (encoded on the instant axis).
    ///
    /// Readings at or after a step's midnight use the post-leap offset.
    pub fn offset_for_reading(&self, reading: &Instant) -> Seconds {
        let applied = self.entries.partition_point(|e| e.reading <= *reading);
        self.offset_after_count(applied)
    }

    fn offset_after_count(&self, applied: usize) -> Seconds {
        match applied.checked_sub(1) {
            Some(i) => Seconds::new(self.entries[i].offset_after),
            None => Seconds::new(0.0),
        }
    }

    /// Steps in chronological order.
    pub fn entries(&self) -> &[LeapSecond] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scales::TAI;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iers_table_dates_and_offsets() {
        let table = LeapSecondTable::iers();
        assert_eq!(table.len(), 28);
        let first = table.entries()[0];
        assert_eq!(first.date(), Some(ymd(1972, 1, 1)));
        assert_eq!(first.step(), Seconds::new(10.0));
        let leap_2006 = table.entries()[23];
        assert_eq!(leap_2006.date(), Some(ymd(2006, 1, 1)));
        assert_eq!(leap_2006.offset_before(), Seconds::new(32.0));
        assert_eq!(leap_2006.offset_after(), Seconds::new(33.0));
        assert_eq!(table.entries()[27].date(), Some(ymd(2017, 1, 1)));
    }

    #[test]
    fn offset_before_first_step_is_zero() {
        let table = LeapSecondTable::iers();
        let t = Instant::from_calendar(1960, 1, 1, 0, 0, 0.0, &TAI).unwrap();
        assert_eq!(table.offset_at(&t), Seconds::new(0.0));
        assert_eq!(table.offset_for_reading(&t), Seconds::new(0.0));
    }

    #[test]
    fn offset_steps_strictly_after_boundary() {
        let table = LeapSecondTable::iers();
        let leap = table.entries()[23];
        let b = leap.boundary();
        // Reset happens when the pre-leap reading reaches 2006-01-01T00:00:00.
        let expected = Instant::from_calendar(2006, 1, 1, 0, 0, 32.0, &TAI).unwrap();
        assert_eq!(b, expected);
        assert_eq!(table.offset_at(&b.shifted_by(Seconds::new(-1.0e-6))), Seconds::new(32.0));
        assert_eq!(table.offset_at(&b), Seconds::new(32.0));
        assert_eq!(table.offset_at(&b.shifted_by(Seconds::new(1.0e-6))), Seconds::new(33.0));
    }

    #[test]
    fn reading_lookup_switches_at_midnight() {
        let table = LeapSecondTable::iers();
        let before = Instant::from_calendar(2005, 12, 31, 23, 59, 59.5, &TAI).unwrap();
        let midnight = Instant::from_calendar(2006, 1, 1, 0, 0, 0.0, &TAI).unwrap();
        assert_eq!(table.offset_for_reading(&before), Seconds::new(32.0));
        assert_eq!(table.offset_for_reading(&midnight), Seconds::new(33.0));
    }

    #[test]
    fn from_steps_accumulates() {
        let table = LeapSecondTable::from_steps([
            LeapSecondRecord::new(ymd(1990, 1, 1), 25.0),
            LeapSecondRecord::new(ymd(1995, 1, 1), 1.0),
            LeapSecondRecord::new(ymd(2000, 7, 1), -1.0),
        ])
        .unwrap();
        let offsets: Vec<f64> = table.entries().iter().map(|e| e.offset_after().value()).collect();
        assert_eq!(offsets, vec![25.0, 26.0, 25.0]);
        let last = table.entries()[2];
        assert_eq!(last.offset_before(), Seconds::new(26.0));
    }

    #[test]
    fn from_offsets_matches_iers() {
        let rebuilt = LeapSecondTable::from_offsets(
            LeapSecondTable::iers()
                .entries()
                .iter()
                .map(|e| (e.date().unwrap(), e.offset_after().value())),
        )
        .unwrap();
        assert_eq!(rebuilt, LeapSecondTable::iers());
    }

    #[test]
    fn rejects_invalid_sources() {
        let is_data_error =
            |r: Result<LeapSecondTable>| matches!(r, Err(KernelError::DataUnavailable { .. }));
        assert!(is_data_error(LeapSecondTable::from_steps(Vec::new())));
        assert!(is_data_error(LeapSecondTable::from_steps([
            LeapSecondRecord::new(ymd(1995, 1, 1), 1.0),
            LeapSecondRecord::new(ymd(1990, 1, 1), 1.0),
        ])));
        assert!(is_data_error(LeapSecondTable::from_steps([
            LeapSecondRecord::new(ymd(1995, 1, 1), 1.0),
            LeapSecondRecord::new(ymd(1995, 1, 1), 1.0),
        ])));
        assert!(is_data_error(LeapSecondTable::from_steps([LeapSecondRecord::new(
            ymd(1995, 1, 1),
            f64::NAN
        )])));
        assert!(is_data_error(LeapSecondTable::from_offsets([
            (ymd(1995, 1, 1), 10.0),
            (ymd(1996, 1, 1), 10.0),
        ])));
    }
}

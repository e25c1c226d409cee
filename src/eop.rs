// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! # Earth Orientation Parameters
//!
//! [`EopHistory`] holds the IERS-style series of **UT1 − UTC** and polar
//! motion samples supplied by a loader, and answers interpolated queries.
//!
//! ## Lookup rules
//!
//! * strictly inside the covered span: linear interpolation between the two
//!   bracketing samples;
//! * at or after the last sample: zero (UT1 is treated as UTC and the pole as
//!   the reference pole once the data is stale);
//! * before the first sample: the first sample, held constant.
//!
//! ## Leap seconds
//!
//! UT1 − UTC jumps by the leap step between the two samples that straddle a
//! leap second. When consecutive samples differ by more than
//! [`LEAP_JUMP_THRESHOLD`] the later one is brought back by the integer step
//! before interpolating, so the value stays continuous up to the later
//! sample, where the jump appears.

use std::f64::consts::PI;

use chrono::NaiveDate;
use qtty::Seconds;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::instant::{CalendarDateTime, Instant};
use crate::scales::{TimeScale, UTC};

const DATASET: &str = "EOP history";

/// Jump in UT1 − UTC between consecutive samples above which a leap second
/// is assumed.
pub const LEAP_JUMP_THRESHOLD: f64 = 0.9;

const ARC_SECONDS_TO_RADIANS: f64 = PI / (180.0 * 3_600.0);

/// One sample as supplied by an Earth-orientation source.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EopEntry {
    /// UTC date of the sample (00:00:00 UTC).
    pub date: NaiveDate,
    /// UT1 − UTC in seconds.
    pub ut1_minus_utc: f64,
    /// Pole x coordinate in arcseconds.
    pub x_pole: f64,
    /// Pole y coordinate in arcseconds.
    pub y_pole: f64,
}

impl EopEntry {
    pub const fn new(date: NaiveDate, ut1_minus_utc: f64, x_pole: f64, y_pole: f64) -> Self {
        Self {
            date,
            ut1_minus_utc,
            x_pole,
            y_pole,
        }
    }
}

/// Polar motion coordinates, in radians.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoleCorrection {
    pub x_p: f64,
    pub y_p: f64,
}

impl PoleCorrection {
    pub const ZERO: Self = Self { x_p: 0.0, y_p: 0.0 };
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct EopPoint {
    date: Instant,
    dut1: f64,
    pole: PoleCorrection,
}

/// Immutable, date-sorted Earth-orientation series.
#[derive(Debug, Clone, PartialEq)]
pub struct EopHistory {
    points: Vec<EopPoint>,
}

impl EopHistory {
    /// Build the history, dating each sample at 00:00:00 on `utc`.
    ///
    /// # Errors
    /// [`KernelError::DataUnavailable`] if the source is empty, contains a
    /// non-finite value, or its dates are not strictly increasing.
    pub fn new(entries: Vec<EopEntry>, utc: &UTC) -> Result<Self> {
        if entries.is_empty() {
            return Err(KernelError::data(DATASET, None, "source contains no samples"));
        }
        let mut points: Vec<EopPoint> = Vec::with_capacity(entries.len());
        for entry in entries {
            // On a leap day midnight is labelled twice; the sample takes the
            // first label, the instant at which the UTC offset steps.
            let reading = CalendarDateTime::midnight(entry.date).reading();
            let eve = reading.shifted_by(Seconds::new(-1.0));
            let date = reading.shifted_by(utc.offset_to_reference(&eve));
            if ![entry.ut1_minus_utc, entry.x_pole, entry.y_pole]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(KernelError::data(
                    DATASET,
                    Some(date),
                    format!("non-finite sample on {}", entry.date),
                ));
            }
            if let Some(last) = points.last() {
                if date <= last.date {
                    return Err(KernelError::data(
                        DATASET,
                        Some(date),
                        format!("sample on {} is not after the previous sample", entry.date),
                    ));
                }
            }
            points.push(EopPoint {
                date,
                dut1: entry.ut1_minus_utc,
                pole: PoleCorrection {
                    x_p: entry.x_pole * ARC_SECONDS_TO_RADIANS,
                    y_p: entry.y_pole * ARC_SECONDS_TO_RADIANS,
                },
            });
        }
        debug!(
            samples = points.len(),
            start = %points[0].date,
            end = %points[points.len() - 1].date,
            "EOP history built"
        );
        Ok(Self { points })
    }

    /// Date of the first sample.
    pub fn start_date(&self) -> Instant {
        self.points[0].date
    }

    /// Date of the last sample; queries at or after it get zero corrections.
    pub fn end_date(&self) -> Instant {
        self.points[self.points.len() - 1].date
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// UT1 − UTC at `date`.
    pub fn ut1_minus_utc(&self, date: &Instant) -> Seconds {
        let value = match self.bracket(date) {
            Bracket::Stale => 0.0,
            Bracket::Before(first) => first.dut1,
            Bracket::Between(prev, next, fraction) => {
                let mut next_dut1 = next.dut1;
                let jump = next_dut1 - prev.dut1;
                if jump.abs() > LEAP_JUMP_THRESHOLD {
                    next_dut1 -= jump.round();
                }
                prev.dut1 + fraction * (next_dut1 - prev.dut1)
            }
        };
        Seconds::new(value)
    }

    /// Pole coordinates at `date`.
    pub fn pole_correction(&self, date: &Instant) -> PoleCorrection {
        match self.bracket(date) {
            Bracket::Stale => PoleCorrection::ZERO,
            Bracket::Before(first) => first.pole,
            Bracket::Between(prev, next, fraction) => PoleCorrection {
                x_p: prev.pole.x_p + fraction * (next.pole.x_p - prev.pole.x_p),
                y_p: prev.pole.y_p + fraction * (next.pole.y_p - prev.pole.y_p),
            },
        }
    }

    fn bracket(&self, date: &Instant) -> Bracket<'_> {
        let end = self.end_date();
        if *date >= end {
            trace!(%date, %end, "EOP data exhausted, using zero correction");
            return Bracket::Stale;
        }
        // Number of samples strictly before `date`; the last sample lies
        // after it. A date on a sample closes the interval ending there.
        let index = self.points.partition_point(|p| p.date < *date);
        if index == 0 {
            return Bracket::Before(&self.points[0]);
        }
        let prev = &self.points[index - 1];
        let next = &self.points[index];
        let fraction =
            date.duration_from(&prev.date).value() / next.date.duration_from(&prev.date).value();
        Bracket::Between(prev, next, fraction)
    }
}

enum Bracket<'a> {
    Stale,
    Before(&'a EopPoint),
    Between(&'a EopPoint, &'a EopPoint, f64),
}

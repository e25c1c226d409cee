// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Julian-date readings of an [`Instant`].
//!
//! Sidereal-time and precession models are expressed in days or Julian
//! centuries elapsed since J2000.0 *on a given scale* (TT for precession,
//! UT1 for Earth rotation). These helpers read the instant on that scale
//! first and only then convert to days.

use qtty::{Centuries, Days};

use crate::instant::{Instant, SECONDS_PER_DAY};
use crate::scales::TimeScale;

/// Julian Date of 2000-01-01T12:00:00.
pub const J2000_JULIAN_DAY: Days = Days::new(2_451_545.0);

/// One Julian year expressed in days.
pub const JULIAN_YEAR: Days = Days::new(365.25);

/// One Julian century expressed in days.
pub const JULIAN_CENTURY: Days = Days::new(36_525.0);

impl Instant {
    /// Days since 2000-01-01T12:00:00, read on `scale`.
    #[inline]
    pub fn days_since_j2000<S: TimeScale>(&self, scale: &S) -> Days {
        Days::new(self.scale_seconds(scale) / SECONDS_PER_DAY as f64)
    }

    /// Julian Date on `scale`.
    #[inline]
    pub fn julian_day<S: TimeScale>(&self, scale: &S) -> Days {
        Days::new(J2000_JULIAN_DAY.value() + self.days_since_j2000(scale).value())
    }

    /// Julian centuries since J2000.0 on `scale` (used by precession and
    /// sidereal time).
    #[inline]
    pub fn julian_centuries<S: TimeScale>(&self, scale: &S) -> Centuries {
        Centuries::new(self.days_since_j2000(scale).value() / JULIAN_CENTURY.value())
    }
}

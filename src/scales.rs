// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Time-scale types.
//!
//! A time scale maps physical instants to calendar readings. Every scale is
//! defined by its offset to the reference scale, **TAI**:
//!
//! | Type | Description | Offset (scale − TAI) |
//! |------|-------------|----------------------|
//! | [`TAI`] | International Atomic Time | 0 |
//! | [`TT`]  | Terrestrial Time | +32.184 s |
//! | [`GPS`] | GPS Time | −19 s |
//! | [`UTC`] | Coordinated Universal Time | −(TAI − UTC) from the leap table |
//! | [`UT1`] | Universal Time (Earth rotation) | UTC offset + (UT1 − UTC) from EOP |
//!
//! `TAI`, `TT` and `GPS` are zero-sized markers. `UTC` and `UT1` wrap shared,
//! immutable data tables and are cheap to clone.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use qtty::Seconds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::eop::EopHistory;
use crate::instant::Instant;
use crate::leap_seconds::LeapSecondTable;

// ═══════════════════════════════════════════════════════════════════════════
// TimeScale trait
// ═══════════════════════════════════════════════════════════════════════════

/// A time scale, defined by its offsets to and from TAI.
///
/// Calendar readings are passed around as [`Instant`] values holding the
/// reading *as if* it were a TAI label; adding
/// [`offset_to_reference`](Self::offset_to_reference) to such a reading yields
/// the physical instant.
pub trait TimeScale: fmt::Debug {
    /// Display label.
    const LABEL: &'static str;

    /// Offset to *add* to the TAI reading of `instant` to get this scale's
    /// reading.
    fn offset_from_reference(&self, instant: &Instant) -> Seconds;

    /// Offset to *add* to a reading of this scale to get the TAI reading.
    fn offset_to_reference(&self, reading: &Instant) -> Seconds;
}

// ---------------------------------------------------------------------------
// Uniform scales
// ---------------------------------------------------------------------------

/// International Atomic Time, the reference scale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TAI;

impl TimeScale for TAI {
    const LABEL: &'static str = "TAI";

    #[inline(always)]
    fn offset_from_reference(&self, _instant: &Instant) -> Seconds {
        Seconds::new(0.0)
    }

    #[inline(always)]
    fn offset_to_reference(&self, _reading: &Instant) -> Seconds {
        Seconds::new(0.0)
    }
}

/// Terrestrial Time, the basis for astronomical ephemerides.
///
/// `TT = TAI + 32.184 s`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TT;

/// `TT − TAI` in seconds.
pub(crate) const TT_MINUS_TAI: f64 = 32.184;

impl TimeScale for TT {
    const LABEL: &'static str = "TT";

    #[inline(always)]
    fn offset_from_reference(&self, _instant: &Instant) -> Seconds {
        Seconds::new(TT_MINUS_TAI)
    }

    #[inline(always)]
    fn offset_to_reference(&self, _reading: &Instant) -> Seconds {
        Seconds::new(-TT_MINUS_TAI)
    }
}

/// GPS Time.
///
/// GPS time has a fixed offset from TAI: `GPS = TAI − 19 s`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GPS;

const TAI_MINUS_GPS: f64 = 19.0;

impl TimeScale for GPS {
    const LABEL: &'static str = "GPS";

    #[inline(always)]
    fn offset_from_reference(&self, _instant: &Instant) -> Seconds {
        Seconds::new(-TAI_MINUS_GPS)
    }

    #[inline(always)]
    fn offset_to_reference(&self, _reading: &Instant) -> Seconds {
        Seconds::new(TAI_MINUS_GPS)
    }
}

// ---------------------------------------------------------------------------
// Data-backed scales
// ---------------------------------------------------------------------------

/// Coordinated Universal Time.
///
/// UTC follows TAI with step adjustments taken from a [`LeapSecondTable`].
/// Before the first recorded step the offset is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct UTC {
    leaps: Arc<LeapSecondTable>,
}

impl UTC {
    pub fn new(leaps: Arc<LeapSecondTable>) -> Self {
        Self { leaps }
    }

    /// The leap-second table backing this scale.
    pub fn leap_seconds(&self) -> &LeapSecondTable {
        &self.leaps
    }

    /// TAI − UTC at `instant`.
    pub fn tai_minus_utc(&self, instant: &Instant) -> Seconds {
        self.leaps.offset_at(instant)
    }
}

impl TimeScale for UTC {
    const LABEL: &'static str = "UTC";

    #[inline]
    fn offset_from_reference(&self, instant: &Instant) -> Seconds {
        Seconds::new(-self.leaps.offset_at(instant).value())
    }

    #[inline]
    fn offset_to_reference(&self, reading: &Instant) -> Seconds {
        self.leaps.offset_for_reading(reading)
    }
}

/// Universal Time UT1, tied to the Earth's actual rotation.
///
/// `UT1 = UTC + (UT1 − UTC)`, the correction coming from an [`EopHistory`].
/// Once the EOP data runs out the correction is zero and UT1 tracks UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct UT1 {
    utc: UTC,
    eop: Arc<EopHistory>,
}

impl UT1 {
    pub fn new(utc: UTC, eop: Arc<EopHistory>) -> Self {
        Self { utc, eop }
    }

    pub fn utc(&self) -> &UTC {
        &self.utc
    }

    pub fn eop_history(&self) -> &EopHistory {
        &self.eop
    }
}

impl TimeScale for UT1 {
    const LABEL: &'static str = "UT1";

    #[inline]
    fn offset_from_reference(&self, instant: &Instant) -> Seconds {
        let utc = self.utc.offset_from_reference(instant).value();
        Seconds::new(utc + self.eop.ut1_minus_utc(instant).value())
    }

    fn offset_to_reference(&self, reading: &Instant) -> Seconds {
        // Solve tai = reading + (TAI − UTC)(tai) − dut1(tai) by fixed-point
        // iteration. Both terms step by the same amount at a leap reset, so
        // their difference is continuous and changes at ~1e-8 s/s.
        let mut offset = self.utc.offset_to_reference(reading).value();
        for _ in 0..3 {
            let tai = reading.shifted_by(Seconds::new(offset));
            offset = self.utc.tai_minus_utc(&tai).value() - self.eop.ut1_minus_utc(&tai).value();
        }
        Seconds::new(offset)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ScaleKind
// ═══════════════════════════════════════════════════════════════════════════

/// Closed set of scales available for runtime selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScaleKind {
    Tai,
    Tt,
    Gps,
    Utc,
    Ut1,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 5] = [
        ScaleKind::Tai,
        ScaleKind::Tt,
        ScaleKind::Gps,
        ScaleKind::Utc,
        ScaleKind::Ut1,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ScaleKind::Tai => TAI::LABEL,
            ScaleKind::Tt => TT::LABEL,
            ScaleKind::Gps => GPS::LABEL,
            ScaleKind::Utc => UTC::LABEL,
            ScaleKind::Ut1 => UT1::LABEL,
        }
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown scale label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time scale label {0:?}")]
pub struct UnknownScale(pub String);

impl FromStr for ScaleKind {
    type Err = UnknownScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScaleKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownScale(s.to_owned()))
    }
}

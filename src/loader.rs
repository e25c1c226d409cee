// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Load-once access to the data-backed time scales.
//!
//! File and network parsing live outside this crate: a [`TimeDataLoader`]
//! hands over already-parsed leap-second steps and EOP samples.
//!
//! [`TimeScales::load`] is the explicit, fallible initialisation step. For
//! callers that want lazy initialisation, [`TimeScalesFactory`] runs each
//! load at most once and keeps its outcome: a failed load is returned again,
//! unchanged, on every later access and is never retried.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use qtty::Seconds;
use tracing::{debug, warn};

use crate::eop::{EopEntry, EopHistory};
use crate::error::Result;
use crate::instant::{CalendarDateTime, Instant};
use crate::leap_seconds::{LeapSecondRecord, LeapSecondTable};
use crate::scales::{ScaleKind, TimeScale, GPS, TAI, TT, UT1, UTC};

/// Source of parsed leap-second and Earth-orientation data.
pub trait TimeDataLoader {
    /// Leap-second table, typically built with
    /// [`LeapSecondTable::from_steps`] from the source's (date, step) pairs.
    fn load_leap_seconds(&self) -> Result<LeapSecondTable>;

    /// EOP samples, in chronological order.
    fn load_eop(&self) -> Result<Vec<EopEntry>>;
}

/// Loader over data already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    leaps: Option<Vec<LeapSecondRecord>>,
    eop: Vec<EopEntry>,
}

impl InMemoryLoader {
    /// Loader serving the built-in IERS leap-second table.
    pub fn with_iers_leap_seconds(eop: Vec<EopEntry>) -> Self {
        Self { leaps: None, eop }
    }

    /// Loader serving caller-supplied leap-second steps.
    pub fn new(leaps: Vec<LeapSecondRecord>, eop: Vec<EopEntry>) -> Self {
        Self {
            leaps: Some(leaps),
            eop,
        }
    }
}

impl TimeDataLoader for InMemoryLoader {
    fn load_leap_seconds(&self) -> Result<LeapSecondTable> {
        match &self.leaps {
            Some(records) => LeapSecondTable::from_steps(records.iter().copied()),
            None => Ok(LeapSecondTable::iers()),
        }
    }

    fn load_eop(&self) -> Result<Vec<EopEntry>> {
        Ok(self.eop.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TimeScales
// ═══════════════════════════════════════════════════════════════════════════

/// Ready-to-use handle on every supported time scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScales {
    utc: UTC,
    ut1: UT1,
}

impl TimeScales {
    /// Build every scale from the loader's data.
    pub fn load<L: TimeDataLoader + ?Sized>(loader: &L) -> Result<Self> {
        let utc = UTC::new(Arc::new(loader.load_leap_seconds()?));
        let eop = EopHistory::new(loader.load_eop()?, &utc)?;
        Ok(Self::new(utc.clone(), UT1::new(utc, Arc::new(eop))))
    }

    pub fn new(utc: UTC, ut1: UT1) -> Self {
        Self { utc, ut1 }
    }

    pub fn tai(&self) -> TAI {
        TAI
    }

    pub fn tt(&self) -> TT {
        TT
    }

    pub fn gps(&self) -> GPS {
        GPS
    }

    pub fn utc(&self) -> &UTC {
        &self.utc
    }

    pub fn ut1(&self) -> &UT1 {
        &self.ut1
    }

    /// [`TimeScale::offset_from_reference`] for a runtime-selected scale.
    pub fn offset_from_reference(&self, kind: ScaleKind, instant: &Instant) -> Seconds {
        match kind {
            ScaleKind::Tai => TAI.offset_from_reference(instant),
            ScaleKind::Tt => TT.offset_from_reference(instant),
            ScaleKind::Gps => GPS.offset_from_reference(instant),
            ScaleKind::Utc => self.utc.offset_from_reference(instant),
            ScaleKind::Ut1 => self.ut1.offset_from_reference(instant),
        }
    }

    /// [`TimeScale::offset_to_reference`] for a runtime-selected scale.
    pub fn offset_to_reference(&self, kind: ScaleKind, reading: &Instant) -> Seconds {
        match kind {
            ScaleKind::Tai => TAI.offset_to_reference(reading),
            ScaleKind::Tt => TT.offset_to_reference(reading),
            ScaleKind::Gps => GPS.offset_to_reference(reading),
            ScaleKind::Utc => self.utc.offset_to_reference(reading),
            ScaleKind::Ut1 => self.ut1.offset_to_reference(reading),
        }
    }

    /// [`Instant::from_calendar`] for a runtime-selected scale.
    #[allow(clippy::too_many_arguments)]
    pub fn instant(
        &self,
        kind: ScaleKind,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Instant> {
        let reading = CalendarDateTime::new(year, month, day, hour, minute, second)?.reading();
        Ok(reading.shifted_by(self.offset_to_reference(kind, &reading)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TimeScalesFactory
// ═══════════════════════════════════════════════════════════════════════════

/// Lazily loads each data set once and remembers the outcome.
///
/// The leap-second table and the EOP history are cached independently: a
/// broken EOP source makes [`ut1`](Self::ut1) fail forever while
/// [`utc`](Self::utc) keeps working.
#[derive(Debug)]
pub struct TimeScalesFactory<L> {
    loader: L,
    utc: OnceCell<Result<UTC>>,
    eop: OnceCell<Result<Arc<EopHistory>>>,
}

impl<L: TimeDataLoader> TimeScalesFactory<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            utc: OnceCell::new(),
            eop: OnceCell::new(),
        }
    }

    /// UTC, loading the leap-second table on first use.
    pub fn utc(&self) -> Result<UTC> {
        self.utc
            .get_or_init(|| {
                let loaded = self.loader.load_leap_seconds().map(|table| UTC::new(Arc::new(table)));
                match &loaded {
                    Ok(utc) => debug!(steps = utc.leap_seconds().len(), "UTC scale ready"),
                    Err(e) => warn!(error = %e, "UTC scale unavailable"),
                }
                loaded
            })
            .clone()
    }

    /// UT1, loading the leap-second table and EOP history on first use.
    pub fn ut1(&self) -> Result<UT1> {
        let utc = self.utc()?;
        let eop = self
            .eop
            .get_or_init(|| {
                let loaded = self
                    .loader
                    .load_eop()
                    .and_then(|entries| EopHistory::new(entries, &utc))
                    .map(Arc::new);
                match &loaded {
                    Ok(history) => debug!(samples = history.len(), "UT1 scale ready"),
                    Err(e) => warn!(error = %e, "UT1 scale unavailable"),
                }
                loaded
            })
            .clone()?;
        Ok(UT1::new(utc, eop))
    }

    /// Handle on every scale; fails if either data set failed to load.
    pub fn scales(&self) -> Result<TimeScales> {
        let ut1 = self.ut1()?;
        Ok(TimeScales::new(ut1.utc().clone(), ut1))
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Time and reference-frame kernel.
//!
//! This crate provides the time scales and frame transforms underlying
//! orbit and attitude computations.
//!
//! # Core types
//!
//! - [`Instant`] — a scale-independent point in physical time.
//! - [`TimeScale`] — trait that defines a time scale by its offsets to TAI.
//! - [`LeapSecondTable`] / [`EopHistory`] — the data behind UTC and UT1.
//! - [`TimeScales`] — loaded handle on every scale; [`TimeScalesFactory`]
//!   loads it lazily, once.
//! - [`Transform`] — rigid transform (rotation, translation and their rates)
//!   between two frames at one instant.
//! - [`FrameTree`] — arena of frames with per-frame transform caches and
//!   [`FrameSynchronizer`] groups.
//!
//! # Time scales
//!
//! | Marker | Scale |
//! |--------|-------|
//! | [`TAI`] | International Atomic Time (reference) |
//! | [`TT`] | Terrestrial Time |
//! | [`GPS`] | GPS Time |
//! | [`UTC`] | Coordinated Universal Time |
//! | [`UT1`] | Universal Time (Earth rotation) |
//!
//! # Example
//!
//! ```
//! use epochframe::{InMemoryLoader, Instant, TimeScales, TimeScale, TT};
//!
//! let scales = TimeScales::load(&InMemoryLoader::with_iers_leap_seconds(Vec::new()));
//! // An empty EOP source is rejected.
//! assert!(scales.is_err());
//!
//! let t = Instant::J2000_EPOCH;
//! assert_eq!(TT.offset_from_reference(&t).value(), 32.184);
//! ```

mod error;
mod eop;
mod frame;
mod geometry;
pub(crate) mod instant;
mod julian_date_ext;
mod leap_seconds;
mod loader;
pub mod providers;
pub(crate) mod scales;
mod synchronizer;
mod transform;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use eop::{EopEntry, EopHistory, PoleCorrection, LEAP_JUMP_THRESHOLD};
pub use error::{CalendarField, KernelError, Result};
pub use frame::{FrameId, FrameTree, SynchronizerId, TransformProvider};
pub use geometry::{PVCoordinates, Rotation, Vector3};
pub use instant::{CalendarDateTime, Instant};
pub use julian_date_ext::{J2000_JULIAN_DAY, JULIAN_CENTURY, JULIAN_YEAR};
pub use leap_seconds::{LeapSecond, LeapSecondRecord, LeapSecondTable};
pub use loader::{InMemoryLoader, TimeDataLoader, TimeScales, TimeScalesFactory};
pub use providers::{EarthRotation, FixedTransform, FrameBias, PolarMotion, Precession};
pub use scales::{ScaleKind, TimeScale, UnknownScale, GPS, TAI, TT, UT1, UTC};
pub use synchronizer::FrameSynchronizer;
pub use transform::Transform;

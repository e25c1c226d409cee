// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Built-in transform providers and the standard Earth frame hierarchy.
//!
//! ```text
//! GCRF (root)
//!  └─ EME2000      frame bias (IERS 2003)
//!      └─ MOD      precession (IAU 1976)
//!          └─ PEF  Earth rotation (GMST 1982, UT1)
//!              └─ ITRF  polar motion (EOP pole + TIO locator)
//! ```
//!
//! The chain is equinox based and **neglects nutation**: MOD stands in for
//! the true-of-date frame, so ITRF↔GCRF directions carry errors up to the
//! nutation amplitude (about 20″). Precession and bias are quasi-static and
//! modelled without rotation rate.

use std::f64::consts::{PI, TAU};

use qtty::Seconds;

use crate::eop::PoleCorrection;
use crate::error::Result;
use crate::frame::{FrameTree, TransformProvider};
use crate::geometry::{Rotation, Vector3};
use crate::instant::Instant;
use crate::loader::TimeScales;
use crate::scales::{TT, UT1};
use crate::transform::Transform;

pub const GCRF: &str = "GCRF";
pub const EME2000: &str = "EME2000";
pub const MOD: &str = "MOD";
pub const PEF: &str = "PEF";
pub const ITRF: &str = "ITRF";

const ARC_SECONDS_TO_RADIANS: f64 = PI / (180.0 * 3_600.0);

// ═══════════════════════════════════════════════════════════════════════════
// FixedTransform
// ═══════════════════════════════════════════════════════════════════════════

/// Date-independent transform, e.g. a body or sensor mounting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedTransform {
    template: Transform,
}

impl FixedTransform {
    pub fn new(rotation: Rotation, translation: Vector3) -> Self {
        Self {
            template: Transform::new(
                Instant::J2000_EPOCH,
                rotation,
                Vector3::ZERO,
                translation,
                Vector3::ZERO,
            ),
        }
    }

    /// Reuse the geometry (including rates) of `transform` at every date.
    pub fn from_transform(transform: Transform) -> Self {
        Self { template: transform }
    }
}

impl TransformProvider for FixedTransform {
    fn transform(&self, date: &Instant) -> Result<Transform> {
        Ok(self.template.with_date(*date))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Frame bias
// ═══════════════════════════════════════════════════════════════════════════

/// EME2000 → GCRF frame bias (IERS Conventions 2003, §5.5.1).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameBias;

impl FrameBias {
    /// Pole offset ξ₀ (arcseconds).
    pub const XI0: f64 = -0.016_617_0;
    /// Pole offset η₀ (arcseconds).
    pub const ETA0: f64 = -0.006_819_2;
    /// Equinox offset dα₀ (arcseconds).
    pub const DA0: f64 = -0.014_6;

    /// Rotation taking GCRF coordinates to EME2000 coordinates.
    pub fn gcrf_to_eme2000() -> Rotation {
        let xi0 = Self::XI0 * ARC_SECONDS_TO_RADIANS;
        let eta0 = Self::ETA0 * ARC_SECONDS_TO_RADIANS;
        let da0 = Self::DA0 * ARC_SECONDS_TO_RADIANS;
        let inner = Rotation::about_y(-xi0).multiply(&Rotation::about_z(-da0));
        Rotation::about_x(eta0).multiply(&inner)
    }
}

impl TransformProvider for FrameBias {
    fn transform(&self, date: &Instant) -> Result<Transform> {
        Ok(Transform::from_rotation(
            *date,
            Self::gcrf_to_eme2000().inverse(),
            Vector3::ZERO,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Precession
// ═══════════════════════════════════════════════════════════════════════════

/// MOD → EME2000 precession, IAU 1976 (Lieske) angles in TT.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Precession;

impl Precession {
    /// Precession angles `(ζ, θ, z)` in radians, `t` in TT Julian centuries.
    pub fn angles(t: f64) -> (f64, f64, f64) {
        let zeta = ((0.017_998 * t + 0.301_88) * t + 2_306.218_1) * t;
        let theta = ((-0.041_833 * t - 0.426_65) * t + 2_004.310_9) * t;
        let z = ((0.018_203 * t + 1.094_68) * t + 2_306.218_1) * t;
        (
            zeta * ARC_SECONDS_TO_RADIANS,
            theta * ARC_SECONDS_TO_RADIANS,
            z * ARC_SECONDS_TO_RADIANS,
        )
    }

    /// Rotation taking EME2000 coordinates to mean-of-date coordinates.
    pub fn eme2000_to_mod(date: &Instant) -> Rotation {
        let (zeta, theta, z) = Self::angles(date.julian_centuries(&TT).value());
        Rotation::about_z(z).multiply(&Rotation::about_y(-theta).multiply(&Rotation::about_z(zeta)))
    }
}

impl TransformProvider for Precession {
    fn transform(&self, date: &Instant) -> Result<Transform> {
        Ok(Transform::from_rotation(
            *date,
            Self::eme2000_to_mod(date).inverse(),
            Vector3::ZERO,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Earth rotation
// ═══════════════════════════════════════════════════════════════════════════

/// PEF → MOD rotation by Greenwich mean sidereal time (IAU 1982).
#[derive(Debug, Clone, PartialEq)]
pub struct EarthRotation {
    ut1: UT1,
}

impl EarthRotation {
    pub fn new(ut1: UT1) -> Self {
        Self { ut1 }
    }

    /// GMST in radians, `[0, 2π)`, from days since J2000.0 on UT1.
    pub fn gmst(days_ut1: f64) -> f64 {
        let t = days_ut1 / 36_525.0;
        // 360.98564736629 · d, with the whole turns removed first.
        let degrees = 280.460_618_37
            + 360.0 * days_ut1.fract()
            + 0.985_647_366_29 * days_ut1
            + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0;
        degrees.rem_euclid(360.0).to_radians()
    }

    /// Earth rotation rate in rad/s at `t` UT1 Julian centuries.
    pub fn rotation_rate(t: f64) -> f64 {
        (1.002_737_909_350_795 + 5.9006e-11 * t) * TAU / 86_400.0
    }
}

impl TransformProvider for EarthRotation {
    fn transform(&self, date: &Instant) -> Result<Transform> {
        let days = date.days_since_j2000(&self.ut1).value();
        Ok(Transform::from_rotation(
            *date,
            Rotation::about_z(Self::gmst(days)),
            Vector3::new(0.0, 0.0, Self::rotation_rate(days / 36_525.0)),
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Polar motion
// ═══════════════════════════════════════════════════════════════════════════

/// ITRF → PEF polar-motion rotation from EOP pole coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarMotion {
    ut1: UT1,
}

impl PolarMotion {
    /// TIO locator rate s′ (arcseconds per TT century).
    pub const S_PRIME_RATE: f64 = -47e-6;

    pub fn new(ut1: UT1) -> Self {
        Self { ut1 }
    }

    /// Rotation taking ITRF coordinates to PEF coordinates.
    pub fn itrf_to_pef(pole: PoleCorrection, t_tt: f64) -> Rotation {
        let s_prime = Self::S_PRIME_RATE * t_tt * ARC_SECONDS_TO_RADIANS;
        Rotation::about_z(s_prime)
            .multiply(&Rotation::about_y(-pole.x_p).multiply(&Rotation::about_x(-pole.y_p)))
    }
}

impl TransformProvider for PolarMotion {
    fn transform(&self, date: &Instant) -> Result<Transform> {
        let pole = self.ut1.eop_history().pole_correction(date);
        let t = date.julian_centuries(&TT).value();
        Ok(Transform::from_rotation(*date, Self::itrf_to_pef(pole, t), Vector3::ZERO))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Earth hierarchy
// ═══════════════════════════════════════════════════════════════════════════

impl FrameTree {
    /// GCRF-rooted tree holding EME2000, MOD, PEF and ITRF.
    pub fn earth_hierarchy(scales: &TimeScales) -> Result<Self> {
        let mut tree = FrameTree::new(GCRF);
        let eme2000 = tree.add_frame(EME2000, tree.root(), FrameBias, true)?;
        let mod_frame = tree.add_frame(MOD, eme2000, Precession, true)?;
        let pef = tree.add_frame(PEF, mod_frame, EarthRotation::new(scales.ut1().clone()), false)?;
        tree.add_frame(ITRF, pef, PolarMotion::new(scales.ut1().clone()), false)?;
        Ok(tree)
    }
}

/// Duration of one Earth rotation at J2000.0, in UT1 seconds.
pub fn sidereal_day() -> Seconds {
    Seconds::new(TAU / EarthRotation::rotation_rate(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eop::EopEntry;
    use crate::geometry::PVCoordinates;
    use crate::loader::InMemoryLoader;
    use chrono::NaiveDate;

    fn scales() -> TimeScales {
        let entries = (1..=28)
            .map(|d| EopEntry::new(NaiveDate::from_ymd_opt(2010, 2, d).unwrap(), -0.1, 0.1, 0.3))
            .collect();
        TimeScales::load(&InMemoryLoader::with_iers_leap_seconds(entries)).unwrap()
    }

    fn angle_between(a: Vector3, b: Vector3) -> f64 {
        a.cross(&b).norm().atan2(a.dot(&b))
    }

    #[test]
    fn bias_is_a_few_milliarcseconds() {
        let (xi0, eta0, da0) = (FrameBias::XI0, FrameBias::ETA0, FrameBias::DA0);
        let expected = (xi0.powi(2) + eta0.powi(2) + da0.powi(2)).sqrt() * ARC_SECONDS_TO_RADIANS;
        let angle = FrameBias::gcrf_to_eme2000().angle();
        assert!((angle - expected).abs() < 1e-12, "{angle} vs {expected}");
    }

    #[test]
    fn precession_vanishes_at_j2000() {
        let r = Precession::eme2000_to_mod(&Instant::J2000_EPOCH);
        assert!(r.angle() < 1e-15);
    }

    #[test]
    fn precession_tilts_pole_by_theta() {
        let century = Instant::J2000_EPOCH.shifted_by(Seconds::new(36_525.0 * 86_400.0));
        let t = Precession.transform(&century).unwrap();
        let pole = t.transform_vector(Vector3::PLUS_K);
        let theta = (2_004.310_9 - 0.426_65 - 0.041_833) * ARC_SECONDS_TO_RADIANS;
        assert!((angle_between(pole, Vector3::PLUS_K) - theta).abs() < 1e-12);
    }

    #[test]
    fn gmst_reference_values() {
        assert!((EarthRotation::gmst(0.0).to_degrees() - 280.460_618_37).abs() < 1e-9);
        // 1992-08-20T12:14:00 UT1.
        let days = -2_690.5 + (12.0 * 60.0 + 14.0) / 1_440.0;
        assert!((EarthRotation::gmst(days).to_degrees() - 152.578_787_886).abs() < 1e-6);
    }

    #[test]
    fn earth_rotation_spins_about_z() {
        let scales = scales();
        let date = Instant::from_calendar(2010, 2, 10, 6, 0, 0.0, scales.ut1()).unwrap();
        let t = EarthRotation::new(scales.ut1().clone()).transform(&date).unwrap();
        let x = t.transform_vector(Vector3::PLUS_I);
        let days = date.days_since_j2000(scales.ut1()).value();
        let gmst = EarthRotation::gmst(days);
        assert!((x.y.atan2(x.x).rem_euclid(TAU) - gmst).abs() < 1e-12);
        assert!((t.rotation_rate().z - 7.292_115_146_706_98e-5).abs() < 1e-12);
        assert!((sidereal_day().value() - 86_164.090_5).abs() < 1e-3);
    }

    #[test]
    fn polar_motion_moves_pole_to_eop_coordinates() {
        let scales = scales();
        let date = Instant::from_calendar(2010, 2, 10, 0, 0, 0.0, scales.utc()).unwrap();
        let t = PolarMotion::new(scales.ut1().clone()).transform(&date).unwrap();
        let pole_in_itrf = t.inverse().transform_vector(Vector3::PLUS_K);
        let x_p = 0.1 * ARC_SECONDS_TO_RADIANS;
        let y_p = 0.3 * ARC_SECONDS_TO_RADIANS;
        assert!((pole_in_itrf.x - x_p).abs() < 1e-12);
        assert!((pole_in_itrf.y + y_p).abs() < 1e-12);
    }

    #[test]
    fn earth_hierarchy_layout() {
        let tree = FrameTree::earth_hierarchy(&scales()).unwrap();
        let names: Vec<_> = [GCRF, EME2000, MOD, PEF, ITRF]
            .iter()
            .map(|n| tree.frame_by_name(n).unwrap())
            .collect();
        assert_eq!(names[0], tree.root());
        for pair in names.windows(2) {
            assert_eq!(tree.parent(pair[1]), Some(pair[0]));
        }
        assert_eq!(tree.is_pseudo_inertial(names[1]), Some(true));
        assert_eq!(tree.is_pseudo_inertial(names[4]), Some(false));
    }

    #[test]
    fn ground_station_moves_at_earth_rate_in_gcrf() {
        let scales = scales();
        let tree = FrameTree::earth_hierarchy(&scales).unwrap();
        let itrf = tree.frame_by_name(ITRF).unwrap();
        let date = Instant::from_calendar(2010, 2, 14, 3, 30, 0.0, scales.utc()).unwrap();
        let t = tree.transform(itrf, tree.root(), &date).unwrap();
        let station = PVCoordinates::new(Vector3::new(6_378_137.0, 0.0, 0.0), Vector3::ZERO);
        let inertial = t.transform_pv(&station);
        assert!((inertial.position.norm() - 6_378_137.0).abs() < 1e-6);
        let speed = inertial.velocity.norm();
        assert!((speed - 465.1).abs() < 0.1, "speed = {speed}");
    }
}

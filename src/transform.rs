// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Instantaneous rigid transform between two frames.
//!
//! A [`Transform`] from frame `A` to frame `B` holds, at one date:
//!
//! * `R`, the rotation taking `A` coordinates to `B` coordinates;
//! * `ω`, the angular velocity of `A` relative to `B`, in `B` axes;
//! * `T`, the translation (origin of `A` seen from `B`, in `B` axes);
//! * `V`, the rate of `T`.
//!
//! Rotation is applied first, then translation:
//!
//! ```text
//! p_B = R·p_A + T
//! v_B = R·v_A + V + ω × (R·p_A)
//! ```
//!
//! The `ω × (R·p_A)` term is what makes velocities correct in rotating
//! frames such as Earth-fixed ones.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{PVCoordinates, Rotation, Vector3};
use crate::instant::Instant;

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    date: Instant,
    rotation: Rotation,
    rotation_rate: Vector3,
    translation: Vector3,
    velocity: Vector3,
}

impl Transform {
    /// The identity transform at `date`.
    pub fn identity(date: Instant) -> Self {
        Self::new(date, Rotation::IDENTITY, Vector3::ZERO, Vector3::ZERO, Vector3::ZERO)
    }

    pub fn new(
        date: Instant,
        rotation: Rotation,
        rotation_rate: Vector3,
        translation: Vector3,
        velocity: Vector3,
    ) -> Self {
        Self {
            date,
            rotation,
            rotation_rate,
            translation,
            velocity,
        }
    }

    /// Pure rotation, optionally spinning at `rotation_rate`.
    pub fn from_rotation(date: Instant, rotation: Rotation, rotation_rate: Vector3) -> Self {
        Self::new(date, rotation, rotation_rate, Vector3::ZERO, Vector3::ZERO)
    }

    /// Pure translation, optionally drifting at `velocity`.
    pub fn from_translation(date: Instant, translation: Vector3, velocity: Vector3) -> Self {
        Self::new(date, Rotation::IDENTITY, Vector3::ZERO, translation, velocity)
    }

    pub fn date(&self) -> Instant {
        self.date
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn rotation_rate(&self) -> Vector3 {
        self.rotation_rate
    }

    pub fn translation(&self) -> Vector3 {
        self.translation
    }

    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    /// Same geometry, relabelled at `date`.
    pub(crate) fn with_date(mut self, date: Instant) -> Self {
        self.date = date;
        self
    }

    // ── application ───────────────────────────────────────────────────

    /// `R·p + T`.
    #[inline]
    pub fn transform_position(&self, position: Vector3) -> Vector3 {
        self.rotation.apply_to(position) + self.translation
    }

    /// `R·v`: directions are unaffected by translation.
    #[inline]
    pub fn transform_vector(&self, vector: Vector3) -> Vector3 {
        self.rotation.apply_to(vector)
    }

    pub fn transform_pv(&self, pv: &PVCoordinates) -> PVCoordinates {
        let rp = self.rotation.apply_to(pv.position);
        let rv = self.rotation.apply_to(pv.velocity);
        PVCoordinates::new(
            rp + self.translation,
            rv + self.velocity + self.rotation_rate.cross(&rp),
        )
    }

    // ── algebra ───────────────────────────────────────────────────────

    /// The transform from `B` back to `A`.
    pub fn inverse(&self) -> Self {
        let inverse = self.rotation.inverse();
        let rt = inverse.apply_to(self.translation);
        let rw = inverse.apply_to(self.rotation_rate);
        Self {
            date: self.date,
            rotation: inverse,
            rotation_rate: -rw,
            translation: -rt,
            velocity: rw.cross(&rt) - inverse.apply_to(self.velocity),
        }
    }

    /// Chain `self: A→B` with `other: B→C` into `A→C`, dated like `self`.
    pub fn compose(&self, other: &Self) -> Self {
        let r2 = other.rotation;
        let r2_t1 = r2.apply_to(self.translation);
        Self {
            date: self.date,
            rotation: r2.multiply(&self.rotation),
            rotation_rate: other.rotation_rate + r2.apply_to(self.rotation_rate),
            translation: r2_t1 + other.translation,
            velocity: other.rotation_rate.cross(&r2_t1)
                + r2.apply_to(self.velocity)
                + other.velocity,
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [q0, q1, q2, q3] = self.rotation.quaternion();
        let t = self.translation;
        write!(
            f,
            "Transform @ {} {{ q = ({q0:.12}, {q1:.12}, {q2:.12}, {q3:.12}), ",
            self.date
        )?;
        write!(f, "T = ({:.6}, {:.6}, {:.6}) }}", t.x, t.y, t.z)
    }
}

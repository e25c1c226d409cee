// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Minimal 3-D algebra for frame transforms.
//!
//! [`Rotation`] is a unit quaternion `(q0, q1, q2, q3)` with scalar part
//! `q0`. Rotations are *active*: [`Rotation::apply_to`] turns a vector by
//! the rotation angle about the axis, counter-clockwise when looking down
//! the axis. Used as a frame transform, the rotation maps coordinates
//! expressed in the source frame to coordinates expressed in the target
//! frame.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// Vector3
// ═══════════════════════════════════════════════════════════════════════════

/// Cartesian 3-vector.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const PLUS_I: Self = Self::new(1.0, 0.0, 0.0);
    pub const PLUS_J: Self = Self::new(0.0, 1.0, 0.0);
    pub const PLUS_K: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Vector3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;
    #[inline]
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;
    #[inline]
    fn mul(self, v: Vector3) -> Vector3 {
        v * self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Rotation
// ═══════════════════════════════════════════════════════════════════════════

/// Rotation stored as a unit quaternion.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rotation {
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        q0: 1.0,
        q1: 0.0,
        q2: 0.0,
        q3: 0.0,
    };

    /// Build from quaternion components, normalising them.
    ///
    /// Returns `None` for a zero or non-finite quaternion.
    pub fn from_quaternion(q0: f64, q1: f64, q2: f64, q3: f64) -> Option<Self> {
        let norm = (q0 * q0 + q1 * q1 + q2 * q2 + q3 * q3).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return None;
        }
        Some(Self {
            q0: q0 / norm,
            q1: q1 / norm,
            q2: q2 / norm,
            q3: q3 / norm,
        })
    }

    /// Rotation by `angle` radians about `axis`.
    ///
    /// Returns `None` if the axis is zero or not finite.
    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Option<Self> {
        let norm = axis.norm();
        if !norm.is_finite() || norm == 0.0 {
            return None;
        }
        let (s, c) = (0.5 * angle).sin_cos();
        let u = axis * (s / norm);
        Some(Self {
            q0: c,
            q1: u.x,
            q2: u.y,
            q3: u.z,
        })
    }

    pub fn about_x(angle: f64) -> Self {
        let (s, c) = (0.5 * angle).sin_cos();
        Self {
            q0: c,
            q1: s,
            q2: 0.0,
            q3: 0.0,
        }
    }

    pub fn about_y(angle: f64) -> Self {
        let (s, c) = (0.5 * angle).sin_cos();
        Self {
            q0: c,
            q1: 0.0,
            q2: s,
            q3: 0.0,
        }
    }

    pub fn about_z(angle: f64) -> Self {
        let (s, c) = (0.5 * angle).sin_cos();
        Self {
            q0: c,
            q1: 0.0,
            q2: 0.0,
            q3: s,
        }
    }

    /// Quaternion components `[q0, q1, q2, q3]`, scalar first.
    pub const fn quaternion(&self) -> [f64; 4] {
        [self.q0, self.q1, self.q2, self.q3]
    }

    #[inline]
    fn vector_part(&self) -> Vector3 {
        Vector3::new(self.q1, self.q2, self.q3)
    }

    /// Rotate `v`.
    #[inline]
    pub fn apply_to(&self, v: Vector3) -> Vector3 {
        let u = self.vector_part();
        let uv = u.cross(&v);
        v + uv * (2.0 * self.q0) + u.cross(&uv) * 2.0
    }

    /// Rotate `v` by the inverse rotation.
    #[inline]
    pub fn apply_inverse_to(&self, v: Vector3) -> Vector3 {
        self.inverse().apply_to(v)
    }

    /// Rotation equivalent to applying `other` first, then `self`.
    pub fn multiply(&self, other: &Self) -> Self {
        let (a0, a) = (self.q0, self.vector_part());
        let (b0, b) = (other.q0, other.vector_part());
        let v = b * a0 + a * b0 + a.cross(&b);
        // Renormalise so long composition chains stay on the unit sphere.
        Self::from_quaternion(a0 * b0 - a.dot(&b), v.x, v.y, v.z).unwrap_or(Self::IDENTITY)
    }

    pub fn inverse(&self) -> Self {
        Self {
            q0: self.q0,
            q1: -self.q1,
            q2: -self.q2,
            q3: -self.q3,
        }
    }

    /// Rotation angle in `[0, π]`.
    pub fn angle(&self) -> f64 {
        2.0 * self.vector_part().norm().atan2(self.q0.abs())
    }

    /// Angle of the rotation taking `self` to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        other.multiply(&self.inverse()).angle()
    }

    /// Row-major direction-cosine matrix `M` with `M · v == apply_to(v)`.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        let Self { q0, q1, q2, q3 } = *self;
        [
            [
                q0 * q0 + q1 * q1 - q2 * q2 - q3 * q3,
                2.0 * (q1 * q2 - q0 * q3),
                2.0 * (q1 * q3 + q0 * q2),
            ],
            [
                2.0 * (q1 * q2 + q0 * q3),
                q0 * q0 - q1 * q1 + q2 * q2 - q3 * q3,
                2.0 * (q2 * q3 - q0 * q1),
            ],
            [
                2.0 * (q1 * q3 - q0 * q2),
                2.0 * (q2 * q3 + q0 * q1),
                q0 * q0 - q1 * q1 - q2 * q2 + q3 * q3,
            ],
        ]
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PVCoordinates
// ═══════════════════════════════════════════════════════════════════════════

/// Position and velocity pair.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PVCoordinates {
    pub position: Vector3,
    pub velocity: Vector3,
}

impl PVCoordinates {
    pub const ZERO: Self = Self::new(Vector3::ZERO, Vector3::ZERO);

    pub const fn new(position: Vector3, velocity: Vector3) -> Self {
        Self { position, velocity }
    }

    /// Linear extrapolation by `dt` seconds.
    pub fn shifted_by(&self, dt: f64) -> Self {
        Self::new(self.position + self.velocity * dt, self.velocity)
    }
}

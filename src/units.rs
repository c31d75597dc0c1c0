// Angle and angular velocity quantities in configurable units
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Angular quantities shared by encoders and the positional controller.
//!
//! An [`Angle`] is stored independently of any unit. The controller converts to its configured
//! [`AngleUnit`] at the boundary so that PID gains always relate to a single, consistent unit.

use core::f64::consts::TAU;
use core::ops::{Add, Neg, Sub};

/// The unit a numeric angle is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    /// Full turns of the shaft. The default working unit.
    #[default]
    Rotations,
    /// Degrees, 360 per rotation.
    Degrees,
    /// Radians, 2π per rotation.
    Radians,
}

impl AngleUnit {
    /// How many of this unit make up one full rotation.
    pub const fn per_rotation(self) -> f64 {
        match self {
            AngleUnit::Rotations => 1.0,
            AngleUnit::Degrees => 360.0,
            AngleUnit::Radians => TAU,
        }
    }
}

/// A shaft angle.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Angle {
    rotations: f64,
}

impl Angle {
    /// The zero angle.
    pub const ZERO: Angle = Angle { rotations: 0.0 };

    /// Creates an angle from a value expressed in `unit`.
    pub fn new(value: f64, unit: AngleUnit) -> Self {
        Angle {
            rotations: value / unit.per_rotation(),
        }
    }

    /// Creates an angle from full rotations.
    pub const fn from_rotations(rotations: f64) -> Self {
        Angle { rotations }
    }

    /// Creates an angle from degrees.
    pub fn from_degrees(degrees: f64) -> Self {
        Self::new(degrees, AngleUnit::Degrees)
    }

    /// Creates an angle from radians.
    pub fn from_radians(radians: f64) -> Self {
        Self::new(radians, AngleUnit::Radians)
    }

    /// Expresses this angle in `unit`.
    pub fn in_unit(self, unit: AngleUnit) -> f64 {
        self.rotations * unit.per_rotation()
    }

    /// The angle in full rotations.
    pub const fn rotations(self) -> f64 {
        self.rotations
    }

    /// The angle in degrees.
    pub fn degrees(self) -> f64 {
        self.in_unit(AngleUnit::Degrees)
    }

    /// The angle in radians.
    pub fn radians(self) -> f64 {
        self.in_unit(AngleUnit::Radians)
    }

    /// Whether the angle is a usable number, i.e. neither NaN nor infinite.
    pub fn is_finite(self) -> bool {
        self.rotations.is_finite()
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle::from_rotations(self.rotations + rhs.rotations)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle::from_rotations(self.rotations - rhs.rotations)
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle::from_rotations(-self.rotations)
    }
}

/// A shaft angular velocity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct AngularVelocity {
    rotations_per_second: f64,
}

impl AngularVelocity {
    /// Standstill.
    pub const ZERO: AngularVelocity = AngularVelocity {
        rotations_per_second: 0.0,
    };

    /// Creates a velocity from a value expressed in `unit` per second.
    pub fn new(value_per_second: f64, unit: AngleUnit) -> Self {
        AngularVelocity {
            rotations_per_second: value_per_second / unit.per_rotation(),
        }
    }

    /// Creates a velocity from rotations per second.
    pub const fn from_rotations_per_second(rotations_per_second: f64) -> Self {
        AngularVelocity {
            rotations_per_second,
        }
    }

    /// Expresses this velocity in `unit` per second.
    pub fn in_unit(self, unit: AngleUnit) -> f64 {
        self.rotations_per_second * unit.per_rotation()
    }

    /// The velocity in rotations per second.
    pub const fn rotations_per_second(self) -> f64 {
        self.rotations_per_second
    }
}

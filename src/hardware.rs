// Motor and encoder capabilities required by the control core
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

//! Capabilities the control core needs from motor and encoder hardware.
//!
//! Vendor wrappers implement [`Motor`] and [`Encoder`]; the core never talks to a bus directly and
//! assumes every call succeeds. [`MotorHardware`] is how a controller owns its devices: either a
//! motor paired with a separate encoder ([`Separate`]) or a single PID-capable device that
//! provides both ([`Integrated`]).

use crate::units::{Angle, AngularVelocity};

/// How a numeric demand sent to a motor is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMode {
    /// Demand is a voltage.
    Voltage,
    /// Demand is a fraction of the supply, in `[-1, 1]`.
    DutyCycle,
    /// Demand is a stator current in amps.
    Current,
    /// Demand is a velocity held by the device's own loop.
    Velocity,
    /// Demand is a position held by the device's own loop.
    Position,
    /// Demand is a position reached along the device's motion profile.
    MotionMagic,
}

impl ControlMode {
    /// Whether the demand is a position target.
    ///
    /// Positional modes belong to the controller's own PID pathway and may not be used as a
    /// direct demand.
    pub const fn is_positional(self) -> bool {
        matches!(self, ControlMode::Position | ControlMode::MotionMagic)
    }
}

/// A motor that accepts demands.
pub trait Motor {
    /// Applies `demand`, interpreted according to `mode`.
    fn set(&mut self, mode: ControlMode, demand: f64);

    /// Applies `demand` with an additional open-loop feedforward term.
    fn set_with_feedforward(&mut self, mode: ControlMode, demand: f64, feedforward: f64);

    /// Stops driving the motor.
    fn disable(&mut self);

    /// The current the motor is drawing, in amps.
    fn applied_current(&self) -> f64;
}

/// A sensor reporting shaft angle.
pub trait Encoder {
    /// The measured shaft angle.
    fn position(&self) -> Angle;

    /// Overwrites the measured angle, e.g. to re-zero after a hardware reset.
    fn set_position(&mut self, position: Angle);

    /// The measured shaft velocity.
    fn velocity(&self) -> AngularVelocity;
}

/// Exclusive ownership of the devices behind one controller.
pub trait MotorHardware {
    /// The driven motor.
    fn motor(&self) -> &dyn Motor;

    /// The driven motor, mutably.
    fn motor_mut(&mut self) -> &mut dyn Motor;

    /// The position feedback.
    fn encoder(&self) -> &dyn Encoder;

    /// The position feedback, mutably.
    fn encoder_mut(&mut self) -> &mut dyn Encoder;
}

/// A motor paired with an external encoder.
#[derive(Debug)]
pub struct Separate<M, E> {
    /// The driven motor.
    pub motor: M,
    /// The external encoder.
    pub encoder: E,
}

impl<M: Motor, E: Encoder> MotorHardware for Separate<M, E> {
    fn motor(&self) -> &dyn Motor {
        &self.motor
    }

    fn motor_mut(&mut self) -> &mut dyn Motor {
        &mut self.motor
    }

    fn encoder(&self) -> &dyn Encoder {
        &self.encoder
    }

    fn encoder_mut(&mut self) -> &mut dyn Encoder {
        &mut self.encoder
    }
}

/// A single device with a built-in encoder.
#[derive(Debug)]
pub struct Integrated<M>(pub M);

impl<M: Motor + Encoder> MotorHardware for Integrated<M> {
    fn motor(&self) -> &dyn Motor {
        &self.0
    }

    fn motor_mut(&mut self) -> &mut dyn Motor {
        &mut self.0
    }

    fn encoder(&self) -> &dyn Encoder {
        &self.0
    }

    fn encoder_mut(&mut self) -> &mut dyn Encoder {
        &mut self.0
    }
}

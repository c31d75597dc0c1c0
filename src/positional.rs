// Dual-mode positional motor control
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

use alloc::boxed::Box;

use log::debug;
use num_traits::float::FloatCore;

use crate::hardware::{ControlMode, Encoder, Integrated, Motor, MotorHardware, Separate};
use crate::periodic::Periodic;
use crate::pid::{PidConfig, PidConfigError, PidController};
use crate::telemetry::{MotorSample, MotorTelemetry, TelemetrySink};
use crate::time::CycleClock;
use crate::units::{Angle, AngleUnit, AngularVelocity};

/// Errors raised by [`PositionalMotor`] and its builder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum MotorError {
    /// A positional mode was configured as the mode PID output is applied in.
    #[cfg_attr(feature = "std", error("{0:?} cannot carry PID output"))]
    PositionalControlMode(ControlMode),

    /// A positional mode was used for a direct demand.
    #[cfg_attr(feature = "std", error("{0:?} cannot be used for a direct demand"))]
    PositionalDemandMode(ControlMode),

    /// A setpoint was NaN or infinite.
    #[cfg_attr(feature = "std", error("setpoint must be finite"))]
    InvalidSetpoint,

    /// The acceptable error was negative, NaN or infinite.
    #[cfg_attr(feature = "std", error("acceptable error must be finite and non-negative"))]
    InvalidAcceptableError,

    /// The PID configuration was rejected.
    #[cfg_attr(feature = "std", error("invalid PID configuration: {0}"))]
    Pid(PidConfigError),
}

impl From<PidConfigError> for MotorError {
    fn from(e: PidConfigError) -> Self {
        MotorError::Pid(e)
    }
}

type Shaping = Box<dyn Fn(f64) -> f64>;
type Feedforward = Box<dyn Fn(Angle) -> f64>;

/// A motor driven either by PID toward a setpoint or by direct demands.
///
/// Exactly one of two modes is active at any time:
///
/// - **PID mode**: every [`periodic`](Periodic::periodic) tick reads the encoder, computes the
///   PID output toward the setpoint, passes it through the output clamp and applies it in the
///   configured [`ControlMode`].
/// - **Direct mode**: the last demand given to [`set_demand`](Self::set_demand) stands and ticks
///   leave the motor alone.
///
/// Setpoint and measurement share one configurable [`AngleUnit`], so gains are tuned in that unit.
pub struct PositionalMotor<H: MotorHardware> {
    hardware: H,
    pid: PidController<CycleClock, f64>,
    clock: CycleClock,
    control_mode: ControlMode,
    unit: AngleUnit,
    acceptable_error: f64,
    setpoint: f64,
    pid_enabled: bool,
    output_clamp: Shaping,
    feedforward: Option<Feedforward>,
    telemetry: Option<MotorTelemetry>,
}

impl<H: MotorHardware> PositionalMotor<H> {
    /// Drives toward `target`, switching to PID mode if needed.
    ///
    /// Tracking resumes from the current measurement; the loop state is not zeroed.
    ///
    /// # Errors
    /// - `InvalidSetpoint` if `target` is NaN or infinite. Nothing changes.
    pub fn set_setpoint(&mut self, target: Angle) -> Result<(), MotorError> {
        if !target.is_finite() {
            return Err(MotorError::InvalidSetpoint);
        }
        self.setpoint = target.in_unit(self.unit);
        self.enable_pid_control();
        Ok(())
    }

    /// Applies a demand directly, leaving PID mode.
    ///
    /// # Errors
    /// - `PositionalDemandMode` if `mode` is positional. Nothing changes.
    pub fn set_demand(&mut self, mode: ControlMode, demand: f64) -> Result<(), MotorError> {
        self.enter_direct_mode(mode, demand)?;
        self.hardware.motor_mut().set(mode, demand);
        Ok(())
    }

    /// Applies a demand with a feedforward term directly, leaving PID mode.
    ///
    /// # Errors
    /// - `PositionalDemandMode` if `mode` is positional. Nothing changes.
    pub fn set_demand_with_feedforward(
        &mut self,
        mode: ControlMode,
        demand: f64,
        feedforward: f64,
    ) -> Result<(), MotorError> {
        self.enter_direct_mode(mode, demand)?;
        self.hardware
            .motor_mut()
            .set_with_feedforward(mode, demand, feedforward);
        Ok(())
    }

    fn enter_direct_mode(&mut self, mode: ControlMode, demand: f64) -> Result<(), MotorError> {
        if mode.is_positional() {
            return Err(MotorError::PositionalDemandMode(mode));
        }
        self.disable_pid_control();
        // A demand in the PID output's own mode is where a later resume continues from
        if mode == self.control_mode {
            self.pid.track_output(demand);
        }
        Ok(())
    }

    /// Resumes PID mode toward the last setpoint.
    pub fn enable_pid_control(&mut self) {
        if !self.pid_enabled {
            debug!("PID control engaged, setpoint {}", self.setpoint);
            self.pid.activate();
            self.pid_enabled = true;
        }
    }

    fn disable_pid_control(&mut self) {
        if self.pid_enabled {
            debug!("PID control disengaged");
            self.pid.deactivate();
            self.pid_enabled = false;
        }
    }

    /// Whether the controller is in PID mode.
    pub fn is_pid_control_enabled(&self) -> bool {
        self.pid_enabled
    }

    /// Leaves PID mode and commands zero output.
    pub fn stop_motor(&mut self) {
        self.disable_pid_control();
        self.pid.track_output(0.0);
        self.hardware.motor_mut().set(ControlMode::DutyCycle, 0.0);
    }

    /// Whether the measured position is within the acceptable error of the setpoint, inclusive.
    ///
    /// The comparison is against the last PID setpoint even while in direct mode.
    pub fn at_position(&self) -> bool {
        let error = self.measured() - self.setpoint;
        FloatCore::abs(error) <= self.acceptable_error
    }

    /// The measured position.
    pub fn position(&self) -> Angle {
        self.hardware.encoder().position()
    }

    /// The last PID setpoint.
    pub fn setpoint(&self) -> Angle {
        Angle::new(self.setpoint, self.unit)
    }

    /// The measured velocity.
    pub fn velocity(&self) -> AngularVelocity {
        self.hardware.encoder().velocity()
    }

    /// The current drawn by the motor, in amps.
    pub fn applied_current(&self) -> f64 {
        self.hardware.motor().applied_current()
    }

    /// Overwrites the encoder reading, e.g. after homing against a hard stop.
    pub fn reset_position(&mut self, position: Angle) {
        self.hardware.encoder_mut().set_position(position);
    }

    /// The working unit of setpoint, measurement and acceptable error.
    pub fn unit(&self) -> AngleUnit {
        self.unit
    }

    /// Changes the working unit, rescaling the setpoint and the acceptable error so they describe
    /// the same physical angles.
    ///
    /// PID gains are not touched. The feedforward sees the measured [`Angle`] and is unaffected.
    pub fn set_unit(&mut self, unit: AngleUnit) {
        if unit == self.unit {
            return;
        }
        let scale = unit.per_rotation() / self.unit.per_rotation();
        self.setpoint *= scale;
        self.acceptable_error *= scale;
        self.unit = unit;
        // Past inputs are in the old unit; re-seed so the derivative does not see a jump
        if self.pid_enabled {
            self.pid.deactivate();
            self.pid.activate();
        }
    }

    /// The tolerance used by [`at_position`](Self::at_position), in the working unit.
    pub fn acceptable_error(&self) -> f64 {
        self.acceptable_error
    }

    /// The mode PID output is applied in.
    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    /// The PID tuning.
    pub fn pid_config(&self) -> &PidConfig<f64> {
        self.pid.config()
    }

    /// The PID tuning, for adjustment on the fly.
    pub fn pid_config_mut(&mut self) -> &mut PidConfig<f64> {
        self.pid.config_mut()
    }

    /// The owned devices.
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// The owned devices, mutably.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Leaves PID mode, disables the motor and releases the telemetry sink.
    pub fn close(&mut self) {
        self.disable_pid_control();
        self.hardware.motor_mut().disable();
        self.telemetry = None;
    }

    fn measured(&self) -> f64 {
        self.hardware.encoder().position().in_unit(self.unit)
    }
}

impl<H: MotorHardware> Periodic for PositionalMotor<H> {
    fn periodic(&mut self) {
        self.clock = self.clock + self.pid.config().sample_time();

        if self.pid_enabled {
            let measured = self.measured();
            let output = self.pid.compute(measured, self.setpoint, self.clock, None);
            let output = (self.output_clamp)(output);
            match &self.feedforward {
                Some(feedforward) => {
                    let feedforward = feedforward(self.position());
                    self.hardware
                        .motor_mut()
                        .set_with_feedforward(self.control_mode, output, feedforward)
                }
                None => self.hardware.motor_mut().set(self.control_mode, output),
            }
        }

        if self.telemetry.is_some() {
            let sample = MotorSample {
                position: self.measured(),
                setpoint: self.setpoint,
                at_position: self.at_position(),
                current: self.applied_current(),
                pid_enabled: self.pid_enabled,
            };
            if let Some(telemetry) = &mut self.telemetry {
                telemetry.publish(sample);
            }
        }
    }
}

/// Configures a [`PositionalMotor`].
///
/// Defaults: duty-cycle output, an acceptable error of 5.0, rotations as the working unit, zero
/// PID gains, identity output clamp, no feedforward and no telemetry.
pub struct PositionalMotorBuilder<H: MotorHardware> {
    hardware: H,
    control_mode: ControlMode,
    acceptable_error: f64,
    unit: AngleUnit,
    gains: Option<(f64, f64, f64)>,
    pid_config: PidConfig<f64>,
    output_clamp: Shaping,
    feedforward: Option<Feedforward>,
    initial_setpoint: Option<Angle>,
    telemetry: Option<MotorTelemetry>,
}

impl<M: Motor, E: Encoder> PositionalMotorBuilder<Separate<M, E>> {
    /// Starts a builder for a motor with an external encoder.
    pub fn new(motor: M, encoder: E) -> Self {
        Self::with_hardware(Separate { motor, encoder })
    }
}

impl<M: Motor + Encoder> PositionalMotorBuilder<Integrated<M>> {
    /// Starts a builder for a motor with a built-in encoder.
    pub fn integrated(motor: M) -> Self {
        Self::with_hardware(Integrated(motor))
    }
}

impl<H: MotorHardware> PositionalMotorBuilder<H> {
    /// Starts a builder for any owned hardware.
    pub fn with_hardware(hardware: H) -> Self {
        Self {
            hardware,
            control_mode: ControlMode::DutyCycle,
            acceptable_error: 5.0,
            unit: AngleUnit::Rotations,
            gains: None,
            pid_config: PidConfig::default(),
            output_clamp: Box::new(|output| output),
            feedforward: None,
            initial_setpoint: None,
            telemetry: None,
        }
    }

    /// Sets the mode PID output is applied in. Must not be positional.
    pub fn control_mode(mut self, mode: ControlMode) -> Self {
        self.control_mode = mode;
        self
    }

    /// Sets the [`at_position`](PositionalMotor::at_position) tolerance, in the working unit.
    pub fn acceptable_error(mut self, acceptable_error: f64) -> Self {
        self.acceptable_error = acceptable_error;
        self
    }

    /// Sets the working unit.
    pub fn unit(mut self, unit: AngleUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the PID gains, overriding those of [`pid_config`](Self::pid_config).
    pub fn pid_gains(mut self, kp: f64, ki: f64, kd: f64) -> Self {
        self.gains = Some((kp, ki, kd));
        self
    }

    /// Sets the full PID configuration.
    pub fn pid_config(mut self, config: PidConfig<f64>) -> Self {
        self.pid_config = config;
        self
    }

    /// Shapes PID output before it reaches the motor, e.g. to limit it.
    pub fn output_clamp(mut self, clamp: impl Fn(f64) -> f64 + 'static) -> Self {
        self.output_clamp = Box::new(clamp);
        self
    }

    /// Adds a feedforward computed from the measured position, e.g. to hold an arm against
    /// gravity.
    pub fn feedforward(mut self, feedforward: impl Fn(Angle) -> f64 + 'static) -> Self {
        self.feedforward = Some(Box::new(feedforward));
        self
    }

    /// Starts the controller in PID mode holding `setpoint`.
    ///
    /// Without an initial setpoint the controller starts in direct mode with its setpoint at the
    /// measured position.
    pub fn initial_setpoint(mut self, setpoint: Angle) -> Self {
        self.initial_setpoint = Some(setpoint);
        self
    }

    /// Publishes position, setpoint, at-position, current and mode under `table` every cycle.
    pub fn telemetry(mut self, table: &str, sink: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Some(MotorTelemetry::new(table, Box::new(sink)));
        self
    }

    /// Validates the configuration and creates the controller.
    ///
    /// # Errors
    /// - `PositionalControlMode` if the control mode is positional.
    /// - `InvalidAcceptableError` if the tolerance is negative or not finite.
    /// - `InvalidSetpoint` if the initial setpoint is not finite.
    /// - `Pid` if the gains are rejected.
    pub fn build(self) -> Result<PositionalMotor<H>, MotorError> {
        if self.control_mode.is_positional() {
            return Err(MotorError::PositionalControlMode(self.control_mode));
        }
        if !(self.acceptable_error >= 0.0 && self.acceptable_error.is_finite()) {
            return Err(MotorError::InvalidAcceptableError);
        }

        let mut pid_config = self.pid_config;
        if let Some((kp, ki, kd)) = self.gains {
            pid_config.set_gains(kp, ki, kd)?;
        }
        let mut pid = PidController::new_uninit(pid_config);

        let (setpoint, pid_enabled) = match self.initial_setpoint {
            Some(setpoint) if !setpoint.is_finite() => return Err(MotorError::InvalidSetpoint),
            Some(setpoint) => (setpoint.in_unit(self.unit), true),
            None => {
                pid.deactivate();
                (self.hardware.encoder().position().in_unit(self.unit), false)
            }
        };

        Ok(PositionalMotor {
            hardware: self.hardware,
            pid,
            clock: CycleClock::default(),
            control_mode: self.control_mode,
            unit: self.unit,
            acceptable_error: self.acceptable_error,
            setpoint,
            pid_enabled,
            output_clamp: self.output_clamp,
            feedforward: self.feedforward,
            telemetry: self.telemetry,
        })
    }
}

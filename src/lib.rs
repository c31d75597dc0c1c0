#![warn(missing_docs)]

//! # Robot Control Core
//!
//! This library provides the control core of a competition robot: positional motor control,
//! runtime feature gating and a priority-based status lightshow.
//!
//! Everything runs on the robot's single control thread. A host scheduler calls
//! [`Periodic::periodic`](periodic::Periodic::periodic) once per cycle (typically every 20 ms) on
//! each subsystem; nothing in this crate blocks or spawns threads.
//!
//! ## Features
//!
//! - [`PositionalMotor`](positional::PositionalMotor): a motor that is either driven by PID toward
//!   a setpoint or by direct demands, with bumpless switching between the two.
//! - A discrete PID engine with anti-windup, derivative filtering and bumpless (de)activation.
//! - [`FeatureRegistry`](feature::FeatureRegistry): flags that only change while the robot is
//!   disabled, with fail-safe handling of missing features.
//! - [`FeatureGated`](gated::FeatureGated) values and
//!   [`FeatureGatedCommand`](command::FeatureGatedCommand)s selected by the first enabled feature.
//! - [`Lightshow`](lightshow::Lightshow): the most recently activated condition wins the LEDs.
//!
//! ## Usage
//!
//! ### Positional control
//!
//! ```rust
//! use robot_core::hardware::{ControlMode, Encoder, Motor};
//! use robot_core::periodic::Periodic;
//! use robot_core::positional::PositionalMotorBuilder;
//! use robot_core::units::{Angle, AngleUnit, AngularVelocity};
//!
//! #[derive(Default)]
//! struct Arm {
//!     position: Angle,
//!     demand: f64,
//! }
//!
//! impl Motor for Arm {
//!     fn set(&mut self, _mode: ControlMode, demand: f64) {
//!         self.demand = demand;
//!     }
//!     fn set_with_feedforward(&mut self, _mode: ControlMode, demand: f64, feedforward: f64) {
//!         self.demand = demand + feedforward;
//!     }
//!     fn disable(&mut self) {
//!         self.demand = 0.0;
//!     }
//!     fn applied_current(&self) -> f64 {
//!         0.0
//!     }
//! }
//!
//! impl Encoder for Arm {
//!     fn position(&self) -> Angle {
//!         self.position
//!     }
//!     fn set_position(&mut self, position: Angle) {
//!         self.position = position;
//!     }
//!     fn velocity(&self) -> AngularVelocity {
//!         AngularVelocity::ZERO
//!     }
//! }
//!
//! let mut arm = PositionalMotorBuilder::integrated(Arm::default())
//!     .unit(AngleUnit::Degrees)
//!     .pid_gains(0.01, 0.0, 0.0)
//!     .acceptable_error(2.0)
//!     .build()
//!     .expect("Invalid arm configuration");
//!
//! arm.set_setpoint(Angle::from_degrees(90.0)).unwrap();
//! arm.periodic();
//! assert!(arm.hardware().0.demand > 0.0);
//!
//! // Manual control takes over until PID control is re-enabled
//! arm.set_demand(ControlMode::DutyCycle, -0.2).unwrap();
//! assert!(!arm.is_pid_control_enabled());
//! arm.enable_pid_control();
//! assert_eq!(arm.setpoint(), Angle::from_degrees(90.0));
//! ```
//!
//! ### Stateful PID Controller
//!
//! ```rust
//! use robot_core::pid::{PidConfigBuilder, PidController};
//! use robot_core::time::Millis;
//!
//! let config = PidConfigBuilder::default()
//!     .kp(2.0)
//!     .ki(0.2)
//!     .build()
//!     .expect("Invalid PID config");
//! let mut pid = PidController::<Millis, f64>::new_uninit(config);
//!
//! let output = pid.compute(1.0, 2.0, Millis(20), None);
//! assert!(output > 0.0);
//! ```
#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// Angles and angular velocities in configurable units.
pub mod units;

/// The discrete PID engine behind positional control.
pub mod pid;

/// Time-like objects used to pace the PID engine.
pub mod time;

/// Motor and encoder capabilities.
pub mod hardware;

/// Key/value telemetry publishing.
pub mod telemetry;

/// Dual-mode positional motor control.
pub mod positional;

/// Per-cycle scheduling.
pub mod periodic;

/// Runtime feature flags.
pub mod feature;

/// Values selected by feature flags.
pub mod gated;

/// Commands and feature-gated command selection.
pub mod command;

/// Prioritized status LED colors.
pub mod lightshow;

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

use std::time::Duration;

use fixtures::test_hardware::{SimEncoder, SimMotor};

use robot_core::hardware::{ControlMode, Integrated};
use robot_core::periodic::Periodic;
use robot_core::pid::{PidConfigBuilder, PidConfigError};
use robot_core::positional::{MotorError, PositionalMotor, PositionalMotorBuilder};
use robot_core::units::{Angle, AngleUnit};

fn arm_at(position: Angle) -> (SimMotor, PositionalMotorBuilder<Integrated<SimMotor>>) {
    let motor = SimMotor::at(position);
    let builder = PositionalMotorBuilder::integrated(motor.clone());
    (motor, builder)
}

fn holding(setpoint: f64, kp: f64, ki: f64) -> (SimMotor, PositionalMotor<Integrated<SimMotor>>) {
    let (motor, builder) = arm_at(Angle::from_rotations(setpoint));
    let arm = builder
        .pid_gains(kp, ki, 0.0)
        .initial_setpoint(Angle::from_rotations(setpoint))
        .build()
        .unwrap();
    (motor, arm)
}

mod test_builder {
    use super::*;

    #[test]
    fn test_defaults() {
        let (_, builder) = arm_at(Angle::ZERO);
        let arm = builder.build().unwrap();

        assert_eq!(arm.control_mode(), ControlMode::DutyCycle);
        assert_eq!(arm.acceptable_error(), 5.0);
        assert_eq!(arm.unit(), AngleUnit::Rotations);
        assert_eq!(arm.pid_config().gains(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_rejects_positional_control_modes() {
        for mode in [ControlMode::Position, ControlMode::MotionMagic] {
            let (_, builder) = arm_at(Angle::ZERO);
            assert_eq!(
                builder.control_mode(mode).build().err(),
                Some(MotorError::PositionalControlMode(mode))
            );
        }

        for mode in [ControlMode::Voltage, ControlMode::Current, ControlMode::Velocity] {
            let (_, builder) = arm_at(Angle::ZERO);
            assert!(builder.control_mode(mode).build().is_ok());
        }
    }

    #[test]
    fn test_rejects_invalid_tolerance_and_gains() {
        for tolerance in [-0.1, f64::NAN, f64::INFINITY] {
            let (_, builder) = arm_at(Angle::ZERO);
            assert_eq!(
                builder.acceptable_error(tolerance).build().err(),
                Some(MotorError::InvalidAcceptableError)
            );
        }

        let (_, builder) = arm_at(Angle::ZERO);
        assert_eq!(
            builder.pid_gains(-1.0, 0.0, 0.0).build().err(),
            Some(MotorError::Pid(PidConfigError::InvalidProportionalGain))
        );

        let (_, builder) = arm_at(Angle::ZERO);
        assert_eq!(
            builder.initial_setpoint(Angle::from_rotations(f64::NAN)).build().err(),
            Some(MotorError::InvalidSetpoint)
        );
    }

    #[test]
    fn test_starts_in_direct_mode_without_initial_setpoint() {
        let (motor, builder) = arm_at(Angle::from_rotations(2.5));
        let mut arm = builder.pid_gains(1.0, 0.0, 0.0).build().unwrap();

        assert!(!arm.is_pid_control_enabled());
        assert_eq!(arm.setpoint(), Angle::from_rotations(2.5));
        assert!(arm.at_position());

        arm.periodic();
        assert_eq!(motor.writes(), 0);
    }

    #[test]
    fn test_starts_holding_initial_setpoint() {
        let (motor, builder) = arm_at(Angle::ZERO);
        let mut arm = builder
            .pid_gains(1.0, 0.0, 0.0)
            .initial_setpoint(Angle::from_rotations(0.5))
            .build()
            .unwrap();

        assert!(arm.is_pid_control_enabled());
        arm.periodic();
        assert_eq!(motor.demand(), 0.5);
        assert_eq!(motor.mode(), Some(ControlMode::DutyCycle));
    }
}

mod test_mode_switching {
    use super::*;

    #[test]
    fn test_direct_demand_leaves_pid_mode() {
        let (motor, mut arm) = holding(1.0, 1.0, 0.0);
        assert!(arm.is_pid_control_enabled());

        assert!(arm.set_demand(ControlMode::Voltage, 3.0).is_ok());
        assert!(!arm.is_pid_control_enabled());
        assert_eq!(motor.mode(), Some(ControlMode::Voltage));
        assert_eq!(motor.demand(), 3.0);

        // Ticks in direct mode leave the demand alone
        let writes = motor.writes();
        for _ in 0..5 {
            arm.periodic();
        }
        assert_eq!(motor.writes(), writes);
        assert_eq!(motor.demand(), 3.0);
    }

    #[test]
    fn test_set_setpoint_resumes_pid_mode() {
        let (motor, mut arm) = holding(0.0, 1.0, 0.0);
        assert!(arm.set_demand(ControlMode::DutyCycle, 0.2).is_ok());

        assert!(arm.set_setpoint(Angle::from_rotations(0.75)).is_ok());
        assert!(arm.is_pid_control_enabled());
        assert_eq!(arm.setpoint(), Angle::from_rotations(0.75));

        arm.periodic();
        assert_eq!(motor.demand(), 0.75);
    }

    #[test]
    fn test_rejects_positional_demand() {
        let (motor, mut arm) = holding(1.0, 1.0, 0.0);
        arm.periodic();
        let writes = motor.writes();

        for mode in [ControlMode::Position, ControlMode::MotionMagic] {
            assert_eq!(
                arm.set_demand(mode, 1.0),
                Err(MotorError::PositionalDemandMode(mode))
            );
            assert_eq!(
                arm.set_demand_with_feedforward(mode, 1.0, 0.1),
                Err(MotorError::PositionalDemandMode(mode))
            );
        }

        // Nothing changed
        assert!(arm.is_pid_control_enabled());
        assert_eq!(motor.writes(), writes);
    }

    #[test]
    fn test_rejects_non_finite_setpoint() {
        let (_, mut arm) = holding(1.0, 1.0, 0.0);
        assert!(arm.set_demand(ControlMode::DutyCycle, 0.0).is_ok());

        for target in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                arm.set_setpoint(Angle::from_rotations(target)),
                Err(MotorError::InvalidSetpoint)
            );
        }
        assert!(!arm.is_pid_control_enabled());
        assert_eq!(arm.setpoint(), Angle::from_rotations(1.0));
    }

    #[test]
    fn test_demand_with_feedforward() {
        let (motor, mut arm) = holding(0.0, 1.0, 0.0);
        assert!(arm
            .set_demand_with_feedforward(ControlMode::Voltage, 2.0, 0.5)
            .is_ok());

        let plant = motor.0.borrow();
        assert_eq!(plant.demand, 2.0);
        assert_eq!(plant.feedforward, 0.5);
    }

    #[test]
    fn test_stop_motor() {
        let (motor, mut arm) = holding(0.0, 1.0, 0.0);
        assert!(arm.set_setpoint(Angle::from_rotations(3.0)).is_ok());
        arm.periodic();
        assert_eq!(motor.demand(), 3.0);

        arm.stop_motor();
        assert!(!arm.is_pid_control_enabled());
        assert_eq!(motor.mode(), Some(ControlMode::DutyCycle));
        assert_eq!(motor.demand(), 0.0);

        arm.periodic();
        assert_eq!(motor.demand(), 0.0);
    }
}

mod test_bumpless_transfer {
    use super::*;

    #[test]
    fn test_resume_continues_from_manual_demand() {
        let (motor, mut arm) = holding(1.0, 1.0, 0.5);
        arm.periodic();

        assert!(arm.set_demand(ControlMode::DutyCycle, 0.3).is_ok());
        arm.periodic();
        arm.periodic();

        arm.enable_pid_control();
        arm.periodic();

        // Zero error on resume: the integrator carries the manual demand
        assert_eq!(motor.demand(), 0.3);
    }

    #[test]
    fn test_resume_does_not_jump() {
        let (motor, mut arm) = holding(0.0, 1.0, 0.5);
        assert!(arm.set_demand(ControlMode::DutyCycle, 0.4).is_ok());

        motor.move_to(Angle::from_rotations(-0.1));
        arm.enable_pid_control();
        arm.periodic();

        // P term for the new error on top of the carried demand, plus one integration step
        let expected = 0.1 + 0.4 + 0.5 * 0.02 * 0.1;
        approx::assert_relative_eq!(motor.demand(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_demand_in_other_mode_is_not_carried() {
        let (motor, mut arm) = holding(1.0, 1.0, 0.5);
        assert!(arm.set_demand(ControlMode::Voltage, 6.0).is_ok());

        arm.enable_pid_control();
        arm.periodic();
        assert_eq!(motor.mode(), Some(ControlMode::DutyCycle));
        assert!(motor.demand() < 6.0);
    }
}

mod test_at_position {
    use super::*;

    #[test]
    fn test_tolerance_is_inclusive() {
        let (motor, builder) = arm_at(Angle::from_rotations(1.0));
        let arm = builder
            .acceptable_error(0.25)
            .initial_setpoint(Angle::from_rotations(1.0))
            .build()
            .unwrap();

        for (position, expected) in [(1.0, true), (1.25, true), (0.75, true), (1.3, false), (0.5, false)]
        {
            motor.move_to(Angle::from_rotations(position));
            assert_eq!(arm.at_position(), expected, "at {position} rotations");
        }
    }

    #[test]
    fn test_compares_against_last_setpoint_in_direct_mode() {
        let (motor, mut arm) = holding(1.0, 1.0, 0.0);
        assert!(arm.set_demand(ControlMode::DutyCycle, 0.5).is_ok());

        motor.move_to(Angle::from_rotations(20.0));
        assert!(!arm.at_position());

        motor.move_to(Angle::from_rotations(1.0));
        assert!(arm.at_position());
    }

    #[test]
    fn test_converges_to_ninety_degrees() {
        let motor = SimMotor::at(Angle::ZERO);
        let mut arm = PositionalMotorBuilder::integrated(motor.clone())
            .unit(AngleUnit::Degrees)
            .pid_gains(0.01, 0.0, 0.0)
            .acceptable_error(2.0)
            .build()
            .unwrap();

        assert!(arm.set_setpoint(Angle::from_degrees(90.0)).is_ok());
        assert!(!arm.at_position());

        let mut cycles = 0;
        let mut last_error = f64::INFINITY;
        while !arm.at_position() {
            arm.periodic();
            assert!(motor.demand() > 0.0);
            motor.step(1.0 / 36.0);

            let error = 90.0 - arm.position().degrees();
            assert!(error < last_error, "approach should be monotonic");
            last_error = error;

            cycles += 1;
            assert!(cycles < 200, "did not converge");
        }
        assert!((arm.position().degrees() - 90.0).abs() <= 2.0);
    }

    #[test]
    fn test_stays_at_position_through_small_overshoot() {
        let (motor, builder) = arm_at(Angle::ZERO);
        let mut arm = builder
            .unit(AngleUnit::Degrees)
            .pid_gains(0.01, 0.0, 0.0)
            .build()
            .unwrap();
        assert!(arm.set_setpoint(Angle::from_degrees(90.0)).is_ok());

        for degrees in [84.0, 86.0, 88.0, 93.0, 94.5, 91.0, 90.0] {
            motor.move_to(Angle::from_degrees(degrees));
            arm.periodic();
            assert_eq!(arm.at_position(), degrees > 85.0, "at {degrees} degrees");
        }
    }
}

mod test_units_and_shaping {
    use super::*;

    #[test]
    fn test_set_unit_rescales_setpoint_and_tolerance() {
        let (motor, builder) = arm_at(Angle::ZERO);
        let mut arm = builder
            .pid_gains(1.0, 0.0, 0.0)
            .acceptable_error(0.25)
            .initial_setpoint(Angle::from_rotations(0.5))
            .build()
            .unwrap();
        arm.periodic();
        assert_eq!(motor.demand(), 0.5);

        arm.set_unit(AngleUnit::Degrees);
        assert_eq!(arm.unit(), AngleUnit::Degrees);
        assert_eq!(arm.acceptable_error(), 90.0);
        assert_eq!(arm.setpoint(), Angle::from_rotations(0.5));
        assert!(arm.is_pid_control_enabled());

        arm.periodic();
        assert_eq!(motor.demand(), 180.0);

        motor.move_to(Angle::from_degrees(90.0));
        assert!(arm.at_position());
    }

    #[test]
    fn test_gains_act_in_working_unit() {
        let (motor, builder) = arm_at(Angle::ZERO);
        let mut arm = builder
            .unit(AngleUnit::Degrees)
            .pid_gains(1.0, 0.0, 0.0)
            .build()
            .unwrap();

        assert!(arm.set_setpoint(Angle::from_rotations(0.5)).is_ok());
        arm.periodic();
        assert_eq!(motor.demand(), 180.0);
        assert_eq!(arm.setpoint(), Angle::from_degrees(180.0));
    }

    #[test]
    fn test_output_clamp_shapes_pid_output() {
        let (motor, builder) = arm_at(Angle::ZERO);
        let mut arm = builder
            .pid_gains(1.0, 0.0, 0.0)
            .output_clamp(|output| output.clamp(-0.5, 0.5))
            .build()
            .unwrap();

        assert!(arm.set_setpoint(Angle::from_rotations(10.0)).is_ok());
        arm.periodic();
        assert_eq!(motor.demand(), 0.5);

        assert!(arm.set_setpoint(Angle::from_rotations(-10.0)).is_ok());
        arm.periodic();
        assert_eq!(motor.demand(), -0.5);
    }

    #[test]
    fn test_feedforward_from_measured_position() {
        let (motor, builder) = arm_at(Angle::from_rotations(0.25));
        let mut arm = builder
            .control_mode(ControlMode::Voltage)
            .pid_gains(1.0, 0.0, 0.0)
            .feedforward(|position: Angle| 2.0 * position.rotations())
            .initial_setpoint(Angle::from_rotations(0.25))
            .build()
            .unwrap();

        arm.periodic();
        let plant = motor.0.borrow();
        assert_eq!(plant.mode, Some(ControlMode::Voltage));
        assert_eq!(plant.demand, 0.0);
        assert_eq!(plant.feedforward, 0.5);
    }

    #[test]
    fn test_feedforward_input_survives_unit_change() {
        let (motor, builder) = arm_at(Angle::from_rotations(0.25));
        let mut arm = builder
            .control_mode(ControlMode::Voltage)
            .pid_gains(1.0, 0.0, 0.0)
            .feedforward(|position: Angle| 2.0 * position.rotations())
            .initial_setpoint(Angle::from_rotations(0.25))
            .build()
            .unwrap();
        arm.periodic();
        assert_eq!(motor.0.borrow().feedforward, 0.5);

        arm.set_unit(AngleUnit::Degrees);
        arm.periodic();
        assert_eq!(motor.0.borrow().feedforward, 0.5);

        arm.set_unit(AngleUnit::Radians);
        motor.move_to(Angle::from_rotations(0.5));
        arm.periodic();
        assert_eq!(motor.0.borrow().feedforward, 1.0);
    }
}

mod test_sample_time {
    use super::*;

    fn sampled_every(sample_time: Duration) -> (SimMotor, PositionalMotor<Integrated<SimMotor>>) {
        let (motor, builder) = arm_at(Angle::ZERO);
        let config = PidConfigBuilder::default()
            .kp(1.0)
            .sample_time(sample_time)
            .build()
            .unwrap();
        let arm = builder
            .pid_config(config)
            .initial_setpoint(Angle::from_rotations(1.0))
            .build()
            .unwrap();
        (motor, arm)
    }

    #[test]
    fn test_sub_millisecond_sample_time_keeps_computing() {
        let (motor, mut arm) = sampled_every(Duration::from_micros(500));
        arm.periodic();
        assert_eq!(motor.demand(), 1.0);

        motor.move_to(Angle::from_rotations(0.9));
        for _ in 0..10 {
            arm.periodic();
            approx::assert_relative_eq!(motor.demand(), 0.1, epsilon = 1e-12);
        }
        assert_eq!(motor.writes(), 11);
    }

    #[test]
    fn test_fractional_millisecond_sample_time_computes_every_tick() {
        let (motor, mut arm) = sampled_every(Duration::from_micros(10_500));
        for tick in 1..=6 {
            motor.move_to(Angle::from_rotations(0.1 * tick as f64));
            arm.periodic();
            assert_eq!(motor.writes(), tick);
            approx::assert_relative_eq!(motor.demand(), 1.0 - 0.1 * tick as f64, epsilon = 1e-12);
        }
    }
}

mod test_hardware_ownership {
    use super::*;

    #[test]
    fn test_separate_encoder_provides_feedback() {
        let motor = SimMotor::at(Angle::from_rotations(3.0));
        let encoder = SimEncoder(SimMotor::at(Angle::from_rotations(0.5)).0);

        let mut arm = PositionalMotorBuilder::new(motor.clone(), encoder.clone())
            .pid_gains(1.0, 0.0, 0.0)
            .initial_setpoint(Angle::from_rotations(1.0))
            .build()
            .unwrap();

        arm.periodic();
        assert_eq!(motor.demand(), 0.5);
        assert_eq!(arm.position(), Angle::from_rotations(0.5));

        arm.reset_position(Angle::ZERO);
        assert_eq!(encoder.0.borrow().position, Angle::ZERO);
        assert_eq!(motor.angle(), Angle::from_rotations(3.0));
    }

    #[test]
    fn test_reset_position_integrated() {
        let (motor, mut arm) = holding(1.0, 1.0, 0.0);
        arm.reset_position(Angle::from_rotations(4.0));
        assert_eq!(motor.angle(), Angle::from_rotations(4.0));
        assert_eq!(arm.position(), Angle::from_rotations(4.0));
    }

    #[test]
    fn test_close_disables_motor() {
        let (motor, mut arm) = holding(0.0, 1.0, 0.0);
        assert!(arm.set_setpoint(Angle::from_rotations(1.0)).is_ok());
        arm.periodic();

        arm.close();
        assert!(!arm.is_pid_control_enabled());
        assert!(motor.0.borrow().disabled);

        let writes = motor.writes();
        arm.periodic();
        assert_eq!(motor.writes(), writes);
    }
}

mod test_telemetry {
    use super::fixtures::test_telemetry::{RecordingSink, Value};
    use super::*;

    #[test]
    fn test_publishes_every_cycle() {
        let sink = RecordingSink::default();
        let (motor, builder) = arm_at(Angle::from_rotations(0.5));
        let mut arm = builder
            .pid_gains(1.0, 0.0, 0.0)
            .acceptable_error(0.25)
            .initial_setpoint(Angle::from_rotations(1.0))
            .telemetry("arm", sink.clone())
            .build()
            .unwrap();

        motor.0.borrow_mut().current = 12.5;
        arm.periodic();

        assert_eq!(sink.get("arm/position"), Some(Value::Number(0.5)));
        assert_eq!(sink.get("arm/setpoint"), Some(Value::Number(1.0)));
        assert_eq!(sink.get("arm/at_position"), Some(Value::Bool(false)));
        assert_eq!(sink.get("arm/current"), Some(Value::Number(12.5)));
        assert_eq!(sink.get("arm/pid_enabled"), Some(Value::Bool(true)));

        assert!(arm.set_demand(ControlMode::DutyCycle, 0.0).is_ok());
        motor.move_to(Angle::from_rotations(1.0));
        arm.periodic();

        assert_eq!(sink.get("arm/at_position"), Some(Value::Bool(true)));
        assert_eq!(sink.get("arm/pid_enabled"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_close_releases_sink() {
        let sink = RecordingSink::default();
        let (_, builder) = arm_at(Angle::ZERO);
        let mut arm = builder.telemetry("wrist", sink.clone()).build().unwrap();

        arm.periodic();
        assert!(sink.get("wrist/position").is_some());

        arm.close();
        sink.0.borrow_mut().clear();
        arm.periodic();
        assert!(sink.0.borrow().is_empty());
        assert_eq!(std::rc::Rc::strong_count(&sink.0), 1);
    }
}

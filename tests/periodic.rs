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

use std::cell::RefCell;
use std::rc::Rc;

use robot_core::periodic::{register_subsystem, Periodic, PeriodicRegistry, PeriodicScheduler, RobotState};

#[derive(Debug, Default)]
struct Counter {
    cycles: usize,
    simulated: usize,
}

impl Periodic for Counter {
    fn periodic(&mut self) {
        self.cycles += 1;
    }

    fn simulation_periodic(&mut self) {
        self.simulated += 1;
    }
}

#[test]
fn test_robot_state() {
    assert_eq!(RobotState::default(), RobotState::Disabled);
    assert!(RobotState::Disabled.is_disabled());
    for state in [RobotState::Autonomous, RobotState::Teleop, RobotState::Test] {
        assert!(state.is_enabled());
        assert!(!state.is_disabled());
    }
}

#[test]
fn test_callbacks_run_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = PeriodicScheduler::new();
    assert!(scheduler.is_empty());

    for name in ["drive", "arm", "lights"] {
        let log = Rc::clone(&log);
        scheduler.add_periodic(Box::new(move |state: RobotState| log.borrow_mut().push((name, state))));
    }
    assert_eq!(scheduler.len(), 3);

    scheduler.run_cycle(RobotState::Autonomous);
    assert_eq!(
        *log.borrow(),
        [
            ("drive", RobotState::Autonomous),
            ("arm", RobotState::Autonomous),
            ("lights", RobotState::Autonomous)
        ]
    );
}

#[test]
fn test_registered_subsystem_runs_every_cycle() {
    let counter = Rc::new(RefCell::new(Counter::default()));
    let mut scheduler = PeriodicScheduler::new();
    register_subsystem(&mut scheduler, &counter);

    for _ in 0..3 {
        scheduler.run_cycle(RobotState::Teleop);
    }
    scheduler.run_simulation_cycle(RobotState::Teleop);

    assert_eq!(counter.borrow().cycles, 3);
    assert_eq!(counter.borrow().simulated, 1);
}

#[test]
fn test_busy_subsystem_is_skipped() {
    let counter = Rc::new(RefCell::new(Counter::default()));
    let mut scheduler = PeriodicScheduler::new();
    register_subsystem(&mut scheduler, &counter);

    {
        let _held = counter.borrow_mut();
        scheduler.run_cycle(RobotState::Teleop);
        scheduler.run_simulation_cycle(RobotState::Teleop);
    }
    scheduler.run_cycle(RobotState::Teleop);

    assert_eq!(counter.borrow().cycles, 1);
    assert_eq!(counter.borrow().simulated, 0);
}

#[test]
fn test_registry_as_trait_object() {
    let counter = Rc::new(RefCell::new(Counter::default()));
    let mut scheduler = PeriodicScheduler::new();
    let registry: &mut dyn PeriodicRegistry = &mut scheduler;
    register_subsystem(registry, &counter);

    scheduler.run_cycle(RobotState::Disabled);
    assert_eq!(counter.borrow().cycles, 1);
}

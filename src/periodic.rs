// Per-cycle scheduling seam between the host loop and subsystems
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

//! The once-per-cycle scheduling seam.
//!
//! A host control loop (outside this crate) ticks at a fixed period, typically 20 ms, on a single
//! thread. Components register callbacks through [`PeriodicRegistry`]; the host invokes them in
//! registration order with a snapshot of the robot's run state. [`PeriodicScheduler`] is a
//! ready-made registry for hosts and tests that drive the cycle themselves.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use log::warn;

/// The operating state of the robot for one control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotState {
    /// Outputs are inert; configuration may change.
    #[default]
    Disabled,
    /// Running an autonomous routine.
    Autonomous,
    /// Under driver control.
    Teleop,
    /// Running a test routine.
    Test,
}

impl RobotState {
    /// Whether the robot is idle.
    pub const fn is_disabled(self) -> bool {
        matches!(self, RobotState::Disabled)
    }

    /// Whether the robot is actively running.
    pub const fn is_enabled(self) -> bool {
        !self.is_disabled()
    }
}

/// Something updated once per control cycle.
pub trait Periodic {
    /// Runs one control cycle. Must not block.
    fn periodic(&mut self);

    /// Runs one simulation cycle, after [`Periodic::periodic`], when the host simulates hardware.
    fn simulation_periodic(&mut self) {}
}

/// A callback invoked once per cycle.
pub type PeriodicCallback = Box<dyn FnMut(RobotState)>;

/// Registration of per-cycle callbacks.
pub trait PeriodicRegistry {
    /// Registers a callback for every control cycle.
    fn add_periodic(&mut self, callback: PeriodicCallback);

    /// Registers a callback for every simulation cycle.
    fn add_simulation_periodic(&mut self, callback: PeriodicCallback);
}

/// Registers a shared subsystem so that its [`Periodic`] hooks run every cycle.
///
/// A cycle in which the subsystem is already borrowed elsewhere is skipped with a warning rather
/// than aborting the control loop.
pub fn register_subsystem<R, P>(registry: &mut R, subsystem: &Rc<RefCell<P>>)
where
    R: PeriodicRegistry + ?Sized,
    P: Periodic + 'static,
{
    let main = Rc::clone(subsystem);
    registry.add_periodic(Box::new(move |_: RobotState| match main.try_borrow_mut() {
        Ok(mut subsystem) => subsystem.periodic(),
        Err(_) => warn!("subsystem busy, skipping periodic"),
    }));

    let sim = Rc::clone(subsystem);
    registry.add_simulation_periodic(Box::new(move |_: RobotState| match sim.try_borrow_mut() {
        Ok(mut subsystem) => subsystem.simulation_periodic(),
        Err(_) => warn!("subsystem busy, skipping simulation periodic"),
    }));
}

/// A registry that runs its callbacks when told to.
#[derive(Default)]
pub struct PeriodicScheduler {
    periodic: Vec<PeriodicCallback>,
    simulation: Vec<PeriodicCallback>,
}

impl PeriodicScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every periodic callback once, in registration order.
    pub fn run_cycle(&mut self, state: RobotState) {
        for callback in &mut self.periodic {
            callback(state);
        }
    }

    /// Runs every simulation callback once, in registration order.
    pub fn run_simulation_cycle(&mut self, state: RobotState) {
        for callback in &mut self.simulation {
            callback(state);
        }
    }

    /// Number of registered periodic callbacks.
    pub fn len(&self) -> usize {
        self.periodic.len()
    }

    /// Whether no periodic callback is registered.
    pub fn is_empty(&self) -> bool {
        self.periodic.is_empty()
    }
}

impl PeriodicRegistry for PeriodicScheduler {
    fn add_periodic(&mut self, callback: PeriodicCallback) {
        self.periodic.push(callback);
    }

    fn add_simulation_periodic(&mut self, callback: PeriodicCallback) {
        self.simulation.push(callback);
    }
}

// Runtime feature flags gated on the robot state
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

//! Runtime feature flags.
//!
//! A feature is declared once as a `const` [`FeatureId`] carrying its [`FeatureBehavior`]. The
//! [`FeatureRegistry`] holds the runtime flag of every feature it has seen, registering features
//! lazily on first lookup.
//!
//! Two rules keep a live robot safe:
//!
//! - Flags only change while the robot is disabled, so logic never switches mid-operation.
//! - A missing feature reference (`None`) always reads as disabled.
//!
//! ```
//! use std::rc::Rc;
//!
//! use robot_core::feature::{FeatureBehavior, FeatureId, FeatureRegistry};
//!
//! const AUTO_AIM: FeatureId = FeatureId::new("auto_aim", FeatureBehavior::InitiallyDisabled);
//!
//! let registry = Rc::new(FeatureRegistry::new());
//! assert!(!registry.enabled(AUTO_AIM));
//!
//! let auto_aim = registry.as_supplier([AUTO_AIM]);
//! registry.set_enabled(AUTO_AIM, true).expect("robot is disabled");
//! assert!(auto_aim());
//! ```

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use log::{info, warn};

use crate::periodic::{PeriodicRegistry, RobotState};

/// How a feature's flag starts out and whether it may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureBehavior {
    /// Starts disabled; may be enabled while the robot is disabled.
    InitiallyDisabled,
    /// Starts enabled; may be disabled while the robot is disabled.
    InitiallyEnabled,
    /// Disabled for good.
    AlwaysDisabled,
}

impl FeatureBehavior {
    /// The flag a newly registered feature gets.
    pub const fn initial_value(self) -> bool {
        matches!(self, FeatureBehavior::InitiallyEnabled)
    }

    /// Whether the flag may ever change.
    pub const fn is_toggleable(self) -> bool {
        !matches!(self, FeatureBehavior::AlwaysDisabled)
    }
}

/// The stable identity of a feature.
///
/// Features are keyed by name; the behavior of the first registration under a name is the one
/// that sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureId {
    name: &'static str,
    behavior: FeatureBehavior,
}

impl FeatureId {
    /// Declares a feature.
    pub const fn new(name: &'static str, behavior: FeatureBehavior) -> Self {
        Self { name, behavior }
    }

    /// The feature's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The feature's configured behavior.
    pub const fn behavior(&self) -> FeatureBehavior {
        self.behavior
    }
}

/// Why a flag change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum FeatureError {
    /// The feature is always disabled.
    #[cfg_attr(feature = "std", error("feature `{0}` is always disabled"))]
    AlwaysDisabled(&'static str),

    /// The robot is running; flags only change while it is disabled.
    #[cfg_attr(feature = "std", error("feature `{0}` cannot change while the robot is {1:?}"))]
    RobotEnabled(&'static str, RobotState),
}

#[derive(Debug, Clone, Copy)]
struct Flag {
    behavior: FeatureBehavior,
    enabled: bool,
    /// A conflicting declaration has already been logged.
    redeclared: bool,
}

/// The flags of every known feature.
///
/// The registry is built once by the application and shared, typically as an
/// `Rc<FeatureRegistry>`, with every consumer. It is single-threaded, like the control loop.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    flags: RefCell<BTreeMap<&'static str, Flag>>,
    robot_state: Cell<RobotState>,
}

impl FeatureRegistry {
    /// Creates an empty registry assuming a disabled robot.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_flag<T>(&self, feature: FeatureId, f: impl FnOnce(&mut Flag) -> T) -> T {
        let mut flags = self.flags.borrow_mut();
        let flag = flags.entry(feature.name).or_insert_with(|| Flag {
            behavior: feature.behavior,
            enabled: feature.behavior.initial_value(),
            redeclared: false,
        });
        if flag.behavior != feature.behavior && !flag.redeclared {
            flag.redeclared = true;
            warn!(
                "feature `{}` redeclared as {:?}, keeping {:?}",
                feature.name, feature.behavior, flag.behavior
            );
        }
        f(flag)
    }

    /// Registers `feature` if it is new. Returns its current flag.
    pub fn register(&self, feature: FeatureId) -> bool {
        self.with_flag(feature, |flag| flag.enabled)
    }

    /// Whether `feature` is enabled, registering it on first use.
    pub fn enabled(&self, feature: FeatureId) -> bool {
        self.register(feature)
    }

    /// Whether every listed feature is enabled.
    ///
    /// Evaluation stops at the first disabled feature. A `None` entry makes the whole check
    /// false, and so does an empty list.
    pub fn all_enabled<I>(&self, features: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Option<FeatureId>>,
    {
        let mut any = false;
        for feature in features {
            match feature.into() {
                Some(feature) if self.enabled(feature) => any = true,
                _ => return false,
            }
        }
        any
    }

    /// Captures a feature set as a check that is re-evaluated on every call.
    ///
    /// Toggling a flag later changes what the returned closure reports, so checks baked into
    /// already-built behaviors follow the live flags.
    pub fn as_supplier<I>(self: &Rc<Self>, features: I) -> impl Fn() -> bool + 'static
    where
        I: IntoIterator,
        I::Item: Into<Option<FeatureId>>,
    {
        let registry = Rc::clone(self);
        let features: Vec<Option<FeatureId>> = features.into_iter().map(Into::into).collect();
        move || registry.all_enabled(features.iter().copied())
    }

    /// Sets the flag of `feature`.
    ///
    /// # Errors
    /// - `AlwaysDisabled` when enabling an always-disabled feature.
    /// - `RobotEnabled` when the robot is not disabled.
    ///
    /// Refused changes leave the flag untouched and log a warning.
    pub fn set_enabled(&self, feature: FeatureId, enabled: bool) -> Result<(), FeatureError> {
        let state = self.robot_state.get();
        self.with_flag(feature, |flag| {
            if !flag.behavior.is_toggleable() {
                if enabled {
                    warn!("refusing to enable always-disabled feature `{}`", feature.name);
                    return Err(FeatureError::AlwaysDisabled(feature.name));
                }
                return Ok(());
            }

            if state.is_enabled() {
                warn!(
                    "refusing to change feature `{}` while the robot is {:?}",
                    feature.name, state
                );
                return Err(FeatureError::RobotEnabled(feature.name, state));
            }

            if flag.enabled != enabled {
                info!(
                    "feature `{}` {}",
                    feature.name,
                    if enabled { "enabled" } else { "disabled" }
                );
                flag.enabled = enabled;
            }
            Ok(())
        })
    }

    /// Flips the flag of `feature`, returning the new value.
    ///
    /// # Errors
    /// See [`set_enabled`](Self::set_enabled).
    pub fn toggle(&self, feature: FeatureId) -> Result<bool, FeatureError> {
        let enabled = !self.enabled(feature);
        self.set_enabled(feature, enabled)?;
        Ok(enabled)
    }

    /// Records the robot's operating state, which gates flag changes.
    pub fn update_robot_state(&self, state: RobotState) {
        self.robot_state.set(state);
    }

    /// The last recorded operating state.
    pub fn robot_state(&self) -> RobotState {
        self.robot_state.get()
    }

    /// Keeps the recorded operating state current from the host's per-cycle snapshot.
    pub fn attach<R: PeriodicRegistry + ?Sized>(self: &Rc<Self>, registry: &mut R) {
        let this = Rc::clone(self);
        registry.add_periodic(Box::new(move |state: RobotState| this.update_robot_state(state)));
    }

    /// Every registered feature and its flag, ordered by name.
    pub fn snapshot(&self) -> Vec<(&'static str, bool)> {
        self.flags
            .borrow()
            .iter()
            .map(|(name, flag)| (*name, flag.enabled))
            .collect()
    }
}

// Values selected by the first enabled feature
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

//! Values selected by feature flags.
//!
//! A [`FeatureGated`] holds an ordered list of `(feature, supplier)` entries and a fallback. Every
//! [`get`](FeatureGated::get) walks the entries in order and answers from the first whose feature
//! is enabled right now, so toggling a flag takes effect on the next call.
//!
//! ```
//! use std::rc::Rc;
//!
//! use robot_core::feature::{FeatureBehavior, FeatureId, FeatureRegistry};
//! use robot_core::gated::FeatureGated;
//!
//! const FAST_INTAKE: FeatureId = FeatureId::new("fast_intake", FeatureBehavior::InitiallyEnabled);
//!
//! let registry = Rc::new(FeatureRegistry::new());
//! let intake_speed = FeatureGated::builder(&registry)
//!     .when(FAST_INTAKE, || 0.9)
//!     .otherwise(|| 0.5);
//!
//! assert_eq!(intake_speed.get(), 0.9);
//! registry.set_enabled(FAST_INTAKE, false).unwrap();
//! assert_eq!(intake_speed.get(), 0.5);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::feature::{FeatureId, FeatureRegistry};

type Supplier<T> = Box<dyn Fn() -> T>;

/// A value chosen by the first enabled feature, evaluated on every call.
pub struct FeatureGated<T> {
    registry: Rc<FeatureRegistry>,
    entries: Vec<(Option<FeatureId>, Supplier<T>)>,
    fallback: Supplier<T>,
}

impl<T> FeatureGated<T> {
    /// Starts an empty list of entries.
    pub fn builder(registry: &Rc<FeatureRegistry>) -> FeatureGatedBuilder<T> {
        FeatureGatedBuilder {
            registry: Rc::clone(registry),
            entries: Vec::new(),
        }
    }

    /// The value of the first entry whose feature is enabled, or of the fallback.
    pub fn get(&self) -> T {
        self.entries
            .iter()
            .find(|(feature, _)| feature.is_some_and(|f| self.registry.enabled(f)))
            .map_or_else(|| (self.fallback)(), |(_, supplier)| supplier())
    }

    /// Number of gated entries, not counting the fallback.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether only the fallback is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects the entries of a [`FeatureGated`]. Entry order is final once built.
pub struct FeatureGatedBuilder<T> {
    registry: Rc<FeatureRegistry>,
    entries: Vec<(Option<FeatureId>, Supplier<T>)>,
}

impl<T> FeatureGatedBuilder<T> {
    /// Adds an entry, consulted after every entry added before it.
    ///
    /// A `None` feature never matches.
    pub fn when(
        mut self,
        feature: impl Into<Option<FeatureId>>,
        supplier: impl Fn() -> T + 'static,
    ) -> Self {
        self.entries.push((feature.into(), Box::new(supplier)));
        self
    }

    /// Finishes with the value used when no entry's feature is enabled.
    pub fn otherwise(self, fallback: impl Fn() -> T + 'static) -> FeatureGated<T> {
        FeatureGated {
            registry: self.registry,
            entries: self.entries,
            fallback: Box::new(fallback),
        }
    }
}

// Prioritized status LED colors
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

//! Status LEDs driven by prioritized conditions.
//!
//! A [`Lightshow`] knows a fixed set of [`State`]s, each a color plus a condition. Every cycle it
//! resolves a single color:
//!
//! 1. Every state not yet queued whose condition holds is pushed to the front of the queue, so
//!    the most recently activated condition takes priority.
//! 2. The front of the queue is popped until a state whose condition still holds is found. That
//!    state stays at the front and its color is shown. States that no longer hold are dropped and
//!    may be activated again in a later cycle.
//! 3. If the queue runs dry, the default state's color is shown, or nothing when there is no
//!    default.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use robot_core::lightshow::{colors, Color, Lightshow, State};
//! use robot_core::periodic::Periodic;
//!
//! let jammed = Rc::new(Cell::new(false));
//! let shown = Rc::new(Cell::new(colors::OFF));
//!
//! let sink = {
//!     let shown = Rc::clone(&shown);
//!     move |color: Color| shown.set(color)
//! };
//! let mut lights = Lightshow::with_default(sink, State::always("idle", colors::BLUE));
//! lights.add_state(State::new("jammed", colors::RED, {
//!     let jammed = Rc::clone(&jammed);
//!     move || jammed.get()
//! }));
//!
//! lights.periodic();
//! assert_eq!(shown.get(), colors::BLUE);
//!
//! jammed.set(true);
//! lights.periodic();
//! assert_eq!(shown.get(), colors::RED);
//! ```

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use log::debug;
use palette::Srgb;

use crate::periodic::Periodic;

/// An LED color.
pub type Color = Srgb<u8>;

/// Common LED colors.
pub mod colors {
    use super::Color;

    /// All channels off.
    pub const OFF: Color = Color::new(0, 0, 0);
    /// Full red.
    pub const RED: Color = Color::new(255, 0, 0);
    /// Full green.
    pub const GREEN: Color = Color::new(0, 255, 0);
    /// Full blue.
    pub const BLUE: Color = Color::new(0, 0, 255);
    /// Red and green.
    pub const YELLOW: Color = Color::new(255, 255, 0);
    /// Orange.
    pub const ORANGE: Color = Color::new(255, 128, 0);
    /// Red and blue.
    pub const PURPLE: Color = Color::new(128, 0, 255);
    /// All channels full.
    pub const WHITE: Color = Color::new(255, 255, 255);
}

/// A named condition and the color shown while it holds.
pub struct State {
    name: &'static str,
    color: Color,
    condition: Box<dyn Fn() -> bool>,
}

impl State {
    /// Creates a state shown while `condition` holds.
    pub fn new(name: &'static str, color: Color, condition: impl Fn() -> bool + 'static) -> Self {
        Self {
            name,
            color,
            condition: Box::new(condition),
        }
    }

    /// Creates a state whose condition always holds.
    pub fn always(name: &'static str, color: Color) -> Self {
        Self::new(name, color, || true)
    }

    /// The state's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The color shown for this state.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether the condition holds right now.
    pub fn should_apply(&self) -> bool {
        (self.condition)()
    }
}

impl core::fmt::Debug for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// Where resolved colors go, e.g. an LED strip driver.
pub trait ColorSink {
    /// Shows `color`.
    fn use_color(&mut self, color: Color);
}

impl<F: FnMut(Color)> ColorSink for F {
    fn use_color(&mut self, color: Color) {
        self(color)
    }
}

/// Resolves prioritized states to a single color every cycle.
pub struct Lightshow<S: ColorSink> {
    sink: S,
    states: Vec<State>,
    queued: Vec<bool>,
    activated: VecDeque<usize>,
    default: Option<State>,
    last_shown: Option<Color>,
}

impl<S: ColorSink> Lightshow<S> {
    /// Creates a lightshow without states or default.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            states: Vec::new(),
            queued: Vec::new(),
            activated: VecDeque::new(),
            default: None,
            last_shown: None,
        }
    }

    /// Creates a lightshow that falls back to `default`.
    pub fn with_default(sink: S, default: State) -> Self {
        let mut lightshow = Self::new(sink);
        lightshow.set_default_state(default);
        lightshow
    }

    /// Adds a state. It takes part from the next resolution on.
    pub fn add_state(&mut self, state: State) {
        self.states.push(state);
        self.queued.push(false);
    }

    /// Adds several states, in order.
    pub fn add_states(&mut self, states: impl IntoIterator<Item = State>) {
        for state in states {
            self.add_state(state);
        }
    }

    /// Sets the state whose color is shown when no activated state applies.
    pub fn set_default_state(&mut self, state: State) {
        self.default = Some(state);
    }

    /// Runs one resolution pass and returns the winning state's color, if any.
    pub fn resolve(&mut self) -> Option<Color> {
        for (index, state) in self.states.iter().enumerate() {
            if !self.queued[index] && state.should_apply() {
                self.activated.push_front(index);
                self.queued[index] = true;
            }
        }

        while let Some(index) = self.activated.pop_front() {
            let state = &self.states[index];
            if state.should_apply() {
                self.activated.push_front(index);
                return Some(state.color);
            }
            self.queued[index] = false;
        }
        None
    }

    /// Names of the activated states, highest priority first.
    pub fn active_states(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.activated.iter().map(|&index| self.states[index].name)
    }

    /// The color passed to the sink most recently.
    pub fn last_shown(&self) -> Option<Color> {
        self.last_shown
    }

    /// The color sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The color sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: ColorSink> Periodic for Lightshow<S> {
    fn periodic(&mut self) {
        let color = self
            .resolve()
            .or_else(|| self.default.as_ref().map(State::color));
        if let Some(color) = color {
            if self.last_shown != Some(color) {
                debug!("lightshow now showing {:?}", color);
            }
            self.last_shown = Some(color);
            self.sink.use_color(color);
        }
    }
}

// Commands and feature-gated command selection
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

//! Commands gated on feature flags.
//!
//! [`Command`] is the minimal lifecycle a host scheduler drives: `initialize` once, `execute`
//! every cycle until `is_finished`, then `end`. A [`FeatureGatedCommand`] picks one of several
//! commands from feature flags.
//!
//! The choice is made in every `initialize`, i.e. each time the command is started, and kept until
//! it ends. Flags toggled between runs therefore affect the next run, while a running command
//! never switches branches halfway.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use log::debug;

use crate::feature::{FeatureId, FeatureRegistry};

/// A unit of robot behavior run by a scheduler.
pub trait Command {
    /// Called once when the command starts.
    fn initialize(&mut self) {}

    /// Called every cycle while the command runs.
    fn execute(&mut self) {}

    /// Called once when the command finishes or is interrupted.
    fn end(&mut self, _interrupted: bool) {}

    /// Whether the command has completed.
    fn is_finished(&self) -> bool {
        false
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn initialize(&mut self) {
        (**self).initialize();
    }

    fn execute(&mut self) {
        (**self).execute();
    }

    fn end(&mut self, interrupted: bool) {
        (**self).end(interrupted);
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

struct Branch {
    features: Vec<Option<FeatureId>>,
    command: Box<dyn Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Branch(usize),
    Fallback,
    Nothing,
}

/// A command that runs the first branch whose features are all enabled.
///
/// Without a matching branch it runs the fallback, or finishes immediately when there is none.
pub struct FeatureGatedCommand {
    registry: Rc<FeatureRegistry>,
    branches: Vec<Branch>,
    fallback: Option<Box<dyn Command>>,
    selection: Selection,
}

impl FeatureGatedCommand {
    /// Starts a decision tree whose first branch runs `command` when all `features` are enabled.
    pub fn if_all_enabled<I>(
        registry: &Rc<FeatureRegistry>,
        features: I,
        command: impl Command + 'static,
    ) -> FeatureGatedCommandBuilder
    where
        I: IntoIterator,
        I::Item: Into<Option<FeatureId>>,
    {
        FeatureGatedCommandBuilder {
            registry: Rc::clone(registry),
            branches: Vec::new(),
        }
        .else_if_enabled(features, command)
    }

    fn select(&self) -> Selection {
        let branch = self
            .branches
            .iter()
            .position(|branch| self.registry.all_enabled(branch.features.iter().copied()));
        match (branch, &self.fallback) {
            (Some(index), _) => Selection::Branch(index),
            (None, Some(_)) => Selection::Fallback,
            (None, None) => Selection::Nothing,
        }
    }

    fn selected(&mut self) -> Option<&mut (dyn Command + 'static)> {
        match self.selection {
            Selection::Branch(index) => Some(self.branches[index].command.as_mut()),
            Selection::Fallback => self.fallback.as_deref_mut(),
            Selection::Nothing => None,
        }
    }

    /// The branch chosen by the last `initialize`: `Some(index)` for a gated branch, `None` for
    /// the fallback or nothing.
    pub fn selected_branch(&self) -> Option<usize> {
        match self.selection {
            Selection::Branch(index) => Some(index),
            _ => None,
        }
    }
}

impl Command for FeatureGatedCommand {
    fn initialize(&mut self) {
        self.selection = self.select();
        debug!("feature gated command selected {:?}", self.selection);
        if let Some(command) = self.selected() {
            command.initialize();
        }
    }

    fn execute(&mut self) {
        if let Some(command) = self.selected() {
            command.execute();
        }
    }

    fn end(&mut self, interrupted: bool) {
        if let Some(command) = self.selected() {
            command.end(interrupted);
        }
    }

    fn is_finished(&self) -> bool {
        match self.selection {
            Selection::Branch(index) => self.branches[index].command.is_finished(),
            Selection::Fallback => self.fallback.as_ref().map_or(true, |c| c.is_finished()),
            Selection::Nothing => true,
        }
    }
}

/// Collects the branches of a [`FeatureGatedCommand`].
pub struct FeatureGatedCommandBuilder {
    registry: Rc<FeatureRegistry>,
    branches: Vec<Branch>,
}

impl FeatureGatedCommandBuilder {
    /// Adds a branch consulted after every branch added before it.
    pub fn else_if_enabled<I>(mut self, features: I, command: impl Command + 'static) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<FeatureId>>,
    {
        self.branches.push(Branch {
            features: features.into_iter().map(Into::into).collect(),
            command: Box::new(command),
        });
        self
    }

    /// Finishes with the command run when no branch matches.
    pub fn otherwise(self, command: impl Command + 'static) -> FeatureGatedCommand {
        self.finish(Some(Box::new(command)))
    }

    /// Finishes without a fallback; nothing runs when no branch matches.
    pub fn build(self) -> FeatureGatedCommand {
        self.finish(None)
    }

    fn finish(self, fallback: Option<Box<dyn Command>>) -> FeatureGatedCommand {
        FeatureGatedCommand {
            registry: self.registry,
            branches: self.branches,
            fallback,
            selection: Selection::Nothing,
        }
    }
}

/// Gating shorthand available on every command.
pub trait GateExt: Command + Sized + 'static {
    /// Runs this command only if every listed feature is enabled when it starts.
    fn when_all_enabled<I>(self, registry: &Rc<FeatureRegistry>, features: I) -> FeatureGatedCommand
    where
        I: IntoIterator,
        I::Item: Into<Option<FeatureId>>,
    {
        FeatureGatedCommand::if_all_enabled(registry, features, self).build()
    }
}

impl<C: Command + Sized + 'static> GateExt for C {}

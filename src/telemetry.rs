// Key/value telemetry publishing for positional controllers
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

//! Optional key/value publishing for dashboards.
//!
//! Telemetry is observational only: a controller behaves identically with or without a sink.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;

/// A structured key/value publisher.
pub trait TelemetrySink {
    /// Publishes a numeric value under `key`.
    fn publish_number(&mut self, key: &str, value: f64);

    /// Publishes a boolean value under `key`.
    fn publish_bool(&mut self, key: &str, value: bool);
}

/// The entries a positional controller publishes each cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MotorSample {
    pub position: f64,
    pub setpoint: f64,
    pub at_position: bool,
    pub current: f64,
    pub pid_enabled: bool,
}

/// A sink bound to one mechanism's table, with its keys built once.
pub(crate) struct MotorTelemetry {
    sink: Box<dyn TelemetrySink>,
    position: String,
    setpoint: String,
    at_position: String,
    current: String,
    pid_enabled: String,
}

impl MotorTelemetry {
    pub fn new(table: &str, sink: Box<dyn TelemetrySink>) -> Self {
        Self {
            sink,
            position: format!("{table}/position"),
            setpoint: format!("{table}/setpoint"),
            at_position: format!("{table}/at_position"),
            current: format!("{table}/current"),
            pid_enabled: format!("{table}/pid_enabled"),
        }
    }

    pub fn publish(&mut self, sample: MotorSample) {
        self.sink.publish_number(&self.position, sample.position);
        self.sink.publish_number(&self.setpoint, sample.setpoint);
        self.sink.publish_bool(&self.at_position, sample.at_position);
        self.sink.publish_number(&self.current, sample.current);
        self.sink.publish_bool(&self.pid_enabled, sample.pid_enabled);
    }
}

// Discrete PID controller driving the positional motor abstraction
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

use core::time::Duration;

use num_traits::float::FloatCore;

use crate::time::InstantLike;

/// Errors raised when a PID configuration value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum PidConfigError {
    /// kp was negative or not finite.
    #[cfg_attr(feature = "std", error("proportional gain must be finite and non-negative"))]
    InvalidProportionalGain,

    /// ki was negative or not finite.
    #[cfg_attr(feature = "std", error("integral gain must be finite and non-negative"))]
    InvalidIntegralGain,

    /// kd was negative or not finite.
    #[cfg_attr(feature = "std", error("derivative gain must be finite and non-negative"))]
    InvalidDerivativeGain,

    /// The derivative filter time constant was not finite and positive.
    #[cfg_attr(feature = "std", error("filter time constant must be finite and positive"))]
    InvalidFilterTimeConstant,

    /// The sample time was zero.
    #[cfg_attr(feature = "std", error("sample time must be positive"))]
    InvalidSampleTime,

    /// The output limits were NaN or not strictly ordered.
    #[cfg_attr(feature = "std", error("output limits must be ordered and not NaN"))]
    InvalidOutputLimits,
}

fn secs<F: FloatCore>(duration: Duration) -> F {
    F::from(duration.as_secs_f64()).unwrap_or_else(F::nan)
}

fn clamp<F: FloatCore>(value: F, min: F, max: F) -> F {
    value.max(min).min(max)
}

fn is_valid_gain<F: FloatCore>(gain: F) -> bool {
    gain >= F::zero() && gain.is_finite()
}

/// Tuning and behavior of a PID loop.
///
/// Gains are the "total" gains a user would tune by hand; the sample time is folded in when the
/// controller computes, so changing the sample time does not change the tuning.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidConfig<F: FloatCore> {
    /// Proportional gain coefficient.
    /// Defaults to 0.0, so an untuned loop commands no output.
    kp: F,

    /// Integral gain coefficient.
    /// Defaults to 0.0.
    ki: F,

    /// Derivative gain coefficient.
    /// Defaults to 0.0.
    kd: F,

    /// Time constant for the low-pass filter applied to the derivative term.
    /// Defaults to 0.01s.
    filter_tc: F,

    /// Sampling time for the PID controller.
    /// Defaults to 20ms, the period of a robot control cycle.
    sample_time: Duration,

    /// Defaults to negative infinity, i.e. no limit.
    output_min: F,

    /// Defaults to positive infinity, i.e. no limit.
    output_max: F,

    /// If true, the integral term is updated after the output is computed.
    /// Defaults to false.
    use_strict_causal_integrator: bool,

    /// If true, the derivative term is computed using the NEGATIVE backward difference between
    /// the current and previous input instead of the error, avoiding derivative kick on setpoint
    /// changes.
    /// Defaults to false.
    use_derivative_on_measurement: bool,

    alpha: F,
}

impl<F: FloatCore> Default for PidConfig<F> {
    fn default() -> Self {
        let sample_time = Duration::from_millis(20);
        let filter_tc = F::from(0.01).unwrap_or_else(F::one);
        let delta_t: F = secs(sample_time);
        PidConfig {
            kp: F::zero(),
            ki: F::zero(),
            kd: F::zero(),
            filter_tc,
            sample_time,
            output_min: F::neg_infinity(),
            output_max: F::infinity(),
            use_strict_causal_integrator: false,
            use_derivative_on_measurement: false,
            alpha: delta_t / (delta_t + filter_tc),
        }
    }
}

impl<F: FloatCore> PidConfig<F> {
    /// Returns the proportional gain.
    pub fn kp(&self) -> F {
        self.kp
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> F {
        self.ki
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> F {
        self.kd
    }

    /// Convenience method that returns the proportional, integral, and derivative gains together.
    pub fn gains(&self) -> (F, F, F) {
        (self.kp, self.ki, self.kd)
    }

    /// Returns the time constant for the low-pass filter applied to the derivative term.
    pub fn filter_tc(&self) -> F {
        self.filter_tc
    }

    /// Returns the sampling time for the PID controller.
    pub fn sample_time(&self) -> Duration {
        self.sample_time
    }

    /// Returns the minimum output limit.
    pub fn output_min(&self) -> F {
        self.output_min
    }

    /// Returns the maximum output limit.
    pub fn output_max(&self) -> F {
        self.output_max
    }

    /// Returns the flag indicating whether to use a strict causal integrator.
    pub fn use_strict_causal_integrator(&self) -> bool {
        self.use_strict_causal_integrator
    }

    /// Returns the flag indicating whether to apply the derivative on the measurement.
    pub fn use_derivative_on_measurement(&self) -> bool {
        self.use_derivative_on_measurement
    }

    /// Sets the proportional gain.
    ///
    /// A zero gain is accepted: mechanisms are often built before they are tuned.
    ///
    /// # Errors
    /// - `InvalidProportionalGain` if the gain is negative or not finite. The old value is kept.
    pub fn set_kp(&mut self, kp: F) -> Result<(), PidConfigError> {
        if !is_valid_gain(kp) {
            return Err(PidConfigError::InvalidProportionalGain);
        }
        self.kp = kp;
        Ok(())
    }

    /// Sets the integral gain.
    ///
    /// # Errors
    /// - `InvalidIntegralGain` if the gain is negative or not finite. The old value is kept.
    pub fn set_ki(&mut self, ki: F) -> Result<(), PidConfigError> {
        if !is_valid_gain(ki) {
            return Err(PidConfigError::InvalidIntegralGain);
        }
        self.ki = ki;
        Ok(())
    }

    /// Sets the derivative gain.
    ///
    /// # Errors
    /// - `InvalidDerivativeGain` if the gain is negative or not finite. The old value is kept.
    pub fn set_kd(&mut self, kd: F) -> Result<(), PidConfigError> {
        if !is_valid_gain(kd) {
            return Err(PidConfigError::InvalidDerivativeGain);
        }
        self.kd = kd;
        Ok(())
    }

    /// Convenience method to set the proportional, integral, and derivative gains together.
    ///
    /// All three gains are validated before any is applied.
    pub fn set_gains(&mut self, kp: F, ki: F, kd: F) -> Result<(), PidConfigError> {
        let mut staged = *self;
        staged.set_kp(kp)?;
        staged.set_ki(ki)?;
        staged.set_kd(kd)?;
        *self = staged;
        Ok(())
    }

    /// Sets the time constant for the low-pass filter applied to the derivative term.
    ///
    /// # Errors
    /// - `InvalidFilterTimeConstant` if the time constant is not positive or not finite.
    pub fn set_filter_tc(&mut self, filter_tc: F) -> Result<(), PidConfigError> {
        if filter_tc <= F::zero() || !filter_tc.is_finite() {
            return Err(PidConfigError::InvalidFilterTimeConstant);
        }
        self.filter_tc = filter_tc;
        self.update_alpha();
        Ok(())
    }

    /// Sets the sample time for the PID controller and refreshes the derivative filter.
    ///
    /// # Errors
    /// - `InvalidSampleTime` if the sample time is zero.
    pub fn set_sample_time(&mut self, sample_time: Duration) -> Result<(), PidConfigError> {
        if sample_time.is_zero() {
            return Err(PidConfigError::InvalidSampleTime);
        }
        self.sample_time = sample_time;
        self.update_alpha();
        Ok(())
    }

    /// Sets the minimum and maximum output limits for the PID controller.
    ///
    /// These limits may be set to infinity to disable clamping.
    ///
    /// # Errors
    /// - `InvalidOutputLimits` if either limit is NaN or the minimum is not below the maximum.
    pub fn set_output_limits(&mut self, output_min: F, output_max: F) -> Result<(), PidConfigError> {
        if output_min.is_nan() || output_max.is_nan() || output_min >= output_max {
            return Err(PidConfigError::InvalidOutputLimits);
        }
        self.output_min = output_min;
        self.output_max = output_max;
        Ok(())
    }

    /// Sets whether to use a strict causal integrator.
    pub fn set_use_strict_causal_integrator(&mut self, use_strict_causal_integrator: bool) {
        self.use_strict_causal_integrator = use_strict_causal_integrator;
    }

    /// Sets whether to apply the derivative on the measurement.
    pub fn set_use_derivative_on_measurement(&mut self, use_derivative_on_measurement: bool) {
        self.use_derivative_on_measurement = use_derivative_on_measurement;
    }

    fn update_alpha(&mut self) {
        let delta_t: F = secs(self.sample_time);
        self.alpha = delta_t / (delta_t + self.filter_tc);
    }
}

/// Builds a [`PidConfig`], validating every option once in [`PidConfigBuilder::build`].
///
/// The first rejected option is remembered and reported; later options are still recorded but
/// cannot mask it.
#[derive(Debug, Clone, Copy)]
pub struct PidConfigBuilder<F: FloatCore> {
    config: PidConfig<F>,
    error: Option<PidConfigError>,
}

impl<F: FloatCore> Default for PidConfigBuilder<F> {
    fn default() -> Self {
        Self {
            config: PidConfig::default(),
            error: None,
        }
    }
}

impl<F: FloatCore> PidConfigBuilder<F> {
    fn apply(mut self, result: Result<(), PidConfigError>) -> Self {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Sets the proportional gain.
    pub fn kp(mut self, kp: F) -> Self {
        let result = self.config.set_kp(kp);
        self.apply(result)
    }

    /// Sets the integral gain.
    pub fn ki(mut self, ki: F) -> Self {
        let result = self.config.set_ki(ki);
        self.apply(result)
    }

    /// Sets the derivative gain.
    pub fn kd(mut self, kd: F) -> Self {
        let result = self.config.set_kd(kd);
        self.apply(result)
    }

    /// Sets the derivative filter time constant.
    pub fn filter_tc(mut self, filter_tc: F) -> Self {
        let result = self.config.set_filter_tc(filter_tc);
        self.apply(result)
    }

    /// Sets the sample time.
    pub fn sample_time(mut self, sample_time: Duration) -> Self {
        let result = self.config.set_sample_time(sample_time);
        self.apply(result)
    }

    /// Sets the output limits.
    pub fn output_limits(mut self, output_min: F, output_max: F) -> Self {
        let result = self.config.set_output_limits(output_min, output_max);
        self.apply(result)
    }

    /// Sets whether to use a strict causal integrator.
    pub fn use_strict_causal_integrator(mut self, flag: bool) -> Self {
        self.config.set_use_strict_causal_integrator(flag);
        self
    }

    /// Sets whether to apply the derivative on the measurement.
    pub fn use_derivative_on_measurement(mut self, flag: bool) -> Self {
        self.config.set_use_derivative_on_measurement(flag);
        self
    }

    /// Finalizes the configuration.
    ///
    /// # Errors
    /// The first option that failed validation.
    pub fn build(self) -> Result<PidConfig<F>, PidConfigError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.config),
        }
    }
}

/// Whether and how the integrator accumulates error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegratorActivity {
    /// The integral term is cleared and stays at zero.
    Inactive,
    /// The integral term is frozen at its current value.
    HoldIntegration,
    /// The integral term accumulates error normally.
    Active,
}

/// The mutable state of a PID loop.
#[derive(Copy, Clone, Debug)]
pub struct PidContext<I: InstantLike, F: FloatCore> {
    i_term: F,
    last_err: F,
    last_input: F,
    last_output: F,
    last_derivative: F,
    last_time: Option<I>,
    integrator_activity: IntegratorActivity,
    is_active: bool,
    is_initialized: bool,
}

impl<I: InstantLike, F: FloatCore> PidContext<I, F> {
    /// Creates an active context that initializes itself on the first computation.
    pub fn new_uninit() -> Self {
        Self {
            i_term: F::zero(),
            last_err: F::zero(),
            last_input: F::zero(),
            last_output: F::zero(),
            last_derivative: F::zero(),
            last_time: None,
            integrator_activity: IntegratorActivity::Active,
            is_active: true,
            is_initialized: false,
        }
    }

    /// Returns the last computed output.
    pub fn output(&self) -> F {
        self.last_output
    }

    /// Returns the error seen by the last computation.
    pub fn error(&self) -> F {
        self.last_err
    }

    /// Returns the time of the last computation, if any.
    pub fn last_time(&self) -> Option<I> {
        self.last_time
    }

    /// Whether the loop computes new outputs.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the loop state has been seeded from a measurement since it was last activated.
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Returns the current integrator activity.
    pub fn integrator_activity(&self) -> IntegratorActivity {
        self.integrator_activity
    }

    /// Sets the integrator activity. Switching to `Inactive` clears the integral term.
    pub fn set_integrator_activity(&mut self, integrator_activity: IntegratorActivity) {
        if integrator_activity == IntegratorActivity::Inactive {
            self.i_term = F::zero();
        }
        self.integrator_activity = integrator_activity;
    }

    /// Resumes computation. The loop re-initializes from the next measurement so the transition
    /// is bumpless.
    pub fn activate(&mut self) {
        if !self.is_active {
            self.is_active = true;
            self.is_initialized = false;
        }
    }

    /// Suspends computation; the last output is held.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Records an output applied from outside the loop, e.g. a manual demand, so that the next
    /// activation continues from it.
    pub fn track_output(&mut self, output: F) {
        self.last_output = output;
    }
}

/// A functional implementation of a PID (Proportional-Integral-Derivative) controller.
///
/// This implementation is stateless, so a context object must be passed in and returned with
/// each call to `compute`.
#[derive(Debug, Clone, Copy)]
pub struct FuncPidController<F: FloatCore> {
    config: PidConfig<F>,
}

impl<F: FloatCore> FuncPidController<F> {
    /// Creates a controller with the given configuration.
    pub fn new(config: PidConfig<F>) -> Self {
        FuncPidController { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PidConfig<F> {
        &self.config
    }

    /// Returns the configuration for on-the-fly tuning.
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        &mut self.config
    }

    /// Computes the next output of the loop.
    ///
    /// Returns the held output unchanged if the context is inactive or less than one sample
    /// period has elapsed since the last computation.
    pub fn compute<I: InstantLike>(
        &self,
        mut ctx: PidContext<I, F>,
        input: F,
        setpoint: F,
        timestamp: I,
        feedforward: Option<F>,
    ) -> (F, PidContext<I, F>) {
        if !ctx.is_active {
            return (ctx.last_output, ctx);
        }

        if let Some(last_time) = ctx.last_time {
            if ctx.is_initialized && timestamp.duration_since(last_time) < self.config.sample_time
            {
                return (ctx.last_output, ctx);
            }
        }

        let error = setpoint - input;

        if !ctx.is_initialized {
            ctx.last_input = input;
            ctx.last_err = error;
            ctx.last_derivative = F::zero();
            // Without integral action there is nothing to carry the previous output
            ctx.i_term = if self.config.ki > F::zero()
                && ctx.integrator_activity != IntegratorActivity::Inactive
            {
                clamp(ctx.last_output, self.config.output_min, self.config.output_max)
            } else {
                F::zero()
            };
            ctx.is_initialized = true;
        }

        if !self.config.use_strict_causal_integrator {
            ctx = self.update_integral(ctx, error);
        }

        let raw_derivative = if self.config.use_derivative_on_measurement {
            ctx.last_input - input // Note reversed order of operands
        } else {
            error - ctx.last_err
        };

        let alpha = self.config.alpha;
        let derivative = alpha * raw_derivative + (F::one() - alpha) * ctx.last_derivative;
        ctx.last_derivative = derivative;

        let delta_t: F = secs(self.config.sample_time);
        let output = self.config.kp * error
            + ctx.i_term
            + self.config.kd / delta_t * derivative
            + feedforward.unwrap_or_else(F::zero);
        let clamped_output = clamp(output, self.config.output_min, self.config.output_max);

        if self.config.use_strict_causal_integrator {
            ctx = self.update_integral(ctx, error);
        }

        ctx.last_input = input;
        ctx.last_err = error;
        ctx.last_time = Some(timestamp);
        ctx.last_output = clamped_output;
        (clamped_output, ctx)
    }

    fn update_integral<I: InstantLike>(
        &self,
        mut ctx: PidContext<I, F>,
        error: F,
    ) -> PidContext<I, F> {
        if ctx.integrator_activity != IntegratorActivity::Active {
            return ctx;
        }
        let delta_t: F = secs(self.config.sample_time);
        ctx.i_term = clamp(
            ctx.i_term + self.config.ki * delta_t * error,
            self.config.output_min,
            self.config.output_max,
        );
        ctx
    }
}

/// A stateful PID controller that owns its [`PidContext`].
#[derive(Debug, Clone, Copy)]
pub struct PidController<I: InstantLike, F: FloatCore> {
    ctx: PidContext<I, F>,
    controller: FuncPidController<F>,
}

impl<I: InstantLike, F: FloatCore> PidController<I, F> {
    /// Creates a controller that initializes itself on the first computation.
    pub fn new_uninit(config: PidConfig<F>) -> Self {
        Self {
            ctx: PidContext::new_uninit(),
            controller: FuncPidController::new(config),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PidConfig<F> {
        self.controller.config()
    }

    /// Returns the configuration for on-the-fly tuning.
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        self.controller.config_mut()
    }

    /// Returns the loop state.
    pub fn context(&self) -> &PidContext<I, F> {
        &self.ctx
    }

    /// Computes the next output; see [`FuncPidController::compute`].
    pub fn compute(&mut self, input: F, setpoint: F, timestamp: I, feedforward: Option<F>) -> F {
        let (output, ctx) = self
            .controller
            .compute(self.ctx, input, setpoint, timestamp, feedforward);
        self.ctx = ctx;
        output
    }

    /// See [`PidContext::activate`].
    pub fn activate(&mut self) {
        self.ctx.activate();
    }

    /// See [`PidContext::deactivate`].
    pub fn deactivate(&mut self) {
        self.ctx.deactivate();
    }

    /// See [`PidContext::track_output`].
    pub fn track_output(&mut self, output: F) {
        self.ctx.track_output(output);
    }
}

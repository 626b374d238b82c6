//! Discrete PID controller with a bounded integral.
//!
//! One step per control cycle, no time base: the cycle *is* the unit of
//! time. The integral only accumulates while the error is small
//! (`|error| < error_threshold`) and is zeroed on any larger excursion, so a
//! target jump never winds it up. Output is clamped to ±100 and truncated
//! toward zero.

use vistrack_common::config::PidConfig;
use vistrack_common::consts::PERCENT_MAX;

/// Internal state of the PID controller.
///
/// Preserves integral accumulator and previous error across cycles.
/// Reset when the drive session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// Integral accumulator, always within `±integral_max`.
    integral: f64,
    /// Error seen on the previous step (for derivative).
    prev_error: f64,
}

impl PidState {
    /// Reset all internal state to zero.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current integral accumulator.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Error recorded by the last step.
    #[inline]
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }
}

/// PID gains and integral limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Integral clamp, `> 0`.
    pub integral_max: f64,
    /// Errors at or above this magnitude reset the integral, `> 0`.
    pub error_threshold: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self::from(&PidConfig::default())
    }
}

impl From<&PidConfig> for PidGains {
    fn from(cfg: &PidConfig) -> Self {
        Self {
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
            integral_max: cfg.integral_max,
            error_threshold: cfg.error_threshold,
        }
    }
}

/// Compute one PID step.
///
/// # Arguments
/// - `state`: Mutable PID state (integral, previous error).
/// - `gains`: Gains and integral limits.
/// - `target`: Desired speed, percent.
/// - `current`: Speed currently applied to the motor, percent.
///
/// # Returns
/// Signed speed command in `[-100, 100]`.
#[inline]
pub fn pid_step(state: &mut PidState, gains: &PidGains, target: i32, current: i32) -> i32 {
    let error = f64::from(target) - f64::from(current);
    let derivative = error - state.prev_error;

    if error.abs() < gains.error_threshold {
        state.integral = (state.integral + error).clamp(-gains.integral_max, gains.integral_max);
    } else {
        state.integral = 0.0;
    }
    state.prev_error = error;

    let output = gains.kp * error + gains.ki * state.integral + gains.kd * derivative;
    if output.is_nan() {
        return 0;
    }
    let limit = f64::from(PERCENT_MAX);
    // `as` truncates toward zero.
    output.clamp(-limit, limit) as i32
}

/// A PID state bundled with its gains, one per motor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidController {
    gains: PidGains,
    state: PidState,
}

impl PidController {
    /// Create a controller with zeroed state.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            state: PidState::default(),
        }
    }

    /// Run one step. See [`pid_step`].
    #[inline]
    pub fn step(&mut self, target: i32, current: i32) -> i32 {
        pid_step(&mut self.state, &self.gains, target, current)
    }

    /// Current state.
    pub fn state(&self) -> &PidState {
        &self.state
    }

    /// Gains in use.
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Zero integral and previous error.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

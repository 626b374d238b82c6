//! Recorded state of the simulated board.
//!
//! Every backend call is mirrored here so tests can assert on line levels,
//! PWM settings, the order of hardware operations and exclusivity of
//! direction line pairs.

use std::collections::{BTreeMap, HashSet};

/// Simulated GPIO line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState {
    /// Label given on request.
    pub label: String,
    /// Current output level.
    pub high: bool,
}

/// Simulated PWM channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PwmState {
    /// Label given on request.
    pub label: String,
    /// Active time per period [ns].
    pub duty_ns: u64,
    /// Period [ns].
    pub period_ns: u64,
    /// Output running.
    pub enabled: bool,
}

/// One recorded backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalEvent {
    /// GPIO line claimed.
    GpioRequested(u32),
    /// GPIO line driven.
    GpioSet(u32, bool),
    /// GPIO line released.
    GpioFreed(u32),
    /// PWM channel claimed.
    PwmRequested(u32, u32),
    /// PWM channel configured `(chip, channel, duty_ns, period_ns)`.
    PwmConfigured(u32, u32, u64, u64),
    /// PWM output started.
    PwmEnabled(u32, u32),
    /// PWM output stopped.
    PwmDisabled(u32, u32),
    /// PWM channel released.
    PwmFreed(u32, u32),
}

/// Operation that should fail when attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// `request_gpio(line)`.
    GpioRequest(u32),
    /// `request_pwm(chip, channel)`.
    PwmRequest(u32, u32),
    /// `configure_pwm(chip, channel, ..)`.
    PwmConfigure(u32, u32),
}

/// Shared state behind every clone of a `SimulatedBackend`.
#[derive(Debug, Default)]
pub struct SimState {
    /// Claimed lines.
    pub lines: BTreeMap<u32, LineState>,
    /// Claimed PWM channels keyed by `(chip, channel)`.
    pub pwms: BTreeMap<(u32, u32), PwmState>,
    /// Operation log in call order.
    pub events: Vec<HalEvent>,
    /// Injected failures.
    pub fail_points: HashSet<FailPoint>,
    /// Line pairs that must never be high together.
    pub exclusive_pairs: Vec<(u32, u32)>,
    /// Number of writes after which an exclusive pair was high together.
    pub exclusion_violations: u64,
}

impl SimState {
    /// Record a violation if any exclusive pair is currently both high.
    pub(crate) fn check_exclusive_pairs(&mut self) {
        let high = |line: &u32| self.lines.get(line).is_some_and(|l| l.high);
        let both = self
            .exclusive_pairs
            .iter()
            .filter(|(a, b)| high(a) && high(b))
            .count() as u64;
        self.exclusion_violations += both;
    }
}

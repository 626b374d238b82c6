//! Simulation backend implementation.
//!
//! The `SimulatedBackend` implements the `HardwareBackend` trait entirely in
//! memory. Clones share one `SimState`, so a test can keep a handle while the
//! control core owns another.

use super::state::{FailPoint, HalEvent, LineState, PwmState, SimState};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::debug;
use vistrack_common::hal::driver::{HalError, HardwareBackend};

/// Simulation backend implementing the `HardwareBackend` trait.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBackend {
    /// Create a new simulated board with nothing claimed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given operation fail from now on.
    pub fn inject_failure(&self, point: FailPoint) {
        self.state.lock().fail_points.insert(point);
    }

    /// Remove a previously injected failure.
    pub fn clear_failure(&self, point: FailPoint) {
        self.state.lock().fail_points.remove(&point);
    }

    /// Declare two lines that must never be high at the same time.
    pub fn watch_exclusive(&self, a: u32, b: u32) {
        self.state.lock().exclusive_pairs.push((a, b));
    }

    /// Lock the recorded state for inspection.
    pub fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock()
    }

    /// Current level of a claimed line.
    pub fn level(&self, line: u32) -> Option<bool> {
        self.state.lock().lines.get(&line).map(|l| l.high)
    }

    /// Snapshot of a claimed PWM channel.
    pub fn pwm(&self, chip: u32, channel: u32) -> Option<PwmState> {
        self.state.lock().pwms.get(&(chip, channel)).cloned()
    }

    /// Copy of the operation log.
    pub fn events(&self) -> Vec<HalEvent> {
        self.state.lock().events.clone()
    }

    /// Number of claimed lines plus claimed PWM channels.
    pub fn claimed_count(&self) -> usize {
        let s = self.state.lock();
        s.lines.len() + s.pwms.len()
    }

    /// Count of writes that left an exclusive pair both high.
    pub fn exclusion_violations(&self) -> u64 {
        self.state.lock().exclusion_violations
    }

    /// Number of rising edges recorded on `line`.
    pub fn rising_edges(&self, line: u32) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| **e == HalEvent::GpioSet(line, true))
            .count()
    }
}

impl HardwareBackend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn request_gpio(&mut self, line: u32, label: &str) -> Result<(), HalError> {
        let mut s = self.state.lock();
        if s.fail_points.contains(&FailPoint::GpioRequest(line)) {
            return Err(HalError::Busy(format!("gpio{line} (injected)")));
        }
        if s.lines.contains_key(&line) {
            return Err(HalError::Busy(format!("gpio{line}")));
        }
        s.lines.insert(
            line,
            LineState {
                label: label.to_string(),
                high: false,
            },
        );
        s.events.push(HalEvent::GpioRequested(line));
        debug!("sim: requested gpio{} as {}", line, label);
        Ok(())
    }

    fn set_gpio(&mut self, line: u32, high: bool) -> Result<(), HalError> {
        let mut s = self.state.lock();
        let Some(state) = s.lines.get_mut(&line) else {
            return Err(HalError::NotRequested(format!("gpio{line}")));
        };
        state.high = high;
        s.events.push(HalEvent::GpioSet(line, high));
        s.check_exclusive_pairs();
        Ok(())
    }

    fn free_gpio(&mut self, line: u32) {
        let mut s = self.state.lock();
        if s.lines.remove(&line).is_some() {
            s.events.push(HalEvent::GpioFreed(line));
        }
    }

    fn request_pwm(&mut self, chip: u32, channel: u32, label: &str) -> Result<(), HalError> {
        let mut s = self.state.lock();
        if s.fail_points.contains(&FailPoint::PwmRequest(chip, channel)) {
            return Err(HalError::Busy(format!(
                "pwmchip{chip}/pwm{channel} (injected)"
            )));
        }
        if s.pwms.contains_key(&(chip, channel)) {
            return Err(HalError::Busy(format!("pwmchip{chip}/pwm{channel}")));
        }
        s.pwms.insert(
            (chip, channel),
            PwmState {
                label: label.to_string(),
                duty_ns: 0,
                period_ns: 0,
                enabled: false,
            },
        );
        s.events.push(HalEvent::PwmRequested(chip, channel));
        debug!("sim: requested pwmchip{}/pwm{} as {}", chip, channel, label);
        Ok(())
    }

    fn configure_pwm(
        &mut self,
        chip: u32,
        channel: u32,
        duty_ns: u64,
        period_ns: u64,
    ) -> Result<(), HalError> {
        let mut s = self.state.lock();
        if s.fail_points.contains(&FailPoint::PwmConfigure(chip, channel)) {
            return Err(HalError::Io(format!(
                "pwmchip{chip}/pwm{channel} configure (injected)"
            )));
        }
        if duty_ns > period_ns {
            return Err(HalError::InvalidConfig(format!(
                "duty {duty_ns}ns exceeds period {period_ns}ns"
            )));
        }
        let Some(pwm) = s.pwms.get_mut(&(chip, channel)) else {
            return Err(HalError::NotRequested(format!("pwmchip{chip}/pwm{channel}")));
        };
        pwm.duty_ns = duty_ns;
        pwm.period_ns = period_ns;
        s.events
            .push(HalEvent::PwmConfigured(chip, channel, duty_ns, period_ns));
        Ok(())
    }

    fn enable_pwm(&mut self, chip: u32, channel: u32) -> Result<(), HalError> {
        let mut s = self.state.lock();
        let Some(pwm) = s.pwms.get_mut(&(chip, channel)) else {
            return Err(HalError::NotRequested(format!("pwmchip{chip}/pwm{channel}")));
        };
        pwm.enabled = true;
        s.events.push(HalEvent::PwmEnabled(chip, channel));
        Ok(())
    }

    fn disable_pwm(&mut self, chip: u32, channel: u32) {
        let mut s = self.state.lock();
        if let Some(pwm) = s.pwms.get_mut(&(chip, channel)) {
            pwm.enabled = false;
            s.events.push(HalEvent::PwmDisabled(chip, channel));
        }
    }

    fn free_pwm(&mut self, chip: u32, channel: u32) {
        let mut s = self.state.lock();
        if s.pwms.remove(&(chip, channel)).is_some() {
            s.events.push(HalEvent::PwmFreed(chip, channel));
        }
    }
}

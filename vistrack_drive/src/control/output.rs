//! Hardware output stage: signed speed to direction lines plus PWM duty.
//!
//! Each motor owns a pair of direction lines (A, B) and one PWM channel.
//! A positive speed drives A high, a negative one drives B high, zero
//! drives both low. The pair is never high at the same time: lines that
//! must go low are written before the line that goes high.

use vistrack_common::config::{MotorWiring, PwmConfig};
use vistrack_common::consts::PERCENT_MAX;
use tracing::warn;
use vistrack_common::hal::driver::{HalError, HardwareBackend};

/// Rotation direction of one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Line A high, line B low.
    Forward,
    /// Line A low, line B high.
    Reverse,
    /// Both lines low.
    #[default]
    Stopped,
}

impl Direction {
    /// Direction implied by the sign of `speed`.
    #[inline]
    pub fn from_speed(speed: i32) -> Self {
        match speed.signum() {
            1 => Self::Forward,
            -1 => Self::Reverse,
            _ => Self::Stopped,
        }
    }

    /// Levels of (line A, line B).
    #[inline]
    pub fn line_levels(self) -> (bool, bool) {
        match self {
            Self::Forward => (true, false),
            Self::Reverse => (false, true),
            Self::Stopped => (false, false),
        }
    }
}

/// Linear map from speed magnitude to PWM duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyMap {
    /// Duty at magnitude 0, ns.
    pub min_duty_ns: u64,
    /// Duty at magnitude 100, ns.
    pub max_duty_ns: u64,
    /// PWM period, ns.
    pub period_ns: u64,
}

impl From<&PwmConfig> for DutyMap {
    fn from(cfg: &PwmConfig) -> Self {
        Self {
            min_duty_ns: cfg.min_duty_ns,
            max_duty_ns: cfg.max_duty_ns,
            period_ns: cfg.period_ns,
        }
    }
}

impl DutyMap {
    /// `min + (max - min) * magnitude / 100`, with `magnitude` clamped to 0..=100.
    #[inline]
    pub fn duty_ns(&self, magnitude: u32) -> u64 {
        let mag = u64::from(magnitude.min(PERCENT_MAX as u32));
        self.min_duty_ns + (self.max_duty_ns - self.min_duty_ns) * mag / PERCENT_MAX as u64
    }
}

/// What one `apply` wrote to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedOutput {
    /// Direction driven on the line pair.
    pub direction: Direction,
    /// Speed magnitude, 0..=100.
    pub magnitude: i32,
    /// Duty written to the PWM channel.
    pub duty_ns: u64,
}

/// Output stage of one motor.
///
/// Tracks the last successfully applied direction and magnitude; a failed
/// apply leaves both untouched and puts the direction lines back.
#[derive(Debug, Clone)]
pub struct HardwareOutput {
    motor: u8,
    dir_lines: (u32, u32),
    chip: u32,
    channel: u32,
    duty: DutyMap,
    direction: Direction,
    current_speed: i32,
}

impl HardwareOutput {
    /// Output stage for motor `motor` (1-based) wired as `wiring`.
    pub fn new(motor: u8, wiring: &MotorWiring, pwm: &PwmConfig) -> Self {
        Self {
            motor,
            dir_lines: wiring.dir_lines,
            chip: pwm.chip,
            channel: wiring.pwm_channel,
            duty: DutyMap::from(pwm),
            direction: Direction::Stopped,
            current_speed: 0,
        }
    }

    /// Drive the motor at `speed` (signed percent; magnitude clamped to 100).
    pub fn apply(
        &mut self,
        hw: &mut dyn HardwareBackend,
        speed: i32,
    ) -> Result<AppliedOutput, HalError> {
        let direction = Direction::from_speed(speed);
        let magnitude = speed.unsigned_abs().min(PERCENT_MAX as u32);
        let duty_ns = self.duty.duty_ns(magnitude);

        let committed = self
            .drive_lines(hw, direction)
            .and_then(|()| hw.configure_pwm(self.chip, self.channel, duty_ns, self.duty.period_ns));
        if let Err(e) = committed {
            // Put the pair back where the recorded direction says it is.
            if let Err(restore) = self.drive_lines(hw, self.direction) {
                warn!(
                    "Motor {}: restoring {:?} lines failed: {}",
                    self.motor, self.direction, restore
                );
            }
            return Err(e);
        }

        self.direction = direction;
        self.current_speed = magnitude as i32;
        Ok(AppliedOutput {
            direction,
            magnitude: self.current_speed,
            duty_ns,
        })
    }

    /// Set the line pair to `direction`, low lines first.
    fn drive_lines(&self, hw: &mut dyn HardwareBackend, direction: Direction) -> Result<(), HalError> {
        let (a, b) = direction.line_levels();
        let (line_a, line_b) = self.dir_lines;
        if !a {
            hw.set_gpio(line_a, false)?;
        }
        if !b {
            hw.set_gpio(line_b, false)?;
        }
        if a {
            hw.set_gpio(line_a, true)?;
        }
        if b {
            hw.set_gpio(line_b, true)?;
        }
        Ok(())
    }

    /// Forget the applied state after the hardware has been released.
    pub fn reset(&mut self) {
        self.direction = Direction::Stopped;
        self.current_speed = 0;
    }

    /// Motor number, 1-based.
    pub fn motor(&self) -> u8 {
        self.motor
    }

    /// Last applied direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last applied magnitude, 0..=100.
    pub fn current_speed(&self) -> i32 {
        self.current_speed
    }

    /// Direction line pair (A, B).
    pub fn dir_lines(&self) -> (u32, u32) {
        self.dir_lines
    }

    /// PWM `(chip, channel)`.
    pub fn pwm(&self) -> (u32, u32) {
        (self.chip, self.channel)
    }

    /// Duty mapping in use.
    pub fn duty_map(&self) -> &DutyMap {
        &self.duty
    }
}

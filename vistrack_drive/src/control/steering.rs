//! Steering policy: object position to per-motor speed targets.
//!
//! Pure and integer-only. Halving a correction uses Rust's `/`, which
//! truncates toward zero; arithmetic saturates, so no input can overflow.

use vistrack_common::config::SteeringConfig;
use vistrack_common::position::ObjectPosition;

/// What the control cycle should do with the motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringCommand {
    /// Object not detected: spin motor 1 to search and raise the lost alert.
    Search,
    /// Object detected: PID toward these targets (left, right), percent.
    Track {
        /// Target for motor 1.
        left: i32,
        /// Target for motor 2.
        right: i32,
    },
}

/// Deadband steering around the frame centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteeringPolicy {
    /// Horizontal centre, percent.
    pub center: i32,
    /// Half-width of the no-correction band, percent.
    pub deadband: i32,
    /// Speed of both motors before correction.
    pub base_speed: i32,
}

impl Default for SteeringPolicy {
    fn default() -> Self {
        Self::from(&SteeringConfig::default())
    }
}

impl From<&SteeringConfig> for SteeringPolicy {
    fn from(cfg: &SteeringConfig) -> Self {
        Self {
            center: cfg.center,
            deadband: cfg.deadband,
            base_speed: cfg.base_speed,
        }
    }
}

impl SteeringPolicy {
    /// Map one position snapshot to a steering command.
    ///
    /// Left of the band (`error < -deadband`) speeds up the right motor,
    /// right of the band speeds up the left motor, inside it both run at
    /// `base_speed`. Correction is half the error magnitude.
    pub fn compute(&self, pos: &ObjectPosition) -> SteeringCommand {
        if !pos.detected {
            return SteeringCommand::Search;
        }
        let error = pos.x.saturating_sub(self.center);
        let (left, right) = if error < self.deadband.saturating_neg() {
            (self.base_speed, self.base_speed.saturating_add(error.saturating_neg() / 2))
        } else if error > self.deadband {
            (self.base_speed.saturating_add(error / 2), self.base_speed)
        } else {
            (self.base_speed, self.base_speed)
        };
        SteeringCommand::Track { left, right }
    }
}

//! Hardware backend trait and error types.
//!
//! This module defines:
//! - `HardwareBackend` trait - Interface for pluggable GPIO + PWM backends
//! - `HalError` enum - Error types for backend operations
//! - `ResourceId` enum - Identity of every acquirable hardware resource
//! - `BackendFactory` type alias - Factory function type

use crate::config::DriveConfig;
use std::fmt;
use thiserror::Error;

/// Error types for hardware backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Resource already owned by someone else
    #[error("Resource busy: {0}")]
    Busy(String),

    /// Resource or backend does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend I/O failure
    #[error("Hardware I/O error: {0}")]
    Io(String),

    /// Requested setting is out of range for the hardware
    #[error("Invalid hardware configuration: {0}")]
    InvalidConfig(String),

    /// Operation on a resource that was never requested
    #[error("Resource not requested: {0}")]
    NotRequested(String),
}

/// Factory function type for creating backend instances.
pub type BackendFactory = fn(&DriveConfig) -> Box<dyn HardwareBackend>;

/// One of the hardware resources acquired when the drive is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// Direction line `index` (0 or 1) of motor `motor` (1 or 2).
    DirectionLine {
        /// Motor number, 1-based.
        motor: u8,
        /// Line index within the motor's pair.
        index: u8,
        /// GPIO line number.
        line: u32,
    },
    /// Alarm output line.
    AlarmLine {
        /// GPIO line number.
        line: u32,
    },
    /// PWM channel driving motor `motor`.
    PwmChannel {
        /// Motor number, 1-based.
        motor: u8,
        /// PWM controller index.
        chip: u32,
        /// Channel on that controller.
        channel: u32,
    },
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectionLine { motor, index, line } => {
                write!(f, "motor{motor}_dir_gpio{} (line {line})", index + 1)
            }
            Self::AlarmLine { line } => write!(f, "alarm_gpio (line {line})"),
            Self::PwmChannel {
                motor,
                chip,
                channel,
            } => write!(f, "MOTOR{motor}_PWM (pwmchip{chip}/pwm{channel})"),
        }
    }
}

impl ResourceId {
    /// Label handed to the backend when requesting the resource.
    pub fn label(&self) -> String {
        match self {
            Self::DirectionLine { motor, index, .. } => format!("motor{motor}_dir_gpio{}", index + 1),
            Self::AlarmLine { .. } => "alarm_gpio".to_string(),
            Self::PwmChannel { motor, .. } => format!("MOTOR{motor}_PWM"),
        }
    }
}

/// Trait defining the interface for hardware backends.
///
/// The control core drives two motors (two direction lines plus one PWM
/// channel each) and one alarm line exclusively through this trait, so the
/// PID and steering logic run unchanged against real or simulated hardware.
///
/// # Lifecycle
///
/// 1. `request_*()` - Called in a fixed order when the drive is opened
/// 2. `set_gpio()` / `configure_pwm()` - Called every control cycle
/// 3. `disable_pwm()` / `free_*()` - Called when the drive is released
///
/// Request and configure calls may block on hardware configuration and are
/// never issued while the position lock is held.
pub trait HardwareBackend: Send {
    /// Returns the backend's unique identifier (e.g., "sysfs", "simulation").
    fn name(&self) -> &'static str;

    /// Claim a GPIO line and configure it as an output driven low.
    fn request_gpio(&mut self, line: u32, label: &str) -> Result<(), HalError>;

    /// Drive a claimed GPIO line.
    fn set_gpio(&mut self, line: u32, high: bool) -> Result<(), HalError>;

    /// Release a GPIO line. Best-effort.
    fn free_gpio(&mut self, line: u32);

    /// Claim a PWM channel.
    fn request_pwm(&mut self, chip: u32, channel: u32, label: &str) -> Result<(), HalError>;

    /// Set duty and period of a claimed PWM channel, in nanoseconds.
    fn configure_pwm(
        &mut self,
        chip: u32,
        channel: u32,
        duty_ns: u64,
        period_ns: u64,
    ) -> Result<(), HalError>;

    /// Start the PWM output.
    fn enable_pwm(&mut self, chip: u32, channel: u32) -> Result<(), HalError>;

    /// Stop the PWM output. Best-effort.
    fn disable_pwm(&mut self, chip: u32, channel: u32);

    /// Release a PWM channel. Best-effort.
    fn free_pwm(&mut self, chip: u32, channel: u32);
}

//! Configuration loading traits and types.
//!
//! A single `drive.toml` describes the board wiring, PWM timing, controller
//! gains, steering policy, alert link and backend selection. Every field has a
//! default matching the reference board, so an empty file is a valid config.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vistrack_common::config::{ConfigError, ConfigLoader, DriveConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = DriveConfig::load(Path::new("drive.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::consts::{FRAME_CENTER, SERVICE_NAME};
use crate::hal::consts::*;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "vistrack-drive-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: SERVICE_NAME.to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Wiring of one motor: two exclusive direction lines and one PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorWiring {
    /// Direction lines `(A, B)`. A high alone is forward, B high alone is reverse.
    pub dir_lines: (u32, u32),
    /// PWM channel on `PwmConfig::chip`.
    pub pwm_channel: u32,
}

/// Both motors. `left` is motor 1, `right` is motor 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorsConfig {
    /// Motor 1.
    pub left: MotorWiring,
    /// Motor 2.
    pub right: MotorWiring,
}

impl Default for MotorsConfig {
    fn default() -> Self {
        Self {
            left: MotorWiring {
                dir_lines: (MOTOR1_DIR_LINE_A, MOTOR1_DIR_LINE_B),
                pwm_channel: MOTOR1_PWM_CHANNEL,
            },
            right: MotorWiring {
                dir_lines: (MOTOR2_DIR_LINE_A, MOTOR2_DIR_LINE_B),
                pwm_channel: MOTOR2_PWM_CHANNEL,
            },
        }
    }
}

/// PWM timing shared by both motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmConfig {
    /// PWM controller index.
    pub chip: u32,
    /// Fixed period [ns].
    pub period_ns: u64,
    /// Duty at speed 0 [ns].
    pub min_duty_ns: u64,
    /// Duty at speed 100 [ns].
    pub max_duty_ns: u64,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            chip: PWM_CHIP,
            period_ns: PWM_PERIOD_NS,
            min_duty_ns: MIN_DUTY_NS,
            max_duty_ns: MAX_DUTY_NS,
        }
    }
}

/// Per-motor PID gains and anti-windup limits. Both motors share one set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Integral clamp, must be > 0.
    pub integral_max: f64,
    /// Integral separation threshold, must be > 0.
    pub error_threshold: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            kd: 0.05,
            integral_max: 50.0,
            error_threshold: 30.0,
        }
    }
}

/// Steering policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Horizontal target, percent of frame width.
    pub center: i32,
    /// Half-width of the zero-correction band around `center`.
    pub deadband: i32,
    /// Target speed of both motors while the object is centred.
    pub base_speed: i32,
    /// Speed applied to motor 1 while the object is lost.
    pub search_speed: i32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            center: FRAME_CENTER,
            deadband: 10,
            base_speed: 60,
            search_speed: 50,
        }
    }
}

/// Alert link and alarm pulse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Modem serial device.
    pub tty: PathBuf,
    /// Modem baud rate.
    pub baud: u32,
    /// Alarm line pulse length [ms].
    pub pulse_ms: u64,
    /// Message sent when the object is lost.
    pub lost_message: String,
    /// Message sent on a manual trigger.
    pub manual_message: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            tty: PathBuf::from(MODEM_TTY),
            baud: MODEM_BAUD,
            pulse_ms: ALARM_PULSE_MS,
            lost_message: "ALERT: Object lost!".to_string(),
            manual_message: "ALERT: Manual trigger!".to_string(),
        }
    }
}

/// Detection follower parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Consecutive undetected frames tolerated before a manual alert.
    pub max_lost_frames: u32,
    /// Interval between frame-rate log lines [s].
    pub stats_interval_s: u64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            max_lost_frames: 30,
            stats_interval_s: 5,
        }
    }
}

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Registered backend name ("sysfs" or "simulation").
    pub name: String,
    /// Root of the sysfs class tree used by the sysfs backend.
    pub sysfs_root: PathBuf,
    /// Use the serial alert transport; `false` selects the null transport.
    pub serial_alerts: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "sysfs".to_string(),
            sysfs_root: PathBuf::from(SYSFS_ROOT),
            serial_alerts: true,
        }
    }
}

/// Complete drive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Motor wiring.
    pub motors: MotorsConfig,
    /// Alarm output line.
    pub alarm_line: u32,
    /// PWM timing.
    pub pwm: PwmConfig,
    /// Controller gains.
    pub pid: PidConfig,
    /// Steering policy.
    pub steering: SteeringConfig,
    /// Alert link.
    pub alert: AlertConfig,
    /// Detection follower.
    pub follow: FollowConfig,
    /// Backend selection.
    pub backend: BackendConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            motors: MotorsConfig::default(),
            alarm_line: ALARM_LINE,
            pwm: PwmConfig::default(),
            pid: PidConfig::default(),
            steering: SteeringConfig::default(),
            alert: AlertConfig::default(),
            follow: FollowConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl DriveConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` on the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let lines = [
            self.motors.left.dir_lines.0,
            self.motors.left.dir_lines.1,
            self.motors.right.dir_lines.0,
            self.motors.right.dir_lines.1,
            self.alarm_line,
        ];
        for (i, a) in lines.iter().enumerate() {
            if lines[i + 1..].contains(a) {
                return Err(ConfigError::ValidationError(format!(
                    "GPIO line {a} assigned twice"
                )));
            }
        }
        if self.motors.left.pwm_channel == self.motors.right.pwm_channel {
            return Err(ConfigError::ValidationError(format!(
                "PWM channel {} assigned to both motors",
                self.motors.left.pwm_channel
            )));
        }

        let pwm = &self.pwm;
        if pwm.period_ns == 0 {
            return Err(ConfigError::ValidationError(
                "pwm.period_ns must be > 0".to_string(),
            ));
        }
        if pwm.min_duty_ns > pwm.max_duty_ns || pwm.max_duty_ns > pwm.period_ns {
            return Err(ConfigError::ValidationError(format!(
                "pwm duty window {}..{} does not fit period {}",
                pwm.min_duty_ns, pwm.max_duty_ns, pwm.period_ns
            )));
        }

        let pid = &self.pid;
        for (name, gain) in [("kp", pid.kp), ("ki", pid.ki), ("kd", pid.kd)] {
            if !gain.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "pid.{name} must be finite"
                )));
            }
        }
        if !(pid.integral_max > 0.0 && pid.integral_max.is_finite()) {
            return Err(ConfigError::ValidationError(
                "pid.integral_max must be > 0".to_string(),
            ));
        }
        if !(pid.error_threshold > 0.0 && pid.error_threshold.is_finite()) {
            return Err(ConfigError::ValidationError(
                "pid.error_threshold must be > 0".to_string(),
            ));
        }

        let s = &self.steering;
        if !(0..=100).contains(&s.center) || s.deadband < 0 {
            return Err(ConfigError::ValidationError(
                "steering.center must be 0-100 and deadband >= 0".to_string(),
            ));
        }
        if !(0..=100).contains(&s.base_speed) || !(-100..=100).contains(&s.search_speed) {
            return Err(ConfigError::ValidationError(
                "steering speeds out of range".to_string(),
            ));
        }

        if self.alert.lost_message.is_empty() || self.alert.manual_message.is_empty() {
            return Err(ConfigError::ValidationError(
                "alert messages cannot be empty".to_string(),
            ));
        }
        if self.backend.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        let config = toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

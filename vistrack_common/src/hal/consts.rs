//! Hardware defaults for the two-motor tracking platform.
//!
//! Line numbers use the flat `bank * 32 + offset` numbering of the board's
//! GPIO controller.

/// Motor 1 (left) direction line A: GPIO4_B3.
pub const MOTOR1_DIR_LINE_A: u32 = 4 * 32 + 11;

/// Motor 1 (left) direction line B: GPIO4_B2.
pub const MOTOR1_DIR_LINE_B: u32 = 4 * 32 + 10;

/// Motor 2 (right) direction line A: GPIO3_C4.
pub const MOTOR2_DIR_LINE_A: u32 = 3 * 32 + 20;

/// Motor 2 (right) direction line B: GPIO3_C5.
pub const MOTOR2_DIR_LINE_B: u32 = 3 * 32 + 21;

/// Alarm output line: GPIO1_D7.
pub const ALARM_LINE: u32 = 32 + 15;

/// PWM controller index.
pub const PWM_CHIP: u32 = 0;

/// PWM channel driving motor 1.
pub const MOTOR1_PWM_CHANNEL: u32 = 2;

/// PWM channel driving motor 2.
pub const MOTOR2_PWM_CHANNEL: u32 = 4;

/// PWM period (10 ms).
pub const PWM_PERIOD_NS: u64 = 10_000_000;

/// Duty at full speed (90 %).
pub const MAX_DUTY_NS: u64 = 9_000_000;

/// Duty at zero speed (10 %).
pub const MIN_DUTY_NS: u64 = 1_000_000;

/// Alert modem serial device.
pub const MODEM_TTY: &str = "/dev/ttyUSB0";

/// Alert modem baud rate.
pub const MODEM_BAUD: u32 = 115_200;

/// Duration of the alarm line pulse in milliseconds.
pub const ALARM_PULSE_MS: u64 = 500;

/// Default sysfs class root for the sysfs backend.
pub const SYSFS_ROOT: &str = "/sys/class";

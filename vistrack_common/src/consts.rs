//! System-wide constants for the vistrack workspace.
//!
//! Single source of truth for protocol values and default paths.
//! Imported by all crates.

/// Canonical service name (used for logging and as the default config value).
pub const SERVICE_NAME: &str = "vistrack-drive";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vistrack/drive.toml";

/// Size in bytes of one `ObjectPosition` wire record.
pub const RECORD_SIZE: usize = 16;

/// Horizontal frame centre, in percent of frame width.
pub const FRAME_CENTER: i32 = 50;

/// Upper bound of every percentage field and of the speed magnitude.
pub const PERCENT_MAX: i32 = 100;

/// Device command: apply one signed speed to both motors, bypassing PID.
pub const CMD_SET_SPEED: u32 = 0x100;

/// Device command: fire the manual alert.
pub const CMD_TRIGGER_ALERT: u32 = 0x200;

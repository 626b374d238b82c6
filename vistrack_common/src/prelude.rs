//! Prelude module for common re-exports.
//!
//! ```rust
//! use vistrack_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, DriveConfig, LogLevel};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::consts::{CMD_SET_SPEED, CMD_TRIGGER_ALERT, RECORD_SIZE};
pub use crate::position::ObjectPosition;

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{HalError, HardwareBackend, ResourceId};
pub use crate::hal::transport::{AlertTransport, TransportError};

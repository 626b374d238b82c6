//! Alert transport implementations.
//!
//! - [`serial`] - Modem on a serial tty (the real link)
//! - [`null`] - Discards every message; used when no link is fitted

pub mod null;
pub mod serial;

pub use null::NullTransport;
pub use serial::SerialTransport;

use vistrack_common::config::DriveConfig;
use vistrack_common::hal::transport::AlertTransport;

/// Build the transport selected by `config.backend.serial_alerts`.
pub fn create_transport(config: &DriveConfig) -> Box<dyn AlertTransport> {
    if config.backend.serial_alerts {
        Box::new(SerialTransport::new(&config.alert.tty, config.alert.baud))
    } else {
        Box::new(NullTransport::new())
    }
}

//! Alert message transport trait.
//!
//! The alert channel reports tracking loss over a message link (a 4G modem
//! on the reference board). The link is optional: every failure here is
//! logged by the caller and never fails a drive operation.

use thiserror::Error;

/// Error types for alert transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Transport was never opened or has been closed
    #[error("Transport not initialized")]
    NotOpen,

    /// Underlying link could not be reached
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// Write to the link failed
    #[error("Transport I/O error: {0}")]
    Io(String),
}

/// Message link used to deliver alerts off the platform.
pub trait AlertTransport: Send {
    /// Returns the transport's identifier (e.g., "serial", "null").
    fn name(&self) -> &'static str;

    /// Open and configure the link.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Deliver one alert message.
    fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Close the link. Idempotent.
    fn close(&mut self);

    /// Whether `open()` succeeded and `close()` has not been called since.
    fn is_open(&self) -> bool;
}

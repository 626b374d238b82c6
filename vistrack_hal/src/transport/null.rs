//! Transport that accepts and drops every message.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use vistrack_common::hal::transport::{AlertTransport, TransportError};

/// Null transport: opens unconditionally, every send succeeds.
///
/// Clones share the delivery counter.
#[derive(Debug, Clone, Default)]
pub struct NullTransport {
    open: bool,
    sent: Arc<AtomicU64>,
}

impl NullTransport {
    /// Create a closed null transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl AlertTransport for NullTransport {
    fn name(&self) -> &'static str {
        "null"
    }

    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        Ok(())
    }

    fn send(&mut self, message: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
        debug!("null transport dropped alert: {}", message);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

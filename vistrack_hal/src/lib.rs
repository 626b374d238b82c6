//! # vistrack HAL Library
//!
//! Hardware backends and alert transports for the vistrack drive.
//! Backends implement the `HardwareBackend` trait and transports the
//! `AlertTransport` trait, both defined in `vistrack_common::hal`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Backend factory registration
//! - [`drivers`] - Backend implementations (sysfs, simulation)
//! - [`transport`] - Alert transports (serial, null)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    vistrack_hal (single crate)               │
//! │  ┌──────────────────┐   ┌─────────────────┐                  │
//! │  │ BackendRegistry  │──►│ HardwareBackend │ (trait object)   │
//! │  └──────────────────┘   │  sysfs | sim    │                  │
//! │                         └─────────────────┘                  │
//! │                         ┌─────────────────┐                  │
//! │   create_transport() ──►│ AlertTransport  │ (trait object)   │
//! │                         │  serial | null  │                  │
//! │                         └─────────────────┘                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;
pub mod transport;

// Re-export key types for convenience
pub use crate::driver_registry::BackendRegistry;
pub use crate::drivers::simulation::SimulatedBackend;
pub use crate::drivers::sysfs::SysfsBackend;
pub use crate::transport::{NullTransport, SerialTransport, create_transport};

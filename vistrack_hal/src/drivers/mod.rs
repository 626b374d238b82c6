//! Hardware backend implementations.
//!
//! - [`simulation`] - In-memory backend for development and testing
//! - [`sysfs`] - Linux sysfs GPIO + PWM backend for the real board
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `HardwareBackend` trait from `vistrack_common::hal::driver`
//! 3. Register the factory in [`crate::driver_registry::BackendRegistry::with_builtin`]

pub mod simulation;
pub mod sysfs;

//! Backend registry for hardware backends.
//!
//! Provides a `BackendRegistry` struct for registering and retrieving
//! backend factories. Constructor-injected rather than global.

use std::collections::HashMap;
use vistrack_common::config::DriveConfig;
use vistrack_common::hal::driver::{BackendFactory, HalError, HardwareBackend};

use crate::drivers::{simulation, sysfs};

/// Registry of available hardware backends.
///
/// Constructed at startup, populated via `register()`, and consulted once
/// when the drive is built. No global state.
pub struct BackendRegistry {
    factories: HashMap<&'static str, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in `sysfs` and `simulation` backends.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register("sysfs", sysfs::create_backend);
        reg.register("simulation", simulation::create_backend);
        reg
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BackendFactory) {
        if self.factories.contains_key(name) {
            panic!("Backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<BackendFactory> {
        self.factories.get(name).copied()
    }

    /// Create a backend instance by name.
    ///
    /// # Errors
    /// Returns `HalError::NotFound` if no backend with the given name is registered.
    pub fn create_backend(
        &self,
        name: &str,
        config: &DriveConfig,
    ) -> Result<Box<dyn HardwareBackend>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::NotFound(format!("backend '{name}'")))?;
        Ok(factory(config))
    }

    /// List all registered backend names.
    pub fn list_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

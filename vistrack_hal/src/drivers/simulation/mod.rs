//! Simulation backend module.
//!
//! This module provides an in-memory backend for development and testing
//! without physical hardware.

mod driver;
mod state;

pub use driver::SimulatedBackend;
pub use state::{FailPoint, HalEvent, LineState, PwmState, SimState};

use vistrack_common::config::DriveConfig;
use vistrack_common::hal::driver::HardwareBackend;

/// Factory function to create a simulation backend instance.
///
/// Both motors' direction pairs are registered as exclusive.
pub fn create_backend(config: &DriveConfig) -> Box<dyn HardwareBackend> {
    Box::new(for_config(config))
}

/// Build a simulated board watching the direction pairs named in `config`.
pub fn for_config(config: &DriveConfig) -> SimulatedBackend {
    let sim = SimulatedBackend::new();
    for wiring in [config.motors.left, config.motors.right] {
        sim.watch_exclusive(wiring.dir_lines.0, wiring.dir_lines.1);
    }
    sim
}

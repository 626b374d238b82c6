//! Shared rig: a control core on a simulated board with a null transport.

use std::sync::Arc;
use vistrack_common::config::DriveConfig;
use vistrack_drive::ControlCore;
use vistrack_hal::drivers::simulation;
use vistrack_hal::{NullTransport, SimulatedBackend};

pub struct Rig {
    pub sim: SimulatedBackend,
    pub transport: NullTransport,
    pub core: Arc<ControlCore>,
}

/// Board defaults with a zero-length alarm pulse.
pub fn test_config() -> DriveConfig {
    let mut config = DriveConfig::default();
    config.alert.pulse_ms = 0;
    config
}

pub fn rig_with(config: DriveConfig) -> Rig {
    let sim = simulation::for_config(&config);
    let transport = NullTransport::new();
    let core = ControlCore::new(config, Box::new(sim.clone()), Box::new(transport.clone()))
        .expect("valid config");
    Rig {
        sim,
        transport,
        core: Arc::new(core),
    }
}

/// Rig with the drive already acquired.
pub fn acquired() -> Rig {
    let rig = rig_with(test_config());
    rig.core.acquire().expect("acquire on a fresh board");
    rig
}

//! Integration test: session lifecycle and teardown.

use std::sync::Arc;
use vistrack_common::position::ObjectPosition;
use vistrack_drive::{ControlCore, DriveError, LifecycleState, MotorDevice};
use vistrack_hal::drivers::simulation::{self, HalEvent};
use vistrack_hal::{SerialTransport, SimulatedBackend};

use super::common::{acquired, rig_with, test_config};

#[test]
fn release_stops_motors_and_frees_everything() {
    let rig = acquired();
    rig.core.write(ObjectPosition::centered(10)).unwrap();

    rig.core.release();

    assert_eq!(rig.core.state(), LifecycleState::Released);
    assert_eq!(rig.sim.claimed_count(), 0);
    let events = rig.sim.events();
    for channel in [2, 4] {
        let disabled = events
            .iter()
            .position(|e| *e == HalEvent::PwmDisabled(0, channel))
            .unwrap();
        let freed = events
            .iter()
            .position(|e| *e == HalEvent::PwmFreed(0, channel))
            .unwrap();
        assert!(disabled < freed);
    }
    // Motor lines were driven low before being freed.
    let (a, _) = rig.core.config().motors.left.dir_lines;
    let last_set = events
        .iter()
        .rposition(|e| matches!(e, HalEvent::GpioSet(line, _) if *line == a))
        .unwrap();
    assert_eq!(events[last_set], HalEvent::GpioSet(a, false));
}

#[test]
fn operations_after_release_fail() {
    let rig = acquired();
    rig.core.release();
    assert!(matches!(rig.core.read(), Err(DriveError::NotAcquired)));
    assert!(matches!(
        rig.core.write(ObjectPosition::centered(10)),
        Err(DriveError::NotAcquired)
    ));
    assert!(matches!(
        rig.core.ioctl(0x200, 0),
        Err(DriveError::NotAcquired)
    ));
    assert_eq!(rig.core.cycles(), 0);
}

#[test]
fn reacquire_after_release() {
    let rig = acquired();
    rig.core.write(ObjectPosition::centered(10)).unwrap();
    rig.core.release();

    rig.core.acquire().unwrap();
    assert_eq!(rig.core.state(), LifecycleState::Ready);
    let [m1, m2] = rig.core.motors().unwrap();
    assert_eq!(m1.current_speed, 0);
    assert_eq!(m2.integral, 0.0);
    // The last snapshot survives across sessions.
    assert_eq!(rig.core.read().unwrap(), ObjectPosition::centered(10));
}

#[test]
fn dropping_the_core_releases_hardware() {
    let rig = acquired();
    let sim = rig.sim.clone();
    drop(rig);
    assert_eq!(sim.claimed_count(), 0);
}

#[test]
fn device_handle_owns_the_session() {
    let rig = rig_with(test_config());
    let dev = MotorDevice::open(Arc::clone(&rig.core)).unwrap();
    assert!(rig.core.state().is_active());
    drop(dev);
    assert_eq!(rig.core.state(), LifecycleState::Released);
    assert_eq!(rig.sim.claimed_count(), 0);
}

#[test]
fn missing_modem_does_not_block_acquire() {
    let config = test_config();
    let sim: SimulatedBackend = simulation::for_config(&config);
    let core = ControlCore::new(
        config,
        Box::new(sim.clone()),
        Box::new(SerialTransport::new("/nonexistent/ttyUSB9", 115_200)),
    )
    .unwrap();

    core.acquire().unwrap();
    core.write(ObjectPosition::lost()).unwrap();

    // The message is dropped, the alarm still pulses.
    assert_eq!(core.alerts_raised(), 1);
    assert_eq!(sim.rising_edges(core.config().alarm_line), 1);
}

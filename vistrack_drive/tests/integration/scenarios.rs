//! Integration test: control scenarios on the simulated board.

use vistrack_common::consts::CMD_SET_SPEED;
use vistrack_common::hal::driver::ResourceId;
use vistrack_common::position::ObjectPosition;
use vistrack_drive::control::output::Direction;
use vistrack_drive::{CycleOutcome, DriveError, LifecycleState};
use vistrack_hal::drivers::simulation::{FailPoint, HalEvent};

use super::common::{acquired, rig_with, test_config};

const RIGHT_OF_CENTRE: ObjectPosition = ObjectPosition {
    x: 70,
    y: 50,
    width: 10,
    detected: true,
};

#[test]
fn object_right_of_centre_steers_left_motor_harder() {
    let rig = acquired();
    let outcome = rig.core.write(RIGHT_OF_CENTRE).unwrap();

    // Left: error 70 from rest -> 70 + 0.05 * 70 = 73.5.
    // Right: error 60 from rest -> 60 + 0.05 * 60 = 63.
    assert_eq!(
        outcome,
        CycleOutcome::Tracked {
            targets: [70, 60],
            outputs: [73, 63],
        }
    );
    let [m1, m2] = rig.core.motors().unwrap();
    assert_eq!((m1.target_speed, m2.target_speed), (70, 60));
    assert_eq!((m1.current_speed, m2.current_speed), (73, 63));
    assert_eq!(m1.direction, Direction::Forward);
    assert_eq!(m2.direction, Direction::Forward);
    assert_eq!(rig.core.state(), LifecycleState::Running);
    assert_eq!(rig.core.alerts_raised(), 0);
}

#[test]
fn lost_object_searches_and_alerts_once() {
    let rig = acquired();
    let alarm = rig.core.config().alarm_line;

    let outcome = rig.core.write(ObjectPosition::lost()).unwrap();

    assert_eq!(outcome, CycleOutcome::Searched { speed: 50 });
    let [m1, m2] = rig.core.motors().unwrap();
    assert_eq!(m1.target_speed, 50);
    assert_eq!(m1.current_speed, 50);
    assert_eq!(m1.direction, Direction::Forward);
    assert_eq!(m2.current_speed, 0);
    assert_eq!(m2.direction, Direction::Stopped);

    assert_eq!(rig.core.alerts_raised(), 1);
    assert_eq!(rig.transport.sent(), 1);
    assert_eq!(rig.sim.rising_edges(alarm), 1);
    assert_eq!(rig.sim.level(alarm), Some(false));
}

#[test]
fn every_lost_cycle_alerts() {
    let rig = acquired();
    for _ in 0..3 {
        rig.core.write(ObjectPosition::lost()).unwrap();
    }
    assert_eq!(rig.core.alerts_raised(), 3);
}

#[test]
fn third_resource_failure_rolls_back() {
    let rig = rig_with(test_config());
    let motor2_a = rig.core.config().motors.right.dir_lines.0;
    rig.sim.inject_failure(FailPoint::GpioRequest(motor2_a));

    let err = rig.core.acquire().unwrap_err();

    match err {
        DriveError::ResourceAcquisition { resource, .. } => assert_eq!(
            resource,
            ResourceId::DirectionLine {
                motor: 2,
                index: 0,
                line: motor2_a,
            }
        ),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(rig.core.state(), LifecycleState::Uninitialized);
    assert_eq!(rig.sim.claimed_count(), 0);

    let (m1a, m1b) = rig.core.config().motors.left.dir_lines;
    assert_eq!(
        rig.sim.events(),
        vec![
            HalEvent::GpioRequested(m1a),
            HalEvent::GpioRequested(m1b),
            HalEvent::GpioFreed(m1b),
            HalEvent::GpioFreed(m1a),
        ]
    );
}

#[test]
fn acquire_succeeds_after_failure_is_cleared() {
    let rig = rig_with(test_config());
    let alarm = rig.core.config().alarm_line;
    rig.sim.inject_failure(FailPoint::GpioRequest(alarm));
    assert!(rig.core.acquire().is_err());

    rig.sim.clear_failure(FailPoint::GpioRequest(alarm));
    rig.core.acquire().unwrap();
    assert_eq!(rig.core.state(), LifecycleState::Ready);
}

#[test]
fn manual_speed_overrides_both_motors() {
    let rig = acquired();
    rig.core.write(RIGHT_OF_CENTRE).unwrap();

    rig.core.ioctl(CMD_SET_SPEED, 40).unwrap();

    let [m1, m2] = rig.core.motors().unwrap();
    assert_eq!((m1.current_speed, m2.current_speed), (40, 40));
    assert_eq!(m1.direction, Direction::Forward);
    assert_eq!(m2.direction, Direction::Forward);
    // Steering targets are left alone.
    assert_eq!((m1.target_speed, m2.target_speed), (70, 60));
}

#[test]
fn negative_manual_speed_reverses_both_motors() {
    let rig = acquired();
    rig.core.ioctl(CMD_SET_SPEED, (-40i32) as u32 as u64).unwrap();

    let [m1, m2] = rig.core.motors().unwrap();
    assert_eq!(m1.direction, Direction::Reverse);
    assert_eq!(m2.direction, Direction::Reverse);
    assert_eq!((m1.current_speed, m2.current_speed), (40, 40));
    assert_eq!(rig.sim.exclusion_violations(), 0);
}

#[test]
fn write_then_read_returns_same_snapshot() {
    let rig = acquired();
    for p in [RIGHT_OF_CENTRE, ObjectPosition::lost(), ObjectPosition::centered(33)] {
        rig.core.write(p).unwrap();
        assert_eq!(rig.core.read().unwrap(), p);
    }
}

#[test]
fn hardware_failure_is_local_to_the_cycle() {
    let rig = acquired();
    let (chip, channel) = (rig.core.config().pwm.chip, rig.core.config().motors.right.pwm_channel);
    rig.sim.inject_failure(FailPoint::PwmConfigure(chip, channel));

    let err = rig.core.write(RIGHT_OF_CENTRE).unwrap_err();
    assert!(matches!(err, DriveError::Hardware(_)));
    assert_eq!(err.errno(), libc::EIO);

    // Motor 1 applied before the failure, motor 2 kept its last state.
    let [m1, m2] = rig.core.motors().unwrap();
    assert_eq!(m1.current_speed, 73);
    assert_eq!(m2.current_speed, 0);
    assert_eq!(rig.core.read().unwrap(), RIGHT_OF_CENTRE);

    rig.sim.clear_failure(FailPoint::PwmConfigure(chip, channel));
    assert!(rig.core.write(RIGHT_OF_CENTRE).is_ok());
}

//! Property tests for the control pipeline.

use proptest::prelude::*;
use vistrack_common::config::{MotorsConfig, PwmConfig};
use vistrack_common::hal::driver::HardwareBackend;
use vistrack_common::position::ObjectPosition;
use vistrack_drive::control::output::{Direction, HardwareOutput};
use vistrack_drive::control::pid::{PidGains, PidState, pid_step};
use vistrack_drive::control::steering::SteeringPolicy;
use vistrack_hal::SimulatedBackend;

use super::common::acquired;

fn gains() -> impl Strategy<Value = PidGains> {
    (
        -10.0..10.0f64,
        -10.0..10.0f64,
        -10.0..10.0f64,
        0.1..500.0f64,
        0.1..500.0f64,
    )
        .prop_map(|(kp, ki, kd, integral_max, error_threshold)| PidGains {
            kp,
            ki,
            kd,
            integral_max,
            error_threshold,
        })
}

fn position() -> impl Strategy<Value = ObjectPosition> {
    (0..=100i32, 0..=100i32, 0..=100i32, any::<bool>()).prop_map(|(x, y, width, detected)| {
        ObjectPosition {
            x,
            y,
            width,
            detected,
        }
    })
}

proptest! {
    #[test]
    fn output_direction_and_duty(speed in -100..=100i32) {
        let wiring = MotorsConfig::default().left;
        let pwm = PwmConfig::default();
        let mut sim = SimulatedBackend::new();
        sim.request_gpio(wiring.dir_lines.0, "a").unwrap();
        sim.request_gpio(wiring.dir_lines.1, "b").unwrap();
        sim.request_pwm(pwm.chip, wiring.pwm_channel, "pwm").unwrap();
        let mut out = HardwareOutput::new(1, &wiring, &pwm);

        let applied = out.apply(&mut sim, speed).unwrap();

        let expected = match speed.signum() {
            1 => Direction::Forward,
            -1 => Direction::Reverse,
            _ => Direction::Stopped,
        };
        prop_assert_eq!(applied.direction, expected);
        let span = pwm.max_duty_ns - pwm.min_duty_ns;
        prop_assert_eq!(
            applied.duty_ns,
            pwm.min_duty_ns + span * u64::from(speed.unsigned_abs()) / 100
        );
        let (a, b) = Direction::line_levels(expected);
        prop_assert_eq!(sim.level(wiring.dir_lines.0), Some(a));
        prop_assert_eq!(sim.level(wiring.dir_lines.1), Some(b));
    }

    #[test]
    fn pid_stays_bounded(
        g in gains(),
        steps in prop::collection::vec((-1000..1000i32, -1000..1000i32), 1..64),
    ) {
        let mut state = PidState::default();
        for (target, current) in steps {
            let out = pid_step(&mut state, &g, target, current);
            prop_assert!((-100..=100).contains(&out));
            prop_assert!(state.integral().abs() <= g.integral_max);

            let error = f64::from(target) - f64::from(current);
            if error.abs() >= g.error_threshold {
                prop_assert_eq!(state.integral(), 0.0);
            }
        }
    }

    #[test]
    fn steering_is_pure(p in position()) {
        let policy = SteeringPolicy::default();
        prop_assert_eq!(policy.compute(&p), policy.compute(&p));
    }

    #[test]
    fn write_read_round_trip(p in position()) {
        let rig = acquired();
        rig.core.write(p).unwrap();
        prop_assert_eq!(rig.core.read().unwrap(), p);
    }
}

//! Backend integration tests.
//!
//! Drives each built-in backend through the `HardwareBackend` trait object
//! in the same order the control core uses when opening and releasing the
//! drive.

use std::fs;
use tempfile::TempDir;
use vistrack_common::config::DriveConfig;
use vistrack_common::hal::driver::HardwareBackend;
use vistrack_hal::BackendRegistry;
use vistrack_hal::drivers::simulation::{self, HalEvent};

/// Claim every resource of the reference board, then release in reverse.
fn open_and_release(backend: &mut dyn HardwareBackend, config: &DriveConfig) {
    let m1 = config.motors.left;
    let m2 = config.motors.right;
    for line in [
        m1.dir_lines.0,
        m1.dir_lines.1,
        m2.dir_lines.0,
        m2.dir_lines.1,
        config.alarm_line,
    ] {
        backend.request_gpio(line, "test").expect("request gpio");
    }
    for ch in [m1.pwm_channel, m2.pwm_channel] {
        backend.request_pwm(config.pwm.chip, ch, "test").expect("request pwm");
        backend
            .configure_pwm(config.pwm.chip, ch, 0, config.pwm.period_ns)
            .expect("configure pwm");
        backend.enable_pwm(config.pwm.chip, ch).expect("enable pwm");
    }

    backend.set_gpio(m1.dir_lines.1, false).unwrap();
    backend.set_gpio(m1.dir_lines.0, true).unwrap();

    for ch in [m1.pwm_channel, m2.pwm_channel] {
        backend.disable_pwm(config.pwm.chip, ch);
        backend.free_pwm(config.pwm.chip, ch);
    }
    for line in [
        m1.dir_lines.0,
        m1.dir_lines.1,
        m2.dir_lines.0,
        m2.dir_lines.1,
        config.alarm_line,
    ] {
        backend.free_gpio(line);
    }
}

#[test]
fn simulation_full_cycle_leaves_nothing_claimed() {
    let config = DriveConfig::default();
    let sim = simulation::for_config(&config);
    let mut owned = sim.clone();

    open_and_release(&mut owned, &config);

    assert_eq!(sim.claimed_count(), 0);
    assert_eq!(sim.exclusion_violations(), 0);
    let events = sim.events();
    assert_eq!(events[0], HalEvent::GpioRequested(config.motors.left.dir_lines.0));
    assert_eq!(
        *events.last().unwrap(),
        HalEvent::GpioFreed(config.alarm_line)
    );
}

#[test]
fn sysfs_full_cycle_via_registry() {
    let tmp = TempDir::new().unwrap();
    let mut config = DriveConfig::default();
    config.backend.sysfs_root = tmp.path().to_path_buf();

    for line in [139, 138, 116, 117, 47] {
        fs::create_dir_all(tmp.path().join(format!("gpio/gpio{line}"))).unwrap();
    }
    for ch in [2, 4] {
        fs::create_dir_all(tmp.path().join(format!("pwm/pwmchip0/pwm{ch}"))).unwrap();
    }

    let registry = BackendRegistry::with_builtin();
    let mut backend = registry.create_backend("sysfs", &config).unwrap();
    assert_eq!(backend.name(), "sysfs");

    open_and_release(backend.as_mut(), &config);

    let value = fs::read_to_string(tmp.path().join("gpio/gpio139/value")).unwrap();
    assert_eq!(value, "1");
    let enable = fs::read_to_string(tmp.path().join("pwm/pwmchip0/pwm4/enable")).unwrap();
    assert_eq!(enable, "0");
    let unexport = fs::read_to_string(tmp.path().join("pwm/pwmchip0/unexport")).unwrap();
    assert_eq!(unexport, "4");
}

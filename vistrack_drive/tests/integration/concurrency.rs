//! Integration test: concurrent readers, writers and waiters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use vistrack_common::consts::CMD_SET_SPEED;
use vistrack_common::position::ObjectPosition;
use vistrack_drive::{DriveError, PollFlags};

use super::common::acquired;

/// Position whose fields all equal `k`, detected when `k` is even.
fn tagged(k: i32) -> ObjectPosition {
    ObjectPosition {
        x: k,
        y: k,
        width: k,
        detected: k % 2 == 0,
    }
}

#[test]
fn snapshots_are_never_torn() {
    let rig = acquired();
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let core = Arc::clone(&rig.core);
            thread::spawn(move || {
                for i in 0..50 {
                    core.write(tagged(w * 25 + i % 25)).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let core = Arc::clone(&rig.core);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0u32;
                while !done.load(Ordering::SeqCst) {
                    let p = core.read().unwrap();
                    assert_eq!(p.x, p.y);
                    assert_eq!(p.y, p.width);
                    assert_eq!(p.detected, p.x % 2 == 0);
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for r in readers {
        r.join().unwrap();
    }

    assert_eq!(rig.core.cycles(), 200);
    assert_eq!(rig.sim.exclusion_violations(), 0);
}

#[test]
fn direction_lines_stay_exclusive_under_mixed_load() {
    let rig = acquired();
    let tracker = {
        let core = Arc::clone(&rig.core);
        thread::spawn(move || {
            for x in (0..=100).step_by(5) {
                core.write(ObjectPosition {
                    x,
                    y: 50,
                    width: 10,
                    detected: true,
                })
                .unwrap();
            }
        })
    };
    let overrider = {
        let core = Arc::clone(&rig.core);
        thread::spawn(move || {
            for speed in [-80i32, 60, -20, 100, -100, 5] {
                core.ioctl(CMD_SET_SPEED, speed as u32 as u64).unwrap();
            }
        })
    };
    tracker.join().unwrap();
    overrider.join().unwrap();
    assert_eq!(rig.sim.exclusion_violations(), 0);
}

#[test]
fn waiter_wakes_on_detection() {
    let rig = acquired();
    rig.core.write(ObjectPosition::lost()).unwrap();

    let waiter = {
        let core = Arc::clone(&rig.core);
        thread::spawn(move || core.wait_detected(Some(Duration::from_secs(5))))
    };
    thread::sleep(Duration::from_millis(20));
    rig.core.write(ObjectPosition::centered(12)).unwrap();

    let woke = waiter.join().unwrap().unwrap();
    assert_eq!(woke, Some(ObjectPosition::centered(12)));
}

#[test]
fn late_waiter_sees_current_state() {
    let rig = acquired();
    rig.core.write(ObjectPosition::centered(7)).unwrap();
    assert_eq!(rig.core.poll(), PollFlags::READABLE | PollFlags::READ_NORMAL);
    assert_eq!(
        rig.core.wait_detected(Some(Duration::ZERO)).unwrap(),
        Some(ObjectPosition::centered(7))
    );
}

#[test]
fn wait_times_out_while_lost() {
    let rig = acquired();
    rig.core.write(ObjectPosition::lost()).unwrap();
    assert!(rig.core.poll().is_empty());
    assert_eq!(
        rig.core.wait_detected(Some(Duration::from_millis(20))).unwrap(),
        None
    );
}

#[test]
fn release_wakes_blocked_waiters() {
    let rig = acquired();
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let core = Arc::clone(&rig.core);
            thread::spawn(move || core.wait_detected(None))
        })
        .collect();
    thread::sleep(Duration::from_millis(20));

    rig.core.release();

    for w in waiters {
        assert!(matches!(w.join().unwrap(), Err(DriveError::NotAcquired)));
    }
}

#[test]
fn alert_pulse_does_not_block_readers() {
    let mut config = super::common::test_config();
    config.alert.pulse_ms = 200;
    let rig = super::common::rig_with(config);
    rig.core.acquire().unwrap();

    let writer = {
        let core = Arc::clone(&rig.core);
        thread::spawn(move || core.write(ObjectPosition::lost()))
    };
    thread::sleep(Duration::from_millis(50));

    // Mid-pulse: the snapshot is readable and a new cycle can run.
    assert_eq!(rig.core.read().unwrap(), ObjectPosition::lost());
    rig.core.write(ObjectPosition::centered(10)).unwrap();

    writer.join().unwrap().unwrap();
    assert_eq!(rig.core.alerts_raised(), 1);
}

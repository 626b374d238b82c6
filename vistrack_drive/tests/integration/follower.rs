//! Integration test: detection follower over the device surface.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use vistrack_common::config::FollowConfig;
use vistrack_common::position::ObjectPosition;
use vistrack_drive::{Follower, MotorDevice};

use super::common::{rig_with, test_config};

fn follow_config(max_lost_frames: u32) -> FollowConfig {
    FollowConfig {
        max_lost_frames,
        stats_interval_s: 0,
    }
}

#[test]
fn long_loss_raises_one_manual_alert() {
    let rig = rig_with(test_config());
    let dev = MotorDevice::open(Arc::clone(&rig.core)).unwrap();
    let mut follower = Follower::new(dev, &follow_config(30));

    let frames = std::iter::repeat_n(ObjectPosition::lost(), 35);
    let summary = follower.run(frames, &AtomicBool::new(true)).unwrap();

    assert_eq!(summary.frames, 35);
    assert_eq!(summary.detected, 0);
    assert_eq!(summary.loss_alerts, 1);
    // 35 per-cycle lost alerts plus the debounced manual one.
    assert_eq!(rig.core.alerts_raised(), 36);
    assert_eq!(follower.lost_frames(), 4);
}

#[test]
fn detection_resets_the_loss_streak() {
    let rig = rig_with(test_config());
    let dev = MotorDevice::open(Arc::clone(&rig.core)).unwrap();
    let mut follower = Follower::new(dev, &follow_config(2));

    let mut alerts = 0;
    for detected in [false, false, true, false, false, false] {
        let p = if detected {
            ObjectPosition::centered(10)
        } else {
            ObjectPosition::lost()
        };
        if follower.feed(p).unwrap() {
            alerts += 1;
        }
    }
    assert_eq!(alerts, 1);
    assert_eq!(follower.summary().detected, 1);
    assert_eq!(rig.core.cycles(), 6);
}

#[test]
fn stop_flag_ends_the_run() {
    let rig = rig_with(test_config());
    let dev = MotorDevice::open(Arc::clone(&rig.core)).unwrap();
    let mut follower = Follower::new(dev, &follow_config(30));

    let summary = follower
        .run(
            std::iter::repeat(ObjectPosition::centered(10)),
            &AtomicBool::new(false),
        )
        .unwrap();
    assert_eq!(summary.frames, 0);
}

#[test]
fn finish_releases_the_drive() {
    let rig = rig_with(test_config());
    let dev = MotorDevice::open(Arc::clone(&rig.core)).unwrap();
    let mut follower = Follower::new(dev, &follow_config(30));
    follower.feed(ObjectPosition::centered(10)).unwrap();

    let summary = follower.finish();
    assert_eq!(summary.frames, 1);
    assert_eq!(rig.sim.claimed_count(), 0);
    assert!(!rig.core.state().is_active());
}

//! Detection follower: feeds detector snapshots into the drive.
//!
//! Per frame the follower debounces tracking loss (a manual alert after
//! `max_lost_frames` consecutive misses), writes the snapshot record
//! through the device surface, and every `stats_interval` logs the frame
//! rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vistrack_common::config::FollowConfig;
use vistrack_common::consts::CMD_TRIGGER_ALERT;
use vistrack_common::position::ObjectPosition;

use crate::device::MotorDevice;
use crate::error::DriveError;

/// Counts consecutive undetected frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossDebouncer {
    max_lost_frames: u32,
    lost: u32,
}

impl LossDebouncer {
    /// Debouncer firing after more than `max_lost_frames` misses in a row.
    pub fn new(max_lost_frames: u32) -> Self {
        Self {
            max_lost_frames,
            lost: 0,
        }
    }

    /// Record one frame. Returns `true` when the alert should fire; the
    /// count then starts over.
    pub fn observe(&mut self, detected: bool) -> bool {
        if detected {
            self.lost = 0;
            return false;
        }
        self.lost += 1;
        if self.lost > self.max_lost_frames {
            self.lost = 0;
            true
        } else {
            false
        }
    }

    /// Misses counted so far.
    pub fn lost_frames(&self) -> u32 {
        self.lost
    }
}

/// Totals for one follower run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowSummary {
    /// Frames written to the drive.
    pub frames: u64,
    /// Frames with the object detected.
    pub detected: u64,
    /// Manual alerts fired by the debouncer.
    pub loss_alerts: u64,
}

/// Drives one open [`MotorDevice`] from a stream of snapshots.
#[derive(Debug)]
pub struct Follower {
    device: MotorDevice,
    debouncer: LossDebouncer,
    stats_interval: Duration,
    window_start: Instant,
    window_frames: u64,
    summary: FollowSummary,
}

impl Follower {
    /// Follower over `device` using the `[follow]` settings.
    pub fn new(device: MotorDevice, config: &FollowConfig) -> Self {
        Self {
            device,
            debouncer: LossDebouncer::new(config.max_lost_frames),
            stats_interval: Duration::from_secs(config.stats_interval_s),
            window_start: Instant::now(),
            window_frames: 0,
            summary: FollowSummary::default(),
        }
    }

    /// Handle one detector frame. Returns whether a loss alert fired.
    pub fn feed(&mut self, position: ObjectPosition) -> Result<bool, DriveError> {
        let alert = self.debouncer.observe(position.detected);
        if alert {
            warn!("Object lost for more than {} frames", self.debouncer.max_lost_frames);
            self.device.ioctl(CMD_TRIGGER_ALERT, 0)?;
            self.summary.loss_alerts += 1;
        }

        self.device.write(&position.to_record()[..])?;
        self.summary.frames += 1;
        if position.detected {
            self.summary.detected += 1;
        }
        self.tick();
        Ok(alert)
    }

    fn tick(&mut self) {
        self.window_frames += 1;
        let elapsed = self.window_start.elapsed();
        if !self.stats_interval.is_zero() && elapsed >= self.stats_interval {
            info!(
                "FPS: {:.2}",
                self.window_frames as f64 / elapsed.as_secs_f64()
            );
            self.window_frames = 0;
            self.window_start = Instant::now();
        }
    }

    /// Feed `frames` until they run out, `running` clears, or a write fails.
    pub fn run<I>(&mut self, frames: I, running: &AtomicBool) -> Result<FollowSummary, DriveError>
    where
        I: IntoIterator<Item = ObjectPosition>,
    {
        info!("Starting control loop");
        for position in frames {
            if !running.load(Ordering::SeqCst) {
                debug!("Stop requested");
                break;
            }
            self.feed(position)?;
        }
        info!(
            "Control loop finished: {} frames, {} detected, {} loss alerts",
            self.summary.frames, self.summary.detected, self.summary.loss_alerts
        );
        Ok(self.summary)
    }

    /// Totals so far.
    pub fn summary(&self) -> FollowSummary {
        self.summary
    }

    /// Current loss streak.
    pub fn lost_frames(&self) -> u32 {
        self.debouncer.lost_frames()
    }

    /// The device being driven.
    pub fn device(&self) -> &MotorDevice {
        &self.device
    }

    /// Stop following and release the drive.
    pub fn finish(self) -> FollowSummary {
        let summary = self.summary;
        self.device.close();
        summary
    }
}

//! Latest-value position channel with blocking readiness.
//!
//! Holds exactly one `ObjectPosition`. Writers overwrite it; readers copy
//! it. Every `set` wakes all waiters after the lock is dropped. Readiness is
//! level-triggered: the channel is ready whenever the stored snapshot has
//! `detected = true`, not when it changed.

use bitflags::bitflags;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use vistrack_common::position::ObjectPosition;

bitflags! {
    /// Readiness reported by `poll`. Bit values match the POSIX poll events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PollFlags: u16 {
        /// Data available.
        const READABLE = libc::POLLIN as u16;
        /// Normal data available.
        const READ_NORMAL = libc::POLLRDNORM as u16;
    }
}

impl PollFlags {
    /// Flags reported for a detected object.
    pub const DETECTED: Self = Self::READABLE.union(Self::READ_NORMAL);
}

/// Result of a blocking wait on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The stored snapshot reports the object as detected.
    Detected(ObjectPosition),
    /// Deadline passed with nothing detected.
    TimedOut,
    /// The session closed while waiting.
    Closed,
}

#[derive(Debug, Default)]
struct Slot {
    position: ObjectPosition,
    updates: u64,
    open: bool,
}

/// Single-slot position store shared by the write path, readers and waiters.
#[derive(Debug, Default)]
pub struct PositionChannel {
    slot: Mutex<Slot>,
    updated: Condvar,
}

impl PositionChannel {
    /// Empty, closed channel holding the zero snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored snapshot and wake every waiter.
    pub fn set(&self, position: ObjectPosition) {
        {
            let mut slot = self.slot.lock();
            slot.position = position;
            slot.updates += 1;
        }
        self.updated.notify_all();
    }

    /// Copy of the stored snapshot.
    pub fn get(&self) -> ObjectPosition {
        self.slot.lock().position
    }

    /// Number of `set` calls so far.
    pub fn updates(&self) -> u64 {
        self.slot.lock().updates
    }

    /// Current readiness. Never blocks.
    pub fn poll(&self) -> PollFlags {
        if self.slot.lock().position.detected {
            PollFlags::DETECTED
        } else {
            PollFlags::empty()
        }
    }

    /// Block until the stored snapshot is detected, the deadline passes,
    /// or the channel closes. `None` waits without a deadline.
    pub fn wait_detected(&self, timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut slot = self.slot.lock();
        loop {
            if !slot.open {
                return WaitOutcome::Closed;
            }
            if slot.position.detected {
                return WaitOutcome::Detected(slot.position);
            }
            match deadline {
                None => self.updated.wait(&mut slot),
                Some(deadline) => {
                    if self.updated.wait_until(&mut slot, deadline).timed_out() {
                        return match (slot.open, slot.position.detected) {
                            (false, _) => WaitOutcome::Closed,
                            (true, true) => WaitOutcome::Detected(slot.position),
                            (true, false) => WaitOutcome::TimedOut,
                        };
                    }
                }
            }
        }
    }

    /// Accept waiters. Called when a session starts.
    pub(crate) fn open(&self) {
        self.slot.lock().open = true;
    }

    /// Release every waiter with `Closed`. Called when a session ends.
    pub(crate) fn close(&self) {
        self.slot.lock().open = false;
        self.updated.notify_all();
    }

    /// Whether a session is accepting waiters.
    pub fn is_open(&self) -> bool {
        self.slot.lock().open
    }
}

//! # vistrack Drive Library
//!
//! Motor control core for a two-motor tracking platform. A detector reports
//! where the tracked object sits in the camera frame; each report runs one
//! control cycle that steers the motors toward it, or searches and raises
//! an alert when the object is lost.
//!
//! ## Layers
//!
//! 1. **control**: steering policy, per-motor PID, output stage
//! 2. **channel**: latest-value position store with blocking readiness
//! 3. **alert**: modem message plus alarm-line pulse
//! 4. **core**: session lifecycle and the device operations
//! 5. **device**: byte-record surface (read/write/ioctl/poll)
//! 6. **follow**: loss debouncing and frame statistics for the binary
//!
//! ## Concurrency
//!
//! `ControlCore` is shared behind an `Arc`; reads, writes, commands and
//! waits may run on any number of threads at once.

pub mod alert;
pub mod channel;
pub mod command;
pub mod control;
pub mod core;
pub mod device;
pub mod error;
pub mod follow;

pub use crate::channel::{PollFlags, PositionChannel};
pub use crate::command::DriveCommand;
pub use crate::core::{ControlCore, CycleOutcome, LifecycleState, MotorSnapshot};
pub use crate::device::{BoundaryFault, MotorDevice, UserSink, UserSource};
pub use crate::error::DriveError;
pub use crate::follow::{Follower, LossDebouncer};

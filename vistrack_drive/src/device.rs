//! Byte-level device surface over a shared [`ControlCore`].
//!
//! Mirrors a character device: opening acquires the hardware, reads and
//! writes move one 16-byte position record, `ioctl` takes a raw code and
//! argument, dropping the handle releases everything. Caller buffers are
//! reached only through [`UserSource`] / [`UserSink`], whose copies may
//! fault.

use std::sync::Arc;
use thiserror::Error;
use vistrack_common::consts::RECORD_SIZE;
use vistrack_common::position::ObjectPosition;

use crate::channel::PollFlags;
use crate::core::ControlCore;
use crate::error::DriveError;

/// A copy to or from caller memory failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Bad address")]
pub struct BoundaryFault;

/// Caller memory the device reads from.
pub trait UserSource {
    /// Bytes available.
    fn len(&self) -> usize;

    /// Whether no bytes are available.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the first `dst.len()` bytes into `dst`.
    fn copy_out(&self, dst: &mut [u8]) -> Result<(), BoundaryFault>;
}

/// Caller memory the device writes into.
pub trait UserSink {
    /// Bytes of room.
    fn len(&self) -> usize;

    /// Whether there is no room at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `src` into the first `src.len()` bytes.
    fn copy_in(&mut self, src: &[u8]) -> Result<(), BoundaryFault>;
}

impl UserSource for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_out(&self, dst: &mut [u8]) -> Result<(), BoundaryFault> {
        let src = self.get(..dst.len()).ok_or(BoundaryFault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserSink for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_in(&mut self, src: &[u8]) -> Result<(), BoundaryFault> {
        let dst = self.get_mut(..src.len()).ok_or(BoundaryFault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// An open handle on the drive.
#[derive(Debug)]
pub struct MotorDevice {
    core: Arc<ControlCore>,
}

impl MotorDevice {
    /// Acquire the hardware and return a handle. Fails with `Busy` while
    /// another handle is open.
    pub fn open(core: Arc<ControlCore>) -> Result<Self, DriveError> {
        core.acquire()?;
        Ok(Self { core })
    }

    /// Copy the current position record into `dst`.
    ///
    /// Returns the number of bytes written, always `RECORD_SIZE`.
    pub fn read<S: UserSink + ?Sized>(&self, dst: &mut S) -> Result<usize, DriveError> {
        if dst.len() < RECORD_SIZE {
            return Err(DriveError::InvalidArgument(format!(
                "read buffer of {} bytes, need {}",
                dst.len(),
                RECORD_SIZE
            )));
        }
        let position = self.core.read()?;
        dst.copy_in(&position.to_record())?;
        Ok(RECORD_SIZE)
    }

    /// Take one position record from `src` and run a control cycle on it.
    /// A record with a field outside `0..=100` fails with `InvalidArgument`.
    ///
    /// Returns the number of bytes consumed, always `RECORD_SIZE`.
    pub fn write<S: UserSource + ?Sized>(&self, src: &S) -> Result<usize, DriveError> {
        if src.len() < RECORD_SIZE {
            return Err(DriveError::InvalidArgument(format!(
                "write buffer of {} bytes, need {}",
                src.len(),
                RECORD_SIZE
            )));
        }
        let mut record = [0u8; RECORD_SIZE];
        src.copy_out(&mut record)?;
        self.core.write(ObjectPosition::from_record(&record))?;
        Ok(RECORD_SIZE)
    }

    /// Raw device command.
    pub fn ioctl(&self, code: u32, arg: u64) -> Result<(), DriveError> {
        self.core.ioctl(code, arg)
    }

    /// Non-blocking readiness.
    pub fn poll(&self) -> PollFlags {
        self.core.poll()
    }

    /// The core behind this handle.
    pub fn core(&self) -> &Arc<ControlCore> {
        &self.core
    }

    /// Release the hardware now.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for MotorDevice {
    fn drop(&mut self) {
        self.core.release();
    }
}

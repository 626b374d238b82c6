//! Out-of-band device commands.

use vistrack_common::consts::{CMD_SET_SPEED, CMD_TRIGGER_ALERT};

use crate::error::DriveError;

/// Decoded device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    /// Apply one signed speed to both motors, bypassing PID and steering.
    SetSpeed(i32),
    /// Fire the manual alert.
    TriggerAlert,
}

impl DriveCommand {
    /// Decode a raw `(code, arg)` pair.
    ///
    /// The speed travels in the low 32 bits of `arg`, two's complement.
    pub fn decode(code: u32, arg: u64) -> Result<Self, DriveError> {
        match code {
            CMD_SET_SPEED => Ok(Self::SetSpeed(arg as u32 as i32)),
            CMD_TRIGGER_ALERT => Ok(Self::TriggerAlert),
            other => Err(DriveError::UnsupportedCommand(other)),
        }
    }

    /// Raw command code.
    pub fn code(&self) -> u32 {
        match self {
            Self::SetSpeed(_) => CMD_SET_SPEED,
            Self::TriggerAlert => CMD_TRIGGER_ALERT,
        }
    }
}

//! Drive error type and its POSIX errno mapping.
//!
//! Transport failures never appear here: the alert channel logs them and
//! carries on.

use thiserror::Error;
use vistrack_common::config::ConfigError;
use vistrack_common::hal::driver::{HalError, ResourceId};

use crate::device::BoundaryFault;

/// Errors surfaced by the control core and the device surface.
#[derive(Debug, Error)]
pub enum DriveError {
    /// A hardware resource could not be claimed; everything claimed before
    /// it has been released again.
    #[error("Failed to acquire {resource}: {source}")]
    ResourceAcquisition {
        /// The resource that failed.
        resource: ResourceId,
        /// Backend cause.
        #[source]
        source: HalError,
    },

    /// Buffer too short or argument out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Command code not understood.
    #[error("Unsupported command: {0:#x}")]
    UnsupportedCommand(u32),

    /// Copy across the caller boundary failed.
    #[error(transparent)]
    BoundaryAccess(#[from] BoundaryFault),

    /// A session is already active.
    #[error("Drive already acquired")]
    Busy,

    /// Operation requires an active session.
    #[error("Drive not acquired")]
    NotAcquired,

    /// Applying an output to the hardware failed mid-cycle.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HalError),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DriveError {
    /// POSIX errno a character-device front end would return.
    pub fn errno(&self) -> i32 {
        match self {
            Self::ResourceAcquisition { source, .. } => match source {
                HalError::Busy(_) => libc::EBUSY,
                HalError::NotFound(_) => libc::ENODEV,
                HalError::InvalidConfig(_) => libc::EINVAL,
                HalError::Io(_) | HalError::NotRequested(_) => libc::EIO,
            },
            Self::InvalidArgument(_) | Self::Config(_) => libc::EINVAL,
            Self::UnsupportedCommand(_) => libc::ENOTTY,
            Self::BoundaryAccess(_) => libc::EFAULT,
            Self::Busy => libc::EBUSY,
            Self::NotAcquired => libc::ENODEV,
            Self::Hardware(_) => libc::EIO,
        }
    }
}

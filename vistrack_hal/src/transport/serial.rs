//! Serial modem transport.
//!
//! Opens the modem tty, switches it to raw 8N1 at the configured baud rate
//! and writes each alert message verbatim.

use nix::sys::termios::{self, BaudRate, ControlFlags, SetArg};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::info;
use vistrack_common::hal::transport::{AlertTransport, TransportError};

/// Serial transport implementing the `AlertTransport` trait.
#[derive(Debug)]
pub struct SerialTransport {
    path: PathBuf,
    baud: u32,
    port: Option<File>,
}

impl SerialTransport {
    /// Create a closed transport for the tty at `path`.
    pub fn new<P: AsRef<Path>>(path: P, baud: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            baud,
            port: None,
        }
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Map a numeric baud rate onto the termios constant.
pub fn baud_rate(baud: u32) -> Result<BaudRate, TransportError> {
    Ok(match baud {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        other => {
            return Err(TransportError::Unavailable(format!(
                "unsupported baud rate {other}"
            )));
        }
    })
}

/// Put `port` into raw 8N1 mode at `baud`.
fn configure(port: &File, baud: BaudRate) -> nix::Result<()> {
    let mut tio = termios::tcgetattr(port)?;
    termios::cfmakeraw(&mut tio);
    termios::cfsetspeed(&mut tio, baud)?;
    tio.control_flags &= !(ControlFlags::PARENB | ControlFlags::CSTOPB | ControlFlags::CSIZE);
    tio.control_flags |= ControlFlags::CS8 | ControlFlags::CLOCAL | ControlFlags::CREAD;
    termios::tcsetattr(port, SetArg::TCSANOW, &tio)
}

impl AlertTransport for SerialTransport {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        let baud = baud_rate(self.baud)?;
        let port = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&self.path)
            .map_err(|e| TransportError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        configure(&port, baud)
            .map_err(|e| TransportError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        info!("Alert modem initialized: {} @ {}", self.path.display(), self.baud);
        self.port = Some(port);
        Ok(())
    }

    fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        port.write_all(message.as_bytes())
            .and_then(|_| port.flush())
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Alert modem closed: {}", self.path.display());
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

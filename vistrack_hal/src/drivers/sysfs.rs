//! Linux sysfs GPIO + PWM backend.
//!
//! Drives the board through the legacy class interfaces:
//!
//! ```text
//! <root>/gpio/export                      write line number
//! <root>/gpio/gpio<N>/direction           "low" = output driven low
//! <root>/gpio/gpio<N>/value               "0" | "1"
//! <root>/pwm/pwmchip<C>/export            write channel number
//! <root>/pwm/pwmchip<C>/pwm<M>/period     ns
//! <root>/pwm/pwmchip<C>/pwm<M>/duty_cycle ns, must stay <= period
//! <root>/pwm/pwmchip<C>/pwm<M>/enable     "0" | "1"
//! ```
//!
//! The root is configurable so the backend can be exercised against a fake
//! tree.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vistrack_common::config::DriveConfig;
use vistrack_common::hal::driver::{HalError, HardwareBackend};

/// Sysfs backend implementing the `HardwareBackend` trait.
#[derive(Debug)]
pub struct SysfsBackend {
    root: PathBuf,
    lines: HashSet<u32>,
    /// Last period written per `(chip, channel)`; `None` until first configure.
    pwms: HashMap<(u32, u32), Option<u64>>,
}

impl SysfsBackend {
    /// Create a backend rooted at `root` (normally `/sys/class`).
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            lines: HashSet::new(),
            pwms: HashMap::new(),
        }
    }

    fn gpio_dir(&self, line: u32) -> PathBuf {
        self.root.join("gpio").join(format!("gpio{line}"))
    }

    fn chip_dir(&self, chip: u32) -> PathBuf {
        self.root.join("pwm").join(format!("pwmchip{chip}"))
    }

    fn pwm_dir(&self, chip: u32, channel: u32) -> PathBuf {
        self.chip_dir(chip).join(format!("pwm{channel}"))
    }

    fn requested_pwm(&self, chip: u32, channel: u32) -> Result<PathBuf, HalError> {
        if !self.pwms.contains_key(&(chip, channel)) {
            return Err(HalError::NotRequested(format!("pwmchip{chip}/pwm{channel}")));
        }
        Ok(self.pwm_dir(chip, channel))
    }
}

/// Factory function to create a sysfs backend from configuration.
pub fn create_backend(config: &DriveConfig) -> Box<dyn HardwareBackend> {
    Box::new(SysfsBackend::new(&config.backend.sysfs_root))
}

/// Write one attribute, mapping the OS error onto `HalError`.
fn write_attr(path: &Path, value: &str) -> Result<(), HalError> {
    fs::write(path, value).map_err(|e| map_io(path, e))
}

fn map_io(path: &Path, e: io::Error) -> HalError {
    let what = format!("{}: {}", path.display(), e);
    match e.raw_os_error() {
        Some(libc::EBUSY) => HalError::Busy(what),
        Some(libc::EINVAL) => HalError::InvalidConfig(what),
        _ if e.kind() == io::ErrorKind::NotFound => HalError::NotFound(what),
        _ => HalError::Io(what),
    }
}

impl HardwareBackend for SysfsBackend {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn request_gpio(&mut self, line: u32, label: &str) -> Result<(), HalError> {
        if self.lines.contains(&line) {
            return Err(HalError::Busy(format!("gpio{line}")));
        }
        let dir = self.gpio_dir(line);
        if !dir.exists() {
            write_attr(&self.root.join("gpio").join("export"), &line.to_string())?;
        }
        if !dir.exists() {
            return Err(HalError::NotFound(format!("{} after export", dir.display())));
        }
        write_attr(&dir.join("direction"), "low")?;
        self.lines.insert(line);
        info!("sysfs: gpio{} exported as {}", line, label);
        Ok(())
    }

    fn set_gpio(&mut self, line: u32, high: bool) -> Result<(), HalError> {
        if !self.lines.contains(&line) {
            return Err(HalError::NotRequested(format!("gpio{line}")));
        }
        write_attr(
            &self.gpio_dir(line).join("value"),
            if high { "1" } else { "0" },
        )
    }

    fn free_gpio(&mut self, line: u32) {
        if !self.lines.remove(&line) {
            return;
        }
        if let Err(e) = write_attr(&self.root.join("gpio").join("unexport"), &line.to_string()) {
            warn!("sysfs: failed to unexport gpio{}: {}", line, e);
        }
    }

    fn request_pwm(&mut self, chip: u32, channel: u32, label: &str) -> Result<(), HalError> {
        if self.pwms.contains_key(&(chip, channel)) {
            return Err(HalError::Busy(format!("pwmchip{chip}/pwm{channel}")));
        }
        let chip_dir = self.chip_dir(chip);
        if !chip_dir.exists() {
            return Err(HalError::NotFound(chip_dir.display().to_string()));
        }
        let dir = self.pwm_dir(chip, channel);
        if !dir.exists() {
            write_attr(&chip_dir.join("export"), &channel.to_string())?;
        }
        if !dir.exists() {
            return Err(HalError::NotFound(format!("{} after export", dir.display())));
        }
        self.pwms.insert((chip, channel), None);
        info!("sysfs: pwmchip{}/pwm{} exported as {}", chip, channel, label);
        Ok(())
    }

    fn configure_pwm(
        &mut self,
        chip: u32,
        channel: u32,
        duty_ns: u64,
        period_ns: u64,
    ) -> Result<(), HalError> {
        if duty_ns > period_ns {
            return Err(HalError::InvalidConfig(format!(
                "duty {duty_ns}ns exceeds period {period_ns}ns"
            )));
        }
        let dir = self.requested_pwm(chip, channel)?;
        let duty_path = dir.join("duty_cycle");
        let period_path = dir.join("period");

        // duty_cycle <= period must hold after every single write.
        match self.pwms.get(&(chip, channel)).copied().flatten() {
            Some(current) if current == period_ns => {
                write_attr(&duty_path, &duty_ns.to_string())?;
            }
            Some(current) if period_ns < current => {
                write_attr(&duty_path, &duty_ns.to_string())?;
                write_attr(&period_path, &period_ns.to_string())?;
            }
            Some(_) => {
                write_attr(&period_path, &period_ns.to_string())?;
                write_attr(&duty_path, &duty_ns.to_string())?;
            }
            None => {
                write_attr(&duty_path, "0")?;
                write_attr(&period_path, &period_ns.to_string())?;
                write_attr(&duty_path, &duty_ns.to_string())?;
            }
        }
        self.pwms.insert((chip, channel), Some(period_ns));
        debug!(
            "sysfs: pwmchip{}/pwm{} duty={}ns period={}ns",
            chip, channel, duty_ns, period_ns
        );
        Ok(())
    }

    fn enable_pwm(&mut self, chip: u32, channel: u32) -> Result<(), HalError> {
        let dir = self.requested_pwm(chip, channel)?;
        write_attr(&dir.join("enable"), "1")
    }

    fn disable_pwm(&mut self, chip: u32, channel: u32) {
        let Ok(dir) = self.requested_pwm(chip, channel) else {
            return;
        };
        if let Err(e) = write_attr(&dir.join("enable"), "0") {
            warn!("sysfs: failed to disable pwmchip{}/pwm{}: {}", chip, channel, e);
        }
    }

    fn free_pwm(&mut self, chip: u32, channel: u32) {
        if self.pwms.remove(&(chip, channel)).is_none() {
            return;
        }
        let unexport = self.chip_dir(chip).join("unexport");
        if let Err(e) = write_attr(&unexport, &channel.to_string()) {
            warn!("sysfs: failed to unexport pwmchip{}/pwm{}: {}", chip, channel, e);
        }
    }
}

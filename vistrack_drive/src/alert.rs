//! Alert channel: modem message plus a pulse on the alarm line.
//!
//! Delivery is best-effort. A transport failure is logged and the pulse
//! still fires; nothing here fails a drive operation. The pulse sleeps
//! between its two edges, so callers must not hold the session or position
//! lock across `notify`.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use vistrack_common::hal::driver::HardwareBackend;
use vistrack_common::hal::transport::AlertTransport;

/// Backend shared between the control core and the alert channel.
pub type SharedBackend = Arc<Mutex<Box<dyn HardwareBackend>>>;

/// How far one notification got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertReport {
    /// The transport accepted the message.
    pub delivered: bool,
    /// The alarm line completed its high-low pulse.
    pub pulsed: bool,
}

/// Message link plus alarm line.
pub struct AlertChannel {
    transport: Mutex<Box<dyn AlertTransport>>,
    backend: SharedBackend,
    alarm_line: u32,
    pulse: Duration,
    notifications: AtomicU64,
}

impl AlertChannel {
    /// Alert channel pulsing `alarm_line` for `pulse` on every notification.
    pub fn new(
        transport: Box<dyn AlertTransport>,
        backend: SharedBackend,
        alarm_line: u32,
        pulse: Duration,
    ) -> Self {
        Self {
            transport: Mutex::new(transport),
            backend,
            alarm_line,
            pulse,
            notifications: AtomicU64::new(0),
        }
    }

    /// Try to open the transport. Returns whether it is usable.
    pub fn open_transport(&self) -> bool {
        let mut transport = self.transport.lock();
        match transport.open() {
            Ok(()) => {
                info!("Alert transport '{}' ready", transport.name());
                true
            }
            Err(e) => {
                warn!(
                    "Alert transport '{}' unavailable, continuing without it: {}",
                    transport.name(),
                    e
                );
                false
            }
        }
    }

    /// Close the transport. Idempotent.
    pub fn close_transport(&self) {
        self.transport.lock().close();
    }

    /// Send `message` and pulse the alarm line.
    pub fn notify(&self, message: &str) -> AlertReport {
        self.notifications.fetch_add(1, Ordering::Relaxed);

        let delivered = {
            let mut transport = self.transport.lock();
            match transport.send(message) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Alert not delivered via '{}': {}", transport.name(), e);
                    false
                }
            }
        };

        let pulsed = self.pulse();
        debug!(
            "Alert '{}' delivered={} pulsed={}",
            message, delivered, pulsed
        );
        AlertReport { delivered, pulsed }
    }

    /// Alarm line high, wait, low. The backend lock is not held while waiting.
    fn pulse(&self) -> bool {
        if let Err(e) = self.backend.lock().set_gpio(self.alarm_line, true) {
            warn!("Alarm line {} could not be raised: {}", self.alarm_line, e);
            return false;
        }
        if !self.pulse.is_zero() {
            thread::sleep(self.pulse);
        }
        if let Err(e) = self.backend.lock().set_gpio(self.alarm_line, false) {
            warn!("Alarm line {} could not be lowered: {}", self.alarm_line, e);
            return false;
        }
        true
    }

    /// Notifications issued so far, delivered or not.
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    /// Whether the transport is currently open.
    pub fn transport_open(&self) -> bool {
        self.transport.lock().is_open()
    }
}

impl std::fmt::Debug for AlertChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertChannel")
            .field("alarm_line", &self.alarm_line)
            .field("pulse", &self.pulse)
            .field("notifications", &self.notifications())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vistrack_hal::drivers::simulation::HalEvent;
    use vistrack_hal::{NullTransport, SimulatedBackend};

    const ALARM: u32 = 47;

    fn channel(transport: NullTransport) -> (SimulatedBackend, AlertChannel) {
        let sim = SimulatedBackend::new();
        let mut hw = sim.clone();
        hw.request_gpio(ALARM, "alarm_gpio").unwrap();
        let backend: SharedBackend = Arc::new(Mutex::new(Box::new(hw)));
        let alert = AlertChannel::new(Box::new(transport), backend, ALARM, Duration::ZERO);
        (sim, alert)
    }

    #[test]
    fn notify_sends_and_pulses() {
        let transport = NullTransport::new();
        let (sim, alert) = channel(transport.clone());
        assert!(alert.open_transport());

        let report = alert.notify("ALERT: Object lost!");
        assert_eq!(
            report,
            AlertReport {
                delivered: true,
                pulsed: true
            }
        );
        assert_eq!(transport.sent(), 1);
        assert_eq!(sim.rising_edges(ALARM), 1);
        assert_eq!(sim.level(ALARM), Some(false));
        assert_eq!(alert.notifications(), 1);
    }

    #[test]
    fn closed_transport_still_pulses() {
        let (sim, alert) = channel(NullTransport::new());
        let report = alert.notify("ALERT: Manual trigger!");
        assert!(!report.delivered);
        assert!(report.pulsed);
        assert_eq!(sim.rising_edges(ALARM), 1);
    }

    #[test]
    fn unclaimed_alarm_line_reports_no_pulse() {
        let sim = SimulatedBackend::new();
        let backend: SharedBackend = Arc::new(Mutex::new(Box::new(sim.clone())));
        let alert = AlertChannel::new(
            Box::new(NullTransport::new()),
            backend,
            ALARM,
            Duration::ZERO,
        );
        assert!(!alert.notify("x").pulsed);
        assert!(!sim.events().contains(&HalEvent::GpioSet(ALARM, true)));
    }

    #[test]
    fn close_is_idempotent() {
        let (_sim, alert) = channel(NullTransport::new());
        alert.open_transport();
        alert.close_transport();
        alert.close_transport();
        assert!(!alert.transport_open());
    }
}

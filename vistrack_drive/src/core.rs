//! Control core: session lifecycle, control cycle and device operations.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──acquire──► Ready ──write──► Running
//!       ▲                      │                 │
//!       └──(acquire fails)     └────release──────┴──► Released ──acquire──► Ready
//! ```
//!
//! # Locking
//!
//! Three locks, always taken in this order and never the reverse:
//! session → backend, session → transport. The position channel lock is
//! leaf-only and never held across hardware or transport calls; a write
//! stores its snapshot under the session lock so a concurrent release
//! cannot slip in between. Alerts are
//! raised with no session lock held, since the alarm pulse sleeps.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use vistrack_common::config::{DriveConfig, MotorWiring};
use vistrack_common::hal::driver::{HalError, HardwareBackend, ResourceId};
use vistrack_common::hal::transport::AlertTransport;
use vistrack_common::position::ObjectPosition;

use crate::alert::{AlertChannel, SharedBackend};
use crate::channel::{PollFlags, PositionChannel, WaitOutcome};
use crate::command::DriveCommand;
use crate::control::output::{Direction, HardwareOutput};
use crate::control::pid::{PidController, PidGains};
use crate::control::steering::{SteeringCommand, SteeringPolicy};
use crate::error::DriveError;

/// Resources claimed per session: four direction lines, the alarm line and
/// two PWM channels.
pub const RESOURCE_COUNT: usize = 7;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Nothing acquired yet, or the last acquisition failed.
    #[default]
    Uninitialized,
    /// Hardware acquired, no cycle run yet.
    Ready,
    /// At least one control cycle has run.
    Running,
    /// Hardware released.
    Released,
}

impl LifecycleState {
    /// Whether a session is live.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}

/// Per-motor view for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSnapshot {
    /// Motor number, 1-based.
    pub motor: u8,
    /// Last applied direction.
    pub direction: Direction,
    /// Last applied magnitude, 0..=100.
    pub current_speed: i32,
    /// Last steering target.
    pub target_speed: i32,
    /// PID integral accumulator.
    pub integral: f64,
}

/// Result of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Object lost: motor 1 driven at the search speed, lost alert raised.
    Searched {
        /// Speed applied to motor 1.
        speed: i32,
    },
    /// Object tracked.
    Tracked {
        /// Steering targets (motor 1, motor 2).
        targets: [i32; 2],
        /// PID commands applied (motor 1, motor 2).
        outputs: [i32; 2],
    },
}

#[derive(Debug, Clone)]
struct Motor {
    output: HardwareOutput,
    pid: PidController,
    target_speed: i32,
}

impl Motor {
    fn new(motor: u8, wiring: &MotorWiring, config: &DriveConfig) -> Self {
        Self {
            output: HardwareOutput::new(motor, wiring, &config.pwm),
            pid: PidController::new(PidGains::from(&config.pid)),
            target_speed: 0,
        }
    }

    fn snapshot(&self) -> MotorSnapshot {
        MotorSnapshot {
            motor: self.output.motor(),
            direction: self.output.direction(),
            current_speed: self.output.current_speed(),
            target_speed: self.target_speed,
            integral: self.pid.state().integral(),
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    state: LifecycleState,
    motors: Option<[Motor; 2]>,
}

/// Acquisition order. Rollback and release walk it backwards.
fn resource_plan(config: &DriveConfig) -> [ResourceId; RESOURCE_COUNT] {
    let left = &config.motors.left;
    let right = &config.motors.right;
    let chip = config.pwm.chip;
    [
        ResourceId::DirectionLine {
            motor: 1,
            index: 0,
            line: left.dir_lines.0,
        },
        ResourceId::DirectionLine {
            motor: 1,
            index: 1,
            line: left.dir_lines.1,
        },
        ResourceId::DirectionLine {
            motor: 2,
            index: 0,
            line: right.dir_lines.0,
        },
        ResourceId::DirectionLine {
            motor: 2,
            index: 1,
            line: right.dir_lines.1,
        },
        ResourceId::AlarmLine {
            line: config.alarm_line,
        },
        ResourceId::PwmChannel {
            motor: 1,
            chip,
            channel: left.pwm_channel,
        },
        ResourceId::PwmChannel {
            motor: 2,
            chip,
            channel: right.pwm_channel,
        },
    ]
}

fn claim(hw: &mut dyn HardwareBackend, resource: &ResourceId) -> Result<(), HalError> {
    match *resource {
        ResourceId::DirectionLine { line, .. } | ResourceId::AlarmLine { line } => {
            hw.request_gpio(line, &resource.label())
        }
        ResourceId::PwmChannel { chip, channel, .. } => {
            hw.request_pwm(chip, channel, &resource.label())
        }
    }
}

fn unclaim(hw: &mut dyn HardwareBackend, resource: &ResourceId) {
    match *resource {
        ResourceId::DirectionLine { line, .. } | ResourceId::AlarmLine { line } => {
            hw.free_gpio(line)
        }
        ResourceId::PwmChannel { chip, channel, .. } => {
            hw.disable_pwm(chip, channel);
            hw.free_pwm(chip, channel);
        }
    }
}

/// The motor control core.
///
/// `Send + Sync`; share it behind an `Arc` and call every operation through
/// `&self` from any thread.
pub struct ControlCore {
    config: DriveConfig,
    plan: [ResourceId; RESOURCE_COUNT],
    steering: SteeringPolicy,
    backend: SharedBackend,
    alert: AlertChannel,
    position: PositionChannel,
    session: Mutex<Session>,
    cycles: AtomicU64,
}

impl ControlCore {
    /// Build a core over `backend` and `transport`. Nothing is acquired yet.
    ///
    /// # Errors
    ///
    /// `DriveError::Config` if `config` fails validation.
    pub fn new(
        config: DriveConfig,
        backend: Box<dyn HardwareBackend>,
        transport: Box<dyn AlertTransport>,
    ) -> Result<Self, DriveError> {
        config.validate()?;
        info!(
            "Control core using backend '{}', alert transport '{}'",
            backend.name(),
            transport.name()
        );
        let backend: SharedBackend = Arc::new(Mutex::new(backend));
        let alert = AlertChannel::new(
            transport,
            Arc::clone(&backend),
            config.alarm_line,
            Duration::from_millis(config.alert.pulse_ms),
        );
        Ok(Self {
            plan: resource_plan(&config),
            steering: SteeringPolicy::from(&config.steering),
            config,
            backend,
            alert,
            position: PositionChannel::new(),
            session: Mutex::new(Session::default()),
            cycles: AtomicU64::new(0),
        })
    }

    // ─── Session ────────────────────────────────────────────────────

    /// Claim all hardware and start a session.
    ///
    /// On failure every resource claimed so far is released in reverse
    /// order, the state returns to `Uninitialized`, and the error names the
    /// resource that failed.
    pub fn acquire(&self) -> Result<(), DriveError> {
        let mut session = self.session.lock();
        if session.state.is_active() {
            warn!("Acquire refused: drive already acquired");
            return Err(DriveError::Busy);
        }

        {
            let mut hw = self.backend.lock();
            if let Err(e) = self.claim_all(&mut **hw) {
                session.state = LifecycleState::Uninitialized;
                return Err(e);
            }
        }

        session.motors = Some([
            Motor::new(1, &self.config.motors.left, &self.config),
            Motor::new(2, &self.config.motors.right, &self.config),
        ]);
        session.state = LifecycleState::Ready;

        self.alert.open_transport();
        self.position.open();
        info!("Drive acquired ({} resources)", RESOURCE_COUNT);
        Ok(())
    }

    fn claim_all(&self, hw: &mut dyn HardwareBackend) -> Result<(), DriveError> {
        for (claimed, resource) in self.plan.iter().enumerate() {
            if let Err(source) = claim(hw, resource) {
                error!("Failed to acquire {}: {}", resource, source);
                self.rollback(hw, claimed);
                return Err(DriveError::ResourceAcquisition {
                    resource: *resource,
                    source,
                });
            }
            debug!("Acquired {}", resource);
        }

        let period_ns = self.config.pwm.period_ns;
        for resource in &self.plan {
            let ResourceId::PwmChannel { chip, channel, .. } = *resource else {
                continue;
            };
            let started = hw
                .configure_pwm(chip, channel, 0, period_ns)
                .and_then(|()| hw.enable_pwm(chip, channel));
            if let Err(source) = started {
                error!("Failed to start {}: {}", resource, source);
                self.rollback(hw, RESOURCE_COUNT);
                return Err(DriveError::ResourceAcquisition {
                    resource: *resource,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Release the first `claimed` resources of the plan, newest first.
    fn rollback(&self, hw: &mut dyn HardwareBackend, claimed: usize) {
        for resource in self.plan[..claimed].iter().rev() {
            unclaim(hw, resource);
            debug!("Released {}", resource);
        }
    }

    /// Stop both motors, free every resource and wake all waiters.
    ///
    /// Idempotent, and a no-op when nothing was acquired.
    pub fn release(&self) {
        let mut session = self.session.lock();
        let Some(mut motors) = session.motors.take() else {
            return;
        };

        {
            let mut hw = self.backend.lock();
            for motor in motors.iter_mut() {
                if let Err(e) = motor.output.apply(&mut **hw, 0) {
                    warn!("Motor {} did not stop cleanly: {}", motor.output.motor(), e);
                }
                motor.output.reset();
                motor.pid.reset();
            }
            self.rollback(&mut **hw, RESOURCE_COUNT);
        }
        session.state = LifecycleState::Released;
        drop(session);

        self.alert.close_transport();
        self.position.close();
        info!(
            "Drive released after {} cycles",
            self.cycles.load(Ordering::Relaxed)
        );
    }

    fn ensure_active(&self) -> Result<(), DriveError> {
        if self.session.lock().state.is_active() {
            Ok(())
        } else {
            Err(DriveError::NotAcquired)
        }
    }

    // ─── Device operations ──────────────────────────────────────────

    /// Current position snapshot.
    pub fn read(&self) -> Result<ObjectPosition, DriveError> {
        self.ensure_active()?;
        Ok(self.position.get())
    }

    /// Store `position`, wake waiters, then run one control cycle on it.
    ///
    /// Positions with a field outside `0..=100` are rejected with
    /// `InvalidArgument` and leave the snapshot untouched. A lost object
    /// additionally raises the lost alert once the cycle has applied, with
    /// no lock held.
    pub fn write(&self, position: ObjectPosition) -> Result<CycleOutcome, DriveError> {
        if !position.in_frame() {
            return Err(DriveError::InvalidArgument(format!(
                "position {}/{}/{} outside the frame",
                position.x, position.y, position.width
            )));
        }

        let outcome = {
            let mut session = self.session.lock();
            if !session.state.is_active() {
                return Err(DriveError::NotAcquired);
            }
            self.position.set(position);
            self.run_cycle(&mut session, &position)?
        };
        if let CycleOutcome::Searched { .. } = outcome {
            self.alert.notify(&self.config.alert.lost_message);
        }
        Ok(outcome)
    }

    fn run_cycle(
        &self,
        session: &mut Session,
        position: &ObjectPosition,
    ) -> Result<CycleOutcome, DriveError> {
        let Session { state, motors } = session;
        let Some(motors) = motors.as_mut() else {
            return Err(DriveError::NotAcquired);
        };
        let mut hw = self.backend.lock();

        let outcome = match self.steering.compute(position) {
            SteeringCommand::Search => {
                let speed = self.config.steering.search_speed;
                let searcher = &mut motors[0];
                searcher.target_speed = speed;
                searcher.output.apply(&mut **hw, speed)?;
                CycleOutcome::Searched { speed }
            }
            SteeringCommand::Track { left, right } => {
                let targets = [left, right];
                let mut outputs = [0; 2];
                for ((motor, target), out) in motors.iter_mut().zip(targets).zip(&mut outputs) {
                    motor.target_speed = target;
                    let command = motor.pid.step(target, motor.output.current_speed());
                    motor.output.apply(&mut **hw, command)?;
                    *out = command;
                }
                CycleOutcome::Tracked { targets, outputs }
            }
        };

        *state = LifecycleState::Running;
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("Cycle {}: {:?} -> {:?}", cycle, position, outcome);
        Ok(outcome)
    }

    /// Execute a decoded device command.
    ///
    /// `SetSpeed` bypasses PID and drives both motors at the given speed;
    /// zero stops them.
    pub fn command(&self, command: DriveCommand) -> Result<(), DriveError> {
        match command {
            DriveCommand::SetSpeed(speed) => {
                let mut session = self.session.lock();
                let Some(motors) = session.motors.as_mut() else {
                    return Err(DriveError::NotAcquired);
                };
                let mut hw = self.backend.lock();
                for motor in motors.iter_mut() {
                    motor.output.apply(&mut **hw, speed)?;
                }
                info!("Manual speed {} applied to both motors", speed);
                Ok(())
            }
            DriveCommand::TriggerAlert => {
                self.ensure_active()?;
                self.alert.notify(&self.config.alert.manual_message);
                Ok(())
            }
        }
    }

    /// Decode and execute a raw `(code, arg)` command.
    pub fn ioctl(&self, code: u32, arg: u64) -> Result<(), DriveError> {
        self.command(DriveCommand::decode(code, arg)?)
    }

    /// Readiness without blocking. Empty outside a session.
    pub fn poll(&self) -> PollFlags {
        if !self.position.is_open() {
            return PollFlags::empty();
        }
        self.position.poll()
    }

    /// Block until the object is detected.
    ///
    /// Returns `Ok(None)` when `timeout` elapses first and
    /// `Err(NotAcquired)` when the session ends while waiting.
    pub fn wait_detected(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<ObjectPosition>, DriveError> {
        match self.position.wait_detected(timeout) {
            WaitOutcome::Detected(position) => Ok(Some(position)),
            WaitOutcome::TimedOut => Ok(None),
            WaitOutcome::Closed => Err(DriveError::NotAcquired),
        }
    }

    // ─── Diagnostics ────────────────────────────────────────────────

    /// Lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.session.lock().state
    }

    /// Both motors, or `None` outside a session.
    pub fn motors(&self) -> Option<[MotorSnapshot; 2]> {
        self.session
            .lock()
            .motors
            .as_ref()
            .map(|[m1, m2]| [m1.snapshot(), m2.snapshot()])
    }

    /// Control cycles run since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Alerts raised since construction, delivered or not.
    pub fn alerts_raised(&self) -> u64 {
        self.alert.notifications()
    }

    /// Configuration in use.
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Acquisition order of the hardware resources.
    pub fn resources(&self) -> &[ResourceId; RESOURCE_COUNT] {
        &self.plan
    }
}

impl Drop for ControlCore {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ControlCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlCore")
            .field("state", &self.state())
            .field("cycles", &self.cycles())
            .field("alert", &self.alert)
            .finish_non_exhaustive()
    }
}

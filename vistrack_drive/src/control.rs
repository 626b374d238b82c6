//! Control engine root.
//!
//! Per-cycle pipeline: steering picks per-motor targets, the PID corrects
//! each target against the motor's applied speed, and the output stage
//! turns the signed result into direction lines plus PWM duty.

pub mod output;
pub mod pid;
pub mod steering;

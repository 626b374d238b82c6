//! Hardware abstraction: backend and transport traits plus board defaults.

pub mod consts;
pub mod driver;
pub mod transport;

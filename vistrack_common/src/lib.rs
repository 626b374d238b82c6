//! vistrack Common Library
//!
//! This crate provides the shared value types, hardware traits and
//! configuration loading used by every vistrack crate.
//!
//! # Module Structure
//!
//! - [`position`] - `ObjectPosition` snapshot and its 16-byte wire record
//! - [`hal`] - Hardware backend / alert transport traits and board defaults
//! - [`config`] - TOML configuration types and loader
//! - [`consts`] - Protocol constants and default paths
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use vistrack_common::prelude::*;
//!
//! let pos = ObjectPosition::centered(10);
//! assert_eq!(ObjectPosition::from_record(&pos.to_record()), pos);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod position;
pub mod prelude;

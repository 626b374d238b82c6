//! Object position snapshot and its fixed-size wire record.
//!
//! The detector reports the tracked object as percentages of the frame, never
//! pixels. On the device channel the snapshot travels as four native-endian
//! 32-bit words in field order `(x, y, width, detected)`.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use crate::consts::{PERCENT_MAX, RECORD_SIZE};

/// Last reported position of the tracked object.
///
/// Copied by value across every boundary. `Default` is the zero snapshot
/// with `detected = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectPosition {
    /// Object centre X, percent of frame width (0-100).
    pub x: i32,
    /// Object centre Y, percent of frame height (0-100).
    pub y: i32,
    /// Object width, percent of frame width (0-100).
    pub width: i32,
    /// Whether the detector found the object in this frame.
    pub detected: bool,
}

/// Binary layout of one record on the device channel.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct PositionRecord {
    x: i32,
    y: i32,
    width: i32,
    detected: u32,
}

const_assert_eq!(std::mem::size_of::<PositionRecord>(), RECORD_SIZE);
const_assert_eq!(std::mem::align_of::<PositionRecord>(), 4);

impl ObjectPosition {
    /// Snapshot with the object centred and detected.
    pub const fn centered(width: i32) -> Self {
        Self {
            x: 50,
            y: 50,
            width,
            detected: true,
        }
    }

    /// Snapshot reporting the object as lost.
    pub const fn lost() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            detected: false,
        }
    }

    /// Whether `x`, `y` and `width` all lie within `0..=100`.
    pub fn in_frame(&self) -> bool {
        [self.x, self.y, self.width]
            .iter()
            .all(|v| (0..=PERCENT_MAX).contains(v))
    }

    /// Encode into the wire record.
    pub fn to_record(&self) -> [u8; RECORD_SIZE] {
        let rec = PositionRecord {
            x: self.x,
            y: self.y,
            width: self.width,
            detected: u32::from(self.detected),
        };
        let mut out = [0u8; RECORD_SIZE];
        out[0..4].copy_from_slice(&rec.x.to_ne_bytes());
        out[4..8].copy_from_slice(&rec.y.to_ne_bytes());
        out[8..12].copy_from_slice(&rec.width.to_ne_bytes());
        out[12..16].copy_from_slice(&rec.detected.to_ne_bytes());
        out
    }

    /// Decode a wire record. Any non-zero flag word reads as detected.
    pub fn from_record(bytes: &[u8; RECORD_SIZE]) -> Self {
        let word = |i: usize| [bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]];
        let rec = PositionRecord {
            x: i32::from_ne_bytes(word(0)),
            y: i32::from_ne_bytes(word(4)),
            width: i32::from_ne_bytes(word(8)),
            detected: u32::from_ne_bytes(word(12)),
        };
        Self {
            x: rec.x,
            y: rec.y,
            width: rec.width,
            detected: rec.detected != 0,
        }
    }
}

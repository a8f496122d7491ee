//! Decode obstruction flags from a raw motion event flag word.
//! The window manager sets these when another surface overlaps our window at delivery time.

use std::fmt;

pub const FLAG_WINDOW_IS_OBSCURED: u32 = 0x1;
pub const FLAG_WINDOW_IS_PARTIALLY_OBSCURED: u32 = 0x2;

/// First API level (Android 10, "Q") that reports partial obstruction.
pub const PARTIAL_OBSTRUCTION_MIN_API: u32 = 29;

/// Host platform API level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiLevel(pub u32);

impl ApiLevel {
    pub fn supports_partial_obstruction(self) -> bool {
        self.0 >= PARTIAL_OBSTRUCTION_MIN_API
    }
}

impl Default for ApiLevel {
    fn default() -> Self {
        ApiLevel(PARTIAL_OBSTRUCTION_MIN_API)
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "api {}", self.0)
    }
}

/// Read-only view of the obstruction flags on one delivered touch.
pub trait TouchClassifier {
    fn is_fully_obscured(&self) -> bool;
    fn is_partially_obscured(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchEvent {
    pub fully_obscured: bool,
    pub partially_obscured: bool,
}

impl TouchEvent {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn obscured() -> Self {
        Self {
            fully_obscured: true,
            partially_obscured: false,
        }
    }

    pub fn partially_obscured() -> Self {
        Self {
            fully_obscured: false,
            partially_obscured: true,
        }
    }

    /// Decode a motion event flag word. The partial bit is dropped on levels
    /// that cannot report it, so it reads as "not obscured" rather than unknown.
    pub fn from_motion_flags(flags: u32, api: ApiLevel) -> Self {
        Self {
            fully_obscured: flags & FLAG_WINDOW_IS_OBSCURED != 0,
            partially_obscured: api.supports_partial_obstruction()
                && flags & FLAG_WINDOW_IS_PARTIALLY_OBSCURED != 0,
        }
    }
}

impl TouchClassifier for TouchEvent {
    fn is_fully_obscured(&self) -> bool {
        self.fully_obscured
    }

    fn is_partially_obscured(&self) -> bool {
        self.partially_obscured
    }
}

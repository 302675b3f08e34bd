//! # Normalized Command Module
//!
//! Validation layer for steering/throttle commands.
//!
//! Every raw command entering the actuation pipeline passes through
//! [`NormalizedCommand::clip`], which clamps it into [-1, 1]. Clamping is
//! silent and total: out-of-range input is never rejected, it is pulled to
//! the nearest endpoint. This replaces the attribute-level validator hooks
//! of the original driver with a plain function that can be unit tested.
//!
//! ## Non-finite input policy
//!
//! - `NaN` coerces to `0.0` (neutral). A vehicle must never jump because a
//!   caller divided by zero upstream.
//! - `+inf` / `-inf` clamp to `1.0` / `-1.0` like any out-of-range value.

/// Lower bound of the normalized command range.
pub const COMMAND_MIN: f64 = -1.0;

/// Upper bound of the normalized command range.
pub const COMMAND_MAX: f64 = 1.0;

/// A steering or throttle command guaranteed to lie in [-1, 1].
///
/// Constructed fresh for every input event via [`NormalizedCommand::clip`];
/// immutable once produced.
///
/// # Examples
///
/// ```
/// use racer_bridge::actuator::command::NormalizedCommand;
///
/// assert_eq!(NormalizedCommand::clip(1.5).get(), 1.0);
/// assert_eq!(NormalizedCommand::clip(-2.0).get(), -1.0);
/// assert_eq!(NormalizedCommand::clip(0.4).get(), 0.4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedCommand(f64);

impl NormalizedCommand {
    /// Clips a raw command into [-1, 1].
    ///
    /// Total function: always produces a valid command, never errors.
    /// `NaN` maps to the neutral command `0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use racer_bridge::actuator::command::NormalizedCommand;
    ///
    /// let cmd = NormalizedCommand::clip(0.3);
    /// assert_eq!(cmd.get(), 0.3);
    ///
    /// let neutral = NormalizedCommand::clip(f64::NAN);
    /// assert_eq!(neutral.get(), 0.0);
    /// ```
    #[must_use]
    pub fn clip(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(0.0);
        }
        Self(raw.clamp(COMMAND_MIN, COMMAND_MAX))
    }

    /// Returns the command value, guaranteed to lie in [-1, 1].
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

//! # H-Bridge Channel Mapper Module
//!
//! Maps a signed, gain-scaled throttle value onto the 8-channel dual
//! H-bridge layout of the split-controller drive train.
//!
//! An H-bridge pair needs one leg PWM-driven and the complementary leg held
//! at a fixed rail to push current in one direction; reversing which leg is
//! PWM-driven and which is fixed reverses the motor without a separate
//! direction-select signal. Which physical channel plays which role is
//! decided by the board wiring, not by arithmetic, so the assignment lives
//! here as two constant role tables — one per sign of the command.
//!
//! ## Role Tables (wiring contract)
//!
//! | Slot | Forward (`v > 0`) | Reverse (`v <= 0`) |
//! |------|-------------------|--------------------|
//! | 0    | PWM magnitude     | PWM magnitude      |
//! | 1    | Fixed high        | Fixed low          |
//! | 2    | Fixed low         | Fixed high         |
//! | 3    | Fixed low         | PWM magnitude      |
//! | 4    | PWM magnitude     | Fixed low          |
//! | 5    | Fixed low         | Fixed high         |
//! | 6    | Fixed high        | Fixed low          |
//! | 7    | PWM magnitude     | Fixed low          |
//!
//! ## Value Ranges
//!
//! - Input: signed scaled command `v` (clipped command times gain)
//! - Output duty cycle: 0-65535 (16-bit), `round(65535 * |v|)` on PWM slots
//!
//! ## Usage
//!
//! ```
//! use racer_bridge::actuator::hbridge::{map_throttle, FULL_SCALE};
//!
//! let duties = map_throttle(0.4);
//! assert_eq!(duties[0].duty, 26214);      // PWM leg: round(65535 * 0.4)
//! assert_eq!(duties[1].duty, FULL_SCALE); // fixed-high leg
//! assert_eq!(duties[2].duty, 0);          // fixed-low leg
//! ```

/// Full-scale 16-bit duty cycle (channel fully on).
pub const FULL_SCALE: u16 = 0xFFFF;

/// Number of channel slots in the dual H-bridge layout.
pub const HBRIDGE_SLOTS: usize = 8;

/// Role a channel slot plays for one command sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Carries the PWM duty-cycle magnitude.
    Pwm,
    /// Held at the full-scale rail.
    High,
    /// Held at zero.
    Low,
}

/// Slot roles while driving forward (`v > 0`).
pub const FORWARD_ROLES: [ChannelRole; HBRIDGE_SLOTS] = [
    ChannelRole::Pwm,  // slot 0
    ChannelRole::High, // slot 1
    ChannelRole::Low,  // slot 2
    ChannelRole::Low,  // slot 3
    ChannelRole::Pwm,  // slot 4
    ChannelRole::Low,  // slot 5
    ChannelRole::High, // slot 6
    ChannelRole::Pwm,  // slot 7
];

/// Slot roles while driving in reverse (`v <= 0`).
///
/// Zero is a degenerate reverse command: magnitude 0 through this table
/// leaves every slot at 0 or a steady rail, never at a stale duty cycle.
pub const REVERSE_ROLES: [ChannelRole; HBRIDGE_SLOTS] = [
    ChannelRole::Pwm,  // slot 0
    ChannelRole::Low,  // slot 1
    ChannelRole::High, // slot 2
    ChannelRole::Pwm,  // slot 3
    ChannelRole::Low,  // slot 4
    ChannelRole::High, // slot 5
    ChannelRole::Low,  // slot 6
    ChannelRole::Pwm,  // slot 7
];

/// One (slot, duty cycle) assignment produced by the mapper.
///
/// Transient value: produced per command, consumed immediately by the PWM
/// backend, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDuty {
    /// Slot index into the H-bridge channel assignment (0-7).
    pub slot: u8,
    /// 16-bit duty cycle for that slot.
    pub duty: u16,
}

/// Converts `|v|` to a 16-bit duty-cycle magnitude.
///
/// Monotonic in `|v|` and saturating at [`FULL_SCALE`] for `|v| >= 1.0`.
#[inline]
#[must_use]
pub fn duty_magnitude(v: f64) -> u16 {
    let scaled = (FULL_SCALE as f64 * v.abs()).round();
    if scaled >= FULL_SCALE as f64 {
        FULL_SCALE
    } else {
        scaled as u16
    }
}

/// Maps a signed scaled throttle value onto the 8-slot H-bridge layout.
///
/// Pure function over already-clipped input: it cannot fail. Forward
/// commands (`v > 0`) use [`FORWARD_ROLES`], everything else (including
/// zero) uses [`REVERSE_ROLES`]; PWM slots carry `round(65535 * |v|)`,
/// high slots carry [`FULL_SCALE`], low slots carry 0.
///
/// # Examples
///
/// ```
/// use racer_bridge::actuator::hbridge::map_throttle;
///
/// // Rest state is fully deterministic
/// assert_eq!(map_throttle(0.0), map_throttle(0.0));
/// assert_eq!(map_throttle(0.0)[0].duty, 0);
/// ```
#[must_use]
pub fn map_throttle(v: f64) -> [SlotDuty; HBRIDGE_SLOTS] {
    let roles = if v > 0.0 { &FORWARD_ROLES } else { &REVERSE_ROLES };
    let magnitude = duty_magnitude(v);

    let mut duties = [SlotDuty { slot: 0, duty: 0 }; HBRIDGE_SLOTS];
    for (slot, role) in roles.iter().enumerate() {
        duties[slot] = SlotDuty {
            slot: slot as u8,
            duty: match role {
                ChannelRole::Pwm => magnitude,
                ChannelRole::High => FULL_SCALE,
                ChannelRole::Low => 0,
            },
        };
    }
    duties
}

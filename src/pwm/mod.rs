//! # PWM Backend Module
//!
//! The seam between the actuation pipeline and the physical PWM controller.
//!
//! Bindings talk to hardware only through the [`PwmBackend`] trait, which
//! exposes the two write shapes the pipeline needs:
//!
//! - a continuous-rotation-servo write (signed value in [-1, 1]) for
//!   servo-style actuators, and
//! - a raw 16-bit duty-cycle write for the H-bridge channel layout.
//!
//! The real implementation is [`pca9685::Pca9685Backend`]; tests use the
//! recording mock in `mocks`.

pub mod pca9685;

pub use pca9685::Pca9685Backend;

use crate::error::Result;

/// Trait for PWM controller write operations.
///
/// One implementor exclusively owns one controller handle; `&mut self`
/// serializes all transactions on it.
pub trait PwmBackend: Send {
    /// Drive a channel as a continuous-rotation servo.
    ///
    /// `value` is a signed speed/direction in [-1, 1]; implementations
    /// clamp anything outside that range.
    fn set_servo_throttle(&mut self, channel: u8, value: f64) -> Result<()>;

    /// Set a channel's duty cycle, 0 (fully off) to 65535 (fully on).
    fn set_duty_cycle(&mut self, channel: u8, duty: u16) -> Result<()>;
}

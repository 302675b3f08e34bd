//! # PCA9685 Backend Module
//!
//! Real [`PwmBackend`] implementation over a PCA9685 16-channel PWM
//! controller on a Linux I2C bus (`/dev/i2c-<bus>`).
//!
//! The chip runs at 50Hz (standard servo frame rate) with a 12-bit
//! counter. The pipeline's 16-bit duty cycles map onto it the way the
//! stock Adafruit driver does: 0 uses the full-off register, 65535 the
//! full-on register, everything in between the top 12 bits of the value.
//! Continuous-servo values in [-1, 1] map to a 1.0-2.0ms pulse.

use linux_embedded_hal::I2cdev;
use pwm_pca9685::{Channel, Pca9685};
use tracing::{debug, info};

use super::PwmBackend;
use crate::error::{RacerBridgeError, Result};

/// PCA9685 prescale value for a 50Hz PWM frame (25MHz internal clock).
const PRESCALE_50HZ: u8 = 121;

/// PWM frame period at 50Hz, in microseconds.
const FRAME_PERIOD_US: f64 = 20_000.0;

/// Counter resolution of the PCA9685.
const COUNTER_TICKS: f64 = 4096.0;

/// Continuous-servo pulse width at full reverse, in microseconds.
const SERVO_MIN_PULSE_US: f64 = 1_000.0;

/// Continuous-servo pulse width at full forward, in microseconds.
const SERVO_MAX_PULSE_US: f64 = 2_000.0;

/// PCA9685 PWM controller on a Linux I2C bus.
pub struct Pca9685Backend {
    /// Driver handle, exclusively owned
    pca: Pca9685<I2cdev>,
    /// 7-bit controller address
    address: u8,
}

impl std::fmt::Debug for Pca9685Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pca9685Backend")
            .field("address", &format_args!("0x{:02x}", self.address))
            .finish_non_exhaustive()
    }
}

impl Pca9685Backend {
    /// Open a PCA9685 at `address` on I2C bus `bus`.
    ///
    /// Configures the 50Hz prescale and enables the oscillator. The first
    /// bus transaction doubles as the liveness probe: if nothing
    /// acknowledges at `address` this fails with
    /// [`RacerBridgeError::ControllerNotFound`] rather than leaving a dead
    /// binding behind.
    ///
    /// # Errors
    ///
    /// Returns error if the bus device cannot be opened or the controller
    /// does not respond at `address`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use racer_bridge::pwm::Pca9685Backend;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let backend = Pca9685Backend::open(1, 0x40)?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open(bus: u8, address: u8) -> Result<Self> {
        let path = format!("/dev/i2c-{}", bus);
        debug!("Opening I2C bus device {}", path);

        let dev = I2cdev::new(&path)
            .map_err(|e| RacerBridgeError::Pwm(format!("failed to open {}: {}", path, e)))?;

        let mut pca = Pca9685::new(dev, address)
            .map_err(|e| RacerBridgeError::Pwm(format!("invalid controller address: {:?}", e)))?;

        // First transactions on the wire; a missing device NAKs here.
        pca.set_prescale(PRESCALE_50HZ)
            .map_err(|_| RacerBridgeError::ControllerNotFound(address))?;
        pca.enable()
            .map_err(|_| RacerBridgeError::ControllerNotFound(address))?;

        info!("PCA9685 online at 0x{:02x} on {}", address, path);
        Ok(Self { pca, address })
    }

    /// The 7-bit address this backend is bound to.
    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl PwmBackend for Pca9685Backend {
    fn set_servo_throttle(&mut self, channel: u8, value: f64) -> Result<()> {
        let ch = channel_from_index(channel)?;
        let value = value.clamp(-1.0, 1.0);

        let pulse_us =
            SERVO_MIN_PULSE_US + (value + 1.0) / 2.0 * (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US);
        let off = ((pulse_us / FRAME_PERIOD_US) * COUNTER_TICKS).round() as u16;

        self.pca
            .set_channel_on_off(ch, 0, off)
            .map_err(|e| RacerBridgeError::Pwm(format!("servo write failed: {:?}", e)))
    }

    fn set_duty_cycle(&mut self, channel: u8, duty: u16) -> Result<()> {
        let ch = channel_from_index(channel)?;

        let result = match duty {
            0 => self.pca.set_channel_full_off(ch),
            0xFFFF => self.pca.set_channel_full_on(ch, 0),
            _ => self.pca.set_channel_on_off(ch, 0, duty >> 4),
        };

        result.map_err(|e| RacerBridgeError::Pwm(format!("duty-cycle write failed: {:?}", e)))
    }
}

/// Maps a channel index (0-15) to the driver's channel type.
fn channel_from_index(index: u8) -> Result<Channel> {
    let channel = match index {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return Err(RacerBridgeError::InvalidChannel(index)),
    };
    Ok(channel)
}

//! # Controller Binding Module
//!
//! Binds a logical actuator (steering or throttle) to a physical PWM
//! controller address and channel assignment, and turns incoming commands
//! into hardware writes: clip → gain/offset or H-bridge map → backend.
//!
//! The original driver recomputed outputs from an observer callback fired
//! on attribute mutation; here the contract is an explicit method call
//! ([`Racecar::set_steering`] / [`Racecar::set_throttle`]) that runs
//! validate-map-write synchronously, so ordering and error propagation are
//! visible at the call site.
//!
//! Writes are idempotent: the same command twice produces the same hardware
//! state twice. There is no ramping or smoothing.

use tracing::debug;

use super::command::NormalizedCommand;
use super::hbridge::{map_throttle, HBRIDGE_SLOTS};
use crate::config::{Config, SteeringConfig, ThrottleConfig, ThrottleMode};
use crate::error::{RacerBridgeError, Result};
use crate::pwm::{Pca9685Backend, PwmBackend};

/// How an actuator occupies channels on its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssignment {
    /// One continuous-rotation-servo channel.
    Servo { channel: u8 },
    /// Eight channels in the dual H-bridge layout, listed slot by slot.
    HBridge { channels: [u8; HBRIDGE_SLOTS] },
}

/// Static per-actuator configuration.
///
/// Owned by the binding that uses it; immutable after construction.
/// Re-binding an actuator means constructing a new binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorConfig {
    /// Multiplies the clipped command before mapping.
    pub gain: f64,
    /// Added after the gain (steering trim); zero for throttle.
    pub offset: f64,
    /// I2C bus hosting the controller.
    pub bus: u8,
    /// 7-bit controller address.
    pub address: u8,
    /// Channel assignment on that controller.
    pub assignment: ChannelAssignment,
}

impl ActuatorConfig {
    /// Builds the steering actuator configuration.
    #[must_use]
    pub fn steering(config: &SteeringConfig) -> Self {
        Self {
            gain: config.gain,
            offset: config.offset,
            bus: config.bus,
            address: config.address,
            assignment: ChannelAssignment::Servo {
                channel: config.channel,
            },
        }
    }

    /// Builds the throttle actuator configuration.
    ///
    /// # Errors
    ///
    /// Returns error if an H-bridge assignment does not name exactly
    /// eight channels.
    pub fn throttle(config: &ThrottleConfig) -> Result<Self> {
        let assignment = match config.mode {
            ThrottleMode::Servo => ChannelAssignment::Servo {
                channel: config.channel,
            },
            ThrottleMode::Hbridge => {
                let channels: [u8; HBRIDGE_SLOTS] =
                    config.channels.as_slice().try_into().map_err(|_| {
                        RacerBridgeError::Pwm(format!(
                            "H-bridge assignment needs {} channels, got {}",
                            HBRIDGE_SLOTS,
                            config.channels.len()
                        ))
                    })?;
                ChannelAssignment::HBridge { channels }
            }
        };

        Ok(Self {
            gain: config.gain,
            offset: 0.0,
            bus: config.bus,
            address: config.address,
            assignment,
        })
    }

    /// Same configuration re-targeted at a different controller address.
    ///
    /// Used by the port test harness to exercise discovered addresses.
    #[must_use]
    pub fn at_address(&self, address: u8) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }
}

/// A logical actuator bound to a physical controller.
pub struct ActuatorBinding {
    config: ActuatorConfig,
    backend: Box<dyn PwmBackend>,
}

impl std::fmt::Debug for ActuatorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorBinding")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ActuatorBinding {
    /// Binds an actuator to an already-open backend.
    #[must_use]
    pub fn new(config: ActuatorConfig, backend: Box<dyn PwmBackend>) -> Self {
        Self { config, backend }
    }

    /// Opens the configured controller and binds to it.
    ///
    /// # Errors
    ///
    /// Fails with [`RacerBridgeError::ControllerNotFound`] if nothing
    /// acknowledges at the configured address; the caller may retry with a
    /// different address.
    pub fn open(config: ActuatorConfig) -> Result<Self> {
        let backend = Pca9685Backend::open(config.bus, config.address)?;
        Ok(Self::new(config, Box::new(backend)))
    }

    /// The binding's static configuration.
    #[must_use]
    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    /// Applies a raw command: clip, scale, map, write.
    ///
    /// Synchronous and idempotent. A failed bus write surfaces as an error
    /// and is not retried.
    ///
    /// # Errors
    ///
    /// Returns error if a backend write fails.
    pub fn set(&mut self, raw: f64) -> Result<()> {
        let command = NormalizedCommand::clip(raw).get();

        match self.config.assignment {
            ChannelAssignment::Servo { channel } => {
                let value = (command * self.config.gain + self.config.offset).clamp(-1.0, 1.0);
                debug!(
                    "servo write: addr=0x{:02x} ch={} value={:.4}",
                    self.config.address, channel, value
                );
                self.backend.set_servo_throttle(channel, value)
            }
            ChannelAssignment::HBridge { channels } => {
                let v = command * self.config.gain;
                debug!(
                    "h-bridge write: addr=0x{:02x} v={:.4}",
                    self.config.address, v
                );
                for duty in map_throttle(v) {
                    self.backend
                        .set_duty_cycle(channels[duty.slot as usize], duty.duty)?;
                }
                Ok(())
            }
        }
    }
}

/// The vehicle: one steering binding and one throttle binding.
///
/// # Examples
///
/// ```no_run
/// use racer_bridge::actuator::Racecar;
/// use racer_bridge::config::Config;
///
/// fn main() -> anyhow::Result<()> {
///     let config = Config::default();
///     let mut car = Racecar::open(&config)?;
///     car.set_steering(0.1)?;
///     car.set_throttle(0.1)?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Racecar {
    steering: ActuatorBinding,
    throttle: ActuatorBinding,
}

impl Racecar {
    /// Assembles a vehicle from two pre-built bindings.
    #[must_use]
    pub fn new(steering: ActuatorBinding, throttle: ActuatorBinding) -> Self {
        Self { steering, throttle }
    }

    /// Opens both configured controllers and binds the actuators.
    ///
    /// # Errors
    ///
    /// Returns error if either controller does not respond at its
    /// configured address.
    pub fn open(config: &Config) -> Result<Self> {
        let steering = ActuatorBinding::open(ActuatorConfig::steering(&config.steering))?;
        let throttle = ActuatorBinding::open(ActuatorConfig::throttle(&config.throttle)?)?;
        Ok(Self::new(steering, throttle))
    }

    /// Applies a steering command in [-1, 1] (clipped if outside).
    ///
    /// # Errors
    ///
    /// Returns error if the bus write fails.
    pub fn set_steering(&mut self, raw: f64) -> Result<()> {
        self.steering.set(raw)
    }

    /// Applies a throttle command in [-1, 1] (clipped if outside).
    ///
    /// # Errors
    ///
    /// Returns error if a bus write fails.
    pub fn set_throttle(&mut self, raw: f64) -> Result<()> {
        self.throttle.set(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::hbridge::FULL_SCALE;
    use crate::pwm::mocks::{MockPwmBackend, MockWrite};

    fn steering_binding(gain: f64, offset: f64) -> (ActuatorBinding, MockPwmBackend) {
        let mock = MockPwmBackend::new();
        let config = ActuatorConfig {
            gain,
            offset,
            bus: 1,
            address: 0x40,
            assignment: ChannelAssignment::Servo { channel: 0 },
        };
        (
            ActuatorBinding::new(config, Box::new(mock.clone())),
            mock,
        )
    }

    fn hbridge_binding(gain: f64, channels: [u8; 8]) -> (ActuatorBinding, MockPwmBackend) {
        let mock = MockPwmBackend::new();
        let config = ActuatorConfig {
            gain,
            offset: 0.0,
            bus: 1,
            address: 0x42,
            assignment: ChannelAssignment::HBridge { channels },
        };
        (
            ActuatorBinding::new(config, Box::new(mock.clone())),
            mock,
        )
    }

    fn servo_value(write: &MockWrite) -> f64 {
        match write {
            MockWrite::Servo { value, .. } => *value,
            other => panic!("expected servo write, got {:?}", other),
        }
    }

    // ==================== Servo Mode Tests ====================

    #[test]
    fn test_steering_applies_gain_and_offset() {
        let (mut binding, mock) = steering_binding(-0.65, 0.0);
        binding.set(0.3).unwrap();

        let writes = mock.recorded_writes();
        assert_eq!(writes.len(), 1);
        // 0.3 * -0.65 = -0.195
        assert!((servo_value(&writes[0]) - (-0.195)).abs() < 1e-12);
    }

    #[test]
    fn test_steering_offset_applied_after_gain() {
        let (mut binding, mock) = steering_binding(0.5, 0.1);
        binding.set(0.4).unwrap();

        let writes = mock.recorded_writes();
        assert!((servo_value(&writes[0]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_steering_output_clamped() {
        let (mut binding, mock) = steering_binding(1.0, 0.5);
        binding.set(0.9).unwrap();

        // 0.9 * 1.0 + 0.5 = 1.4 → clamped to 1.0
        assert_eq!(servo_value(&mock.recorded_writes()[0]), 1.0);
    }

    #[test]
    fn test_out_of_range_command_is_clipped() {
        let (mut binding, mock) = steering_binding(-0.65, 0.0);
        binding.set(1.5).unwrap();
        binding.set(1.0).unwrap();

        let writes = mock.recorded_writes();
        // clip(1.5) == 1.0, so both writes are identical
        assert_eq!(servo_value(&writes[0]), servo_value(&writes[1]));
    }

    #[test]
    fn test_servo_writes_configured_channel() {
        let mock = MockPwmBackend::new();
        let config = ActuatorConfig {
            gain: 0.8,
            offset: 0.0,
            bus: 1,
            address: 0x40,
            assignment: ChannelAssignment::Servo { channel: 7 },
        };
        let mut binding = ActuatorBinding::new(config, Box::new(mock.clone()));
        binding.set(0.5).unwrap();

        match &mock.recorded_writes()[0] {
            MockWrite::Servo { channel, .. } => assert_eq!(*channel, 7),
            other => panic!("expected servo write, got {:?}", other),
        }
    }

    // ==================== H-Bridge Mode Tests ====================

    #[test]
    fn test_forward_throttle_duties() {
        let (mut binding, mock) = hbridge_binding(0.8, [0, 1, 2, 3, 4, 5, 6, 7]);
        binding.set(0.5).unwrap();

        let writes = mock.recorded_writes();
        assert_eq!(writes.len(), 8);

        // v = 0.5 * 0.8 = 0.4 → PWM legs at round(65535 * 0.4) = 26214
        let expected = [
            (0, 26214),
            (1, FULL_SCALE),
            (2, 0),
            (3, 0),
            (4, 26214),
            (5, 0),
            (6, FULL_SCALE),
            (7, 26214),
        ];
        for (write, (channel, duty)) in writes.iter().zip(expected) {
            assert_eq!(
                *write,
                MockWrite::Duty { channel, duty },
                "mismatch on channel {}",
                channel
            );
        }
    }

    #[test]
    fn test_reverse_throttle_duties() {
        let (mut binding, mock) = hbridge_binding(0.8, [0, 1, 2, 3, 4, 5, 6, 7]);
        binding.set(-0.5).unwrap();

        let writes = mock.recorded_writes();
        let expected = [
            (0, 26214),
            (1, 0),
            (2, FULL_SCALE),
            (3, 26214),
            (4, 0),
            (5, FULL_SCALE),
            (6, 0),
            (7, 26214),
        ];
        for (write, (channel, duty)) in writes.iter().zip(expected) {
            assert_eq!(*write, MockWrite::Duty { channel, duty });
        }
    }

    #[test]
    fn test_hbridge_respects_channel_assignment() {
        // Slots remapped onto the controller's upper channel bank
        let (mut binding, mock) = hbridge_binding(1.0, [8, 9, 10, 11, 12, 13, 14, 15]);
        binding.set(1.0).unwrap();

        let channels: Vec<u8> = mock
            .recorded_writes()
            .iter()
            .map(|w| match w {
                MockWrite::Duty { channel, .. } => *channel,
                other => panic!("expected duty write, got {:?}", other),
            })
            .collect();
        assert_eq!(channels, vec![8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_zero_throttle_rest_state() {
        let (mut binding, mock) = hbridge_binding(0.8, [0, 1, 2, 3, 4, 5, 6, 7]);
        binding.set(0.0).unwrap();

        for write in mock.recorded_writes() {
            match write {
                MockWrite::Duty { channel, duty } => {
                    let expected = if channel == 2 || channel == 5 { FULL_SCALE } else { 0 };
                    assert_eq!(duty, expected, "channel {}", channel);
                }
                other => panic!("expected duty write, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_repeated_command_is_idempotent() {
        let (mut binding, mock) = hbridge_binding(0.8, [0, 1, 2, 3, 4, 5, 6, 7]);
        binding.set(0.5).unwrap();
        binding.set(0.5).unwrap();

        let writes = mock.recorded_writes();
        assert_eq!(writes.len(), 16);
        assert_eq!(&writes[..8], &writes[8..]);
    }

    // ==================== Failure Tests ====================

    #[test]
    fn test_write_failure_surfaces() {
        let (mut binding, mock) = hbridge_binding(0.8, [0, 1, 2, 3, 4, 5, 6, 7]);
        binding.set(0.5).unwrap();
        let writes_before = mock.recorded_writes();

        mock.set_write_error("bus transaction failed");
        let result = binding.set(0.7);
        assert!(matches!(result, Err(RacerBridgeError::Pwm(_))));

        // Previously-set state is untouched beyond the attempted write
        assert_eq!(mock.recorded_writes(), writes_before);
    }

    #[test]
    fn test_recovery_after_failure() {
        let (mut binding, mock) = steering_binding(-0.65, 0.0);
        mock.set_write_error("bus transaction failed");
        assert!(binding.set(0.3).is_err());

        mock.clear_write_error();
        assert!(binding.set(0.3).is_ok());
        assert_eq!(mock.recorded_writes().len(), 1);
    }

    // ==================== Racecar Tests ====================

    #[test]
    fn test_racecar_routes_commands() {
        let steering_mock = MockPwmBackend::new();
        let throttle_mock = MockPwmBackend::new();

        let steering = ActuatorBinding::new(
            ActuatorConfig::steering(&crate::config::SteeringConfig::default()),
            Box::new(steering_mock.clone()),
        );
        let throttle = ActuatorBinding::new(
            ActuatorConfig::throttle(&crate::config::ThrottleConfig::default()).unwrap(),
            Box::new(throttle_mock.clone()),
        );
        let mut car = Racecar::new(steering, throttle);

        car.set_steering(0.1).unwrap();
        car.set_throttle(0.1).unwrap();

        assert_eq!(steering_mock.recorded_writes().len(), 1);
        assert_eq!(throttle_mock.recorded_writes().len(), 8);
    }

    // ==================== Config Construction Tests ====================

    #[test]
    fn test_throttle_config_rejects_short_assignment() {
        let mut config = crate::config::ThrottleConfig::default();
        config.channels = vec![0, 1, 2];
        assert!(ActuatorConfig::throttle(&config).is_err());
    }

    #[test]
    fn test_throttle_servo_variant() {
        let mut config = crate::config::ThrottleConfig::default();
        config.mode = ThrottleMode::Servo;
        config.channel = 1;
        let actuator = ActuatorConfig::throttle(&config).unwrap();
        assert_eq!(
            actuator.assignment,
            ChannelAssignment::Servo { channel: 1 }
        );
        assert_eq!(actuator.offset, 0.0);
    }

    #[test]
    fn test_at_address_retargets_only_address() {
        let config = ActuatorConfig::steering(&crate::config::SteeringConfig::default());
        let moved = config.at_address(0x60);
        assert_eq!(moved.address, 0x60);
        assert_eq!(moved.gain, config.gain);
        assert_eq!(moved.assignment, config.assignment);
    }
}

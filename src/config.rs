//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub port_test: PortTestConfig,
}

/// Steering actuator configuration (continuous-servo channel)
#[derive(Debug, Deserialize, Clone)]
pub struct SteeringConfig {
    #[serde(default = "default_bus")]
    pub bus: u8,

    #[serde(default = "default_steering_address")]
    pub address: u8,

    #[serde(default = "default_steering_channel")]
    pub channel: u8,

    #[serde(default = "default_steering_gain")]
    pub gain: f64,

    #[serde(default = "default_steering_offset")]
    pub offset: f64,
}

/// Throttle drive mode
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleMode {
    /// Single continuous-servo channel (single-controller hardware)
    Servo,
    /// 8-channel dual H-bridge layout (split-controller hardware)
    Hbridge,
}

/// Throttle actuator configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ThrottleConfig {
    #[serde(default = "default_throttle_mode")]
    pub mode: ThrottleMode,

    #[serde(default = "default_bus")]
    pub bus: u8,

    #[serde(default = "default_throttle_address")]
    pub address: u8,

    #[serde(default = "default_throttle_gain")]
    pub gain: f64,

    /// Channel for servo mode
    #[serde(default = "default_throttle_channel")]
    pub channel: u8,

    /// Ordered channel assignment for H-bridge mode, one entry per slot
    #[serde(default = "default_hbridge_channels")]
    pub channels: Vec<u8>,
}

/// Bus scan configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_scan_buses")]
    pub buses: Vec<u8>,
}

/// Port test harness configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PortTestConfig {
    #[serde(default = "default_port_test_enabled")]
    pub enabled: bool,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_test_commands")]
    pub commands: Vec<f64>,
}

// Default value functions
fn default_bus() -> u8 { 1 }
fn default_steering_address() -> u8 { 0x40 }
fn default_steering_channel() -> u8 { 0 }
fn default_steering_gain() -> f64 { -0.65 }
fn default_steering_offset() -> f64 { 0.0 }

fn default_throttle_mode() -> ThrottleMode { ThrottleMode::Hbridge }
fn default_throttle_address() -> u8 { 0x42 }
fn default_throttle_gain() -> f64 { 0.8 }
fn default_throttle_channel() -> u8 { 1 }
fn default_hbridge_channels() -> Vec<u8> { (0..8).collect() }

fn default_scan_buses() -> Vec<u8> { vec![1, 2] }

fn default_port_test_enabled() -> bool { false }
fn default_settle_ms() -> u64 { 500 }
fn default_test_commands() -> Vec<f64> { vec![0.3, 0.7] }

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_steering_address(),
            channel: default_steering_channel(),
            gain: default_steering_gain(),
            offset: default_steering_offset(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            mode: default_throttle_mode(),
            bus: default_bus(),
            address: default_throttle_address(),
            gain: default_throttle_gain(),
            channel: default_throttle_channel(),
            channels: default_hbridge_channels(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            buses: default_scan_buses(),
        }
    }
}

impl Default for PortTestConfig {
    fn default() -> Self {
        Self {
            enabled: default_port_test_enabled(),
            settle_ms: default_settle_ms(),
            commands: default_test_commands(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steering: SteeringConfig::default(),
            throttle: ThrottleConfig::default(),
            scan: ScanConfig::default(),
            port_test: PortTestConfig::default(),
        }
    }
}

/// Highest valid 7-bit I2C address.
const I2C_ADDRESS_MAX: u8 = 0x7F;

/// Channels per PCA9685 controller.
const CONTROLLER_CHANNELS: u8 = 16;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use racer_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The throttle's channel assignment as actually driven.
    ///
    /// Servo mode uses a single channel; H-bridge mode uses the full
    /// slot assignment.
    #[must_use]
    pub fn throttle_channels(&self) -> Vec<u8> {
        match self.throttle.mode {
            ThrottleMode::Servo => vec![self.throttle.channel],
            ThrottleMode::Hbridge => self.throttle.channels.clone(),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range, or
    /// if the steering and throttle actuators share a controller but their
    /// channel assignments overlap.
    pub fn validate(&self) -> Result<()> {
        // Validate addresses (7-bit I2C)
        for (name, address) in [
            ("steering.address", self.steering.address),
            ("throttle.address", self.throttle.address),
        ] {
            if address > I2C_ADDRESS_MAX {
                return Err(crate::error::RacerBridgeError::Config(
                    toml::de::Error::custom(format!("{} must be a 7-bit address (0-127)", name)),
                ));
            }
        }

        // Validate channel indices
        if self.steering.channel >= CONTROLLER_CHANNELS {
            return Err(crate::error::RacerBridgeError::Config(
                toml::de::Error::custom("steering.channel must be 0-15"),
            ));
        }

        match self.throttle.mode {
            ThrottleMode::Servo => {
                if self.throttle.channel >= CONTROLLER_CHANNELS {
                    return Err(crate::error::RacerBridgeError::Config(
                        toml::de::Error::custom("throttle.channel must be 0-15"),
                    ));
                }
            }
            ThrottleMode::Hbridge => {
                if self.throttle.channels.len() != crate::actuator::hbridge::HBRIDGE_SLOTS {
                    return Err(crate::error::RacerBridgeError::Config(
                        toml::de::Error::custom(
                            "throttle.channels must assign exactly 8 channels in hbridge mode",
                        ),
                    ));
                }
                for &channel in &self.throttle.channels {
                    if channel >= CONTROLLER_CHANNELS {
                        return Err(crate::error::RacerBridgeError::Config(
                            toml::de::Error::custom(format!(
                                "throttle.channels entry {} is out of bounds (must be 0-15)",
                                channel
                            )),
                        ));
                    }
                }
                let mut seen = [false; CONTROLLER_CHANNELS as usize];
                for &channel in &self.throttle.channels {
                    if seen[channel as usize] {
                        return Err(crate::error::RacerBridgeError::Config(
                            toml::de::Error::custom(format!(
                                "throttle.channels assigns channel {} twice",
                                channel
                            )),
                        ));
                    }
                    seen[channel as usize] = true;
                }
            }
        }

        // Validate gains and offset
        for (name, value) in [
            ("steering.gain", self.steering.gain),
            ("throttle.gain", self.throttle.gain),
        ] {
            if !value.is_finite() || value == 0.0 || value.abs() > 1.0 {
                return Err(crate::error::RacerBridgeError::Config(
                    toml::de::Error::custom(format!(
                        "{} must be a non-zero value in [-1.0, 1.0]",
                        name
                    )),
                ));
            }
        }

        if !self.steering.offset.is_finite() || self.steering.offset.abs() > 1.0 {
            return Err(crate::error::RacerBridgeError::Config(
                toml::de::Error::custom("steering.offset must be between -1.0 and 1.0"),
            ));
        }

        // Two actuators may share a controller only on disjoint channels
        if self.steering.bus == self.throttle.bus
            && self.steering.address == self.throttle.address
            && self.throttle_channels().contains(&self.steering.channel)
        {
            return Err(crate::error::RacerBridgeError::Config(
                toml::de::Error::custom(format!(
                    "steering and throttle share controller 0x{:02x} and channel {}",
                    self.steering.address, self.steering.channel
                )),
            ));
        }

        // Validate port test parameters
        if self.port_test.settle_ms == 0 || self.port_test.settle_ms > 10000 {
            return Err(crate::error::RacerBridgeError::Config(
                toml::de::Error::custom("port_test.settle_ms must be between 1 and 10000"),
            ));
        }

        if self.port_test.commands.is_empty() {
            return Err(crate::error::RacerBridgeError::Config(
                toml::de::Error::custom("port_test.commands must not be empty"),
            ));
        }

        for &command in &self.port_test.commands {
            if !command.is_finite() || command.abs() > 1.0 {
                return Err(crate::error::RacerBridgeError::Config(
                    toml::de::Error::custom(format!(
                        "port_test.commands entry {} must be between -1.0 and 1.0",
                        command
                    )),
                ));
            }
        }

        if self.scan.buses.is_empty() {
            return Err(crate::error::RacerBridgeError::Config(
                toml::de::Error::custom("scan.buses must name at least one bus"),
            ));
        }

        Ok(())
    }
}

//! # Error Types
//!
//! Custom error types for Racer Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Racer Bridge
#[derive(Debug, Error)]
pub enum RacerBridgeError {
    /// PWM controller / I2C transaction errors
    #[error("PWM controller error: {0}")]
    Pwm(String),

    /// No PWM controller acknowledged at the configured address
    #[error("no PWM controller responded at address 0x{0:02x}")]
    ControllerNotFound(u8),

    /// Channel index outside the controller's 16 channels
    #[error("invalid PWM channel index {0} (PCA9685 has channels 0-15)")]
    InvalidChannel(u8),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Racer Bridge
pub type Result<T> = std::result::Result<T, RacerBridgeError>;

//! # Racer Bridge Library
//!
//! Drive a JetRacer-style RC car's steering and throttle over an I2C PWM
//! controller.
//!
//! This library provides the core command-to-actuation pipeline: normalized
//! steering/throttle commands in [-1, 1] are clipped, gain-scaled, mapped to
//! PCA9685 PWM channels (continuous-servo or dual-H-bridge layout) and
//! written over I2C. It also provides an `i2cdetect`-based bus prober and a
//! port test harness for confirming wiring.

pub mod config;
pub mod error;
pub mod actuator;
pub mod pwm;
pub mod scan;
pub mod harness;

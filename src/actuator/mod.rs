//! # Actuator Module
//!
//! The command-to-actuation pipeline: command validation
//! ([`command`]), the H-bridge channel mapper ([`hbridge`]) and the
//! controller bindings that tie a logical actuator to a physical PWM
//! controller ([`binding`]).

pub mod binding;
pub mod command;
pub mod hbridge;

pub use binding::{ActuatorBinding, ActuatorConfig, ChannelAssignment, Racecar};
pub use command::NormalizedCommand;

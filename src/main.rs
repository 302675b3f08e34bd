//! # Racer Bridge
//!
//! Drive a JetRacer-style RC car's steering and throttle over an I2C PWM
//! controller.
//!
//! Startup sequence:
//!
//! 1. Initialize logging with tracing subscriber
//! 2. Load `config/default.toml` (built-in defaults if absent)
//! 3. Open both PWM controllers and bind the actuators
//! 4. Optionally run the port test harness (`port_test.enabled`)
//! 5. Issue the example commands (steering 0.1, throttle 0.1)
//! 6. On Ctrl+C, command neutral and exit
//!
//! All construction happens here, explicitly — nothing actuates as a side
//! effect of loading a module.

use anyhow::Result;
use tracing::{info, warn};

use racer_bridge::actuator::{ActuatorBinding, Racecar};
use racer_bridge::config::Config;
use racer_bridge::harness::run_port_test;
use racer_bridge::scan::I2cDetect;

/// Configuration file consulted at startup.
const CONFIG_PATH: &str = "config/default.toml";

/// Example commands issued after startup (normalized, in [-1, 1]).
const EXAMPLE_STEERING: f64 = 0.1;
const EXAMPLE_THROTTLE: f64 = 0.1;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Racer Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config();

    let mut car = Racecar::open(&config)?;
    info!(
        "actuators bound: steering at 0x{:02x} (bus {}), throttle at 0x{:02x} (bus {})",
        config.steering.address, config.steering.bus, config.throttle.address, config.throttle.bus
    );

    if config.port_test.enabled {
        let report = run_port_test(&config, &I2cDetect, ActuatorBinding::open).await?;
        if report.all_passed() {
            info!("port test finished: all candidates passed");
        } else {
            warn!("port test finished: some candidates failed (see log above)");
        }
    }

    // Example commands
    car.set_steering(EXAMPLE_STEERING)?;
    car.set_throttle(EXAMPLE_THROTTLE)?;
    info!(
        "example commands issued (steering={}, throttle={})",
        EXAMPLE_STEERING, EXAMPLE_THROTTLE
    );
    info!("Press Ctrl+C to exit");

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    // Neutral out both actuators before dropping the bindings
    if let Err(e) = car.set_throttle(0.0) {
        warn!("failed to neutral throttle on shutdown: {}", e);
    }
    if let Err(e) = car.set_steering(0.0) {
        warn!("failed to neutral steering on shutdown: {}", e);
    }

    Ok(())
}

/// Loads the startup configuration, falling back to built-in defaults.
fn load_config() -> Config {
    match Config::load(CONFIG_PATH) {
        Ok(config) => {
            info!("Loaded configuration from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!(
                "Could not load {}: {} (using built-in defaults)",
                CONFIG_PATH, e
            );
            Config::default()
        }
    }
}

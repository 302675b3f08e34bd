//! # Port Test Harness Module
//!
//! Lets an operator confirm wiring: scan the configured buses, then drive
//! a small deterministic command sequence through every discovered address,
//! once along the steering path and once along the throttle path, with a
//! settle delay between steps so the motion is visible.
//!
//! Candidates are isolated from each other: an address that fails to open
//! or refuses a write is logged and recorded in the report, and the test
//! moves on to the next candidate. One dead device must never abort the
//! whole survey.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::actuator::{ActuatorBinding, ActuatorConfig};
use crate::config::Config;
use crate::error::Result;
use crate::scan::{scan, DetectRunner};

/// Result of exercising one candidate address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTestOutcome {
    /// The address that was exercised.
    pub address: u8,
    /// `None` on success, otherwise the failure description.
    pub error: Option<String>,
}

impl PortTestOutcome {
    /// Whether this candidate completed the full test sequence.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-address outcomes for both actuator paths.
#[derive(Debug, Default)]
pub struct PortTestReport {
    /// Outcomes of the steering pass, in scan order.
    pub steering: Vec<PortTestOutcome>,
    /// Outcomes of the throttle pass, in scan order.
    pub throttle: Vec<PortTestOutcome>,
}

impl PortTestReport {
    /// Whether every exercised candidate passed both paths.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.steering.iter().chain(&self.throttle).all(PortTestOutcome::passed)
    }
}

/// Runs the port test: scan, then exercise each discovered address.
///
/// `open` constructs a transient binding for a candidate configuration;
/// the production opener is [`ActuatorBinding::open`], tests inject mocks.
///
/// # Errors
///
/// Returns error only if the throttle configuration itself is unusable;
/// individual candidate failures land in the report instead.
pub async fn run_port_test<R, F>(config: &Config, runner: &R, mut open: F) -> Result<PortTestReport>
where
    R: DetectRunner,
    F: FnMut(ActuatorConfig) -> Result<ActuatorBinding>,
{
    let addresses = scan(runner, &config.scan.buses).await;
    info!("port test: {} candidate address(es)", addresses.len());

    let settle = Duration::from_millis(config.port_test.settle_ms);
    let commands = &config.port_test.commands;

    let steering_base = ActuatorConfig::steering(&config.steering);
    let throttle_base = ActuatorConfig::throttle(&config.throttle)?;

    let mut report = PortTestReport::default();

    info!("trying steering");
    for &address in &addresses {
        let outcome =
            exercise_address(&mut open, steering_base.at_address(address), commands, settle).await;
        report.steering.push(outcome);
    }

    info!("trying throttle");
    for &address in &addresses {
        let outcome =
            exercise_address(&mut open, throttle_base.at_address(address), commands, settle).await;
        report.throttle.push(outcome);
    }

    Ok(report)
}

/// Exercises one candidate address; failures are captured, not propagated.
async fn exercise_address<F>(
    open: &mut F,
    actuator: ActuatorConfig,
    commands: &[f64],
    settle: Duration,
) -> PortTestOutcome
where
    F: FnMut(ActuatorConfig) -> Result<ActuatorBinding>,
{
    let address = actuator.address;
    info!("    port: 0x{:02x}", address);

    let mut binding = match open(actuator) {
        Ok(binding) => binding,
        Err(e) => {
            warn!("    0x{:02x}: open failed: {}", address, e);
            return PortTestOutcome {
                address,
                error: Some(e.to_string()),
            };
        }
    };

    for &command in commands {
        info!("    going to {}", command);
        if let Err(e) = binding.set(command) {
            warn!("    0x{:02x}: write failed: {}", address, e);
            return PortTestOutcome {
                address,
                error: Some(e.to_string()),
            };
        }
        sleep(settle).await;
    }

    PortTestOutcome {
        address,
        error: None,
    }
}

//! # Bus Scan Module
//!
//! Discovers which I2C addresses host responding devices.
//!
//! Probing itself is delegated to the system `i2cdetect` tool, which
//! read-probes the 7-bit address space of one bus and prints a hexadecimal
//! grid:
//!
//! ```text
//!      0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f
//! 00:          -- -- -- -- -- -- -- -- -- -- -- -- --
//! 40: 40 -- 42 -- -- -- -- -- -- -- -- -- -- -- -- --
//! 70: -- -- -- -- -- -- -- --
//! ```
//!
//! This module runs that tool (through the [`DetectRunner`] seam so tests
//! can feed canned grids) and parses every responding address out of the
//! grid, in probe order: ascending within a bus, buses in the order given.
//!
//! A bus that fails to scan is logged and skipped — absence is never fatal
//! to the overall scan.
//!
//! Earlier revisions of this driver matched grid tokens with `^\d\d$` and
//! silently missed addresses containing the hex digits a-f; the parser
//! accepts the full hex token set, and the tests flag that behavior change.

use async_trait::async_trait;
use std::io;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Highest valid 7-bit I2C address.
const ADDRESS_MAX: u8 = 0x7F;

/// Trait for running an address probe on one bus
#[async_trait]
pub trait DetectRunner: Send + Sync {
    /// Probe `bus` and return the textual address grid.
    async fn detect(&self, bus: u8) -> io::Result<String>;
}

/// Runs the system `i2cdetect` tool.
#[derive(Debug, Default)]
pub struct I2cDetect;

#[async_trait]
impl DetectRunner for I2cDetect {
    async fn detect(&self, bus: u8) -> io::Result<String> {
        debug!("running i2cdetect -y -r {}", bus);
        let output = Command::new("i2cdetect")
            .arg("-y")
            .arg("-r")
            .arg(bus.to_string())
            .output()
            .await?;

        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("i2cdetect on bus {} exited with {}", bus, output.status),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parses responding addresses out of an `i2cdetect` grid.
///
/// A token counts as a discovered address when it is exactly two hex
/// digits and lies in the 7-bit address space. The row label before the
/// colon is not an address; `--` (no response) and `UU` (kernel-claimed)
/// are not discovered addresses.
///
/// # Examples
///
/// ```
/// use racer_bridge::scan::parse_detect_grid;
///
/// let grid = "40: 40 -- 42 -- -- -- -- -- -- -- -- -- -- -- -- --\n";
/// assert_eq!(parse_detect_grid(grid), vec![0x40, 0x42]);
/// ```
#[must_use]
pub fn parse_detect_grid(grid: &str) -> Vec<u8> {
    let mut addresses = Vec::new();

    for line in grid.lines() {
        // Grid rows carry a "NN:" label; the header row has no colon.
        let Some((_, cells)) = line.split_once(':') else {
            continue;
        };

        for token in cells.split_whitespace() {
            if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                continue;
            }
            if let Ok(address) = u8::from_str_radix(token, 16) {
                if address <= ADDRESS_MAX {
                    addresses.push(address);
                }
            }
        }
    }

    addresses
}

/// Scans the given buses and returns every responding address.
///
/// Results follow probe order: ascending address within a bus, buses in
/// the order given. A bus whose probe fails is logged and skipped.
pub async fn scan<R: DetectRunner>(runner: &R, buses: &[u8]) -> Vec<u8> {
    let mut discovered = Vec::new();

    for &bus in buses {
        match runner.detect(bus).await {
            Ok(grid) => {
                let found = parse_detect_grid(&grid);
                info!("bus {}: {} address(es) responded", bus, found.len());
                discovered.extend(found);
            }
            Err(e) => {
                warn!("scan of bus {} failed: {}", bus, e);
            }
        }
    }

    discovered
}


#[cfg(test)]
mod tests {
    use super::mocks::MockDetectRunner;
    use super::*;

    const EMPTY_ROW: &str = "10: -- -- -- -- -- -- -- -- -- -- -- -- -- -- -- --\n";

    fn grid_with_devices() -> String {
        let mut grid = String::from(
            "     0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f\n\
             00:          -- -- -- -- -- -- -- -- -- -- -- -- --\n",
        );
        grid.push_str(EMPTY_ROW);
        grid.push_str("40: 40 -- 42 -- -- -- -- -- -- -- -- -- -- -- -- --\n");
        grid.push_str("70: -- -- -- -- -- -- -- --\n");
        grid
    }

    // ==================== Parser Tests ====================

    #[test]
    fn test_parse_empty_grid() {
        let grid = format!("     0  1  2  3\n{}", EMPTY_ROW);
        assert!(parse_detect_grid(&grid).is_empty());
    }

    #[test]
    fn test_parse_finds_devices() {
        assert_eq!(parse_detect_grid(&grid_with_devices()), vec![0x40, 0x42]);
    }

    #[test]
    fn test_parse_header_row_ignored() {
        // Header digits must never be mistaken for addresses
        let grid = "     0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f\n";
        assert!(parse_detect_grid(grid).is_empty());
    }

    #[test]
    fn test_parse_row_label_is_not_an_address() {
        let grid = "40: -- -- -- -- -- -- -- -- -- -- -- -- -- -- -- --\n";
        assert!(parse_detect_grid(grid).is_empty());
    }

    #[test]
    fn test_hex_letter_addresses_are_discovered() {
        // Behavior change vs. the original driver: its ^\d\d$ token match
        // missed any address containing a-f (e.g. a display at 0x3c).
        let grid = "30: -- -- -- -- -- -- -- -- -- -- -- -- 3c -- 3e --\n";
        assert_eq!(parse_detect_grid(grid), vec![0x3c, 0x3e]);
    }

    #[test]
    fn test_kernel_claimed_addresses_excluded() {
        let grid = "60: 60 -- UU -- -- -- -- -- -- -- -- -- -- -- -- --\n";
        assert_eq!(parse_detect_grid(grid), vec![0x60]);
    }

    #[test]
    fn test_parse_order_is_ascending_without_duplicates() {
        let addresses = parse_detect_grid(&grid_with_devices());
        let mut sorted = addresses.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(addresses, sorted);
    }

    #[test]
    fn test_parse_ignores_out_of_range_tokens() {
        // Not a 7-bit address; a well-formed grid never prints it, but the
        // parser must not hand it to the caller either.
        let grid = "80: 8a -- -- -- -- -- -- -- -- -- -- -- -- -- -- --\n";
        assert!(parse_detect_grid(grid).is_empty());
    }

    // ==================== Scan Tests ====================

    #[tokio::test]
    async fn test_scan_single_bus() {
        let runner = MockDetectRunner::new().with_grid(1, &grid_with_devices());
        assert_eq!(scan(&runner, &[1]).await, vec![0x40, 0x42]);
    }

    #[tokio::test]
    async fn test_scan_concatenates_buses_in_order() {
        let runner = MockDetectRunner::new()
            .with_grid(1, "40: 40 -- -- -- -- -- -- -- -- -- -- -- -- -- -- --\n")
            .with_grid(2, "60: 60 -- -- -- -- -- -- -- -- -- -- -- -- -- -- --\n");
        assert_eq!(scan(&runner, &[2, 1]).await, vec![0x60, 0x40]);
    }

    #[tokio::test]
    async fn test_failed_bus_is_skipped_not_fatal() {
        let runner = MockDetectRunner::new().with_grid(2, &grid_with_devices());
        // Bus 1 has no canned grid and errors out; bus 2 still reports.
        assert_eq!(scan(&runner, &[1, 2]).await, vec![0x40, 0x42]);
    }

    #[tokio::test]
    async fn test_scan_no_buses() {
        let runner = MockDetectRunner::new();
        assert!(scan(&runner, &[]).await.is_empty());
    }
}

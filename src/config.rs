//! Scanner configuration

use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings of the scanner. Defaults match the stock handheld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Serial device of the LF module
    pub rfid_port: String,
    pub rfid_baud_rate: u32,
    /// GPIO control file switching the LF module's power rail
    pub power_rail_path: PathBuf,
    /// Reader suspend between read cycles
    pub poll_interval: Duration,
    /// Maximum bytes taken per read cycle, always within 1..=64
    read_chunk: usize,
    /// Re-arm the barcode engine after every read
    pub auto_restart: bool,
}

impl ScannerConfig {
    pub const MAX_READ_CHUNK: usize = 64;

    pub fn with_rfid_port(mut self, port: impl Into<String>, baud_rate: u32) -> Self {
        self.rfid_port = port.into();
        self.rfid_baud_rate = baud_rate;
        self
    }

    pub fn with_power_rail_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.power_rail_path = path.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_read_chunk(mut self, chunk: usize) -> Self {
        self.read_chunk = chunk.clamp(1, Self::MAX_READ_CHUNK);
        self
    }

    pub fn with_auto_restart(mut self, enabled: bool) -> Self {
        self.auto_restart = enabled;
        self
    }

    pub fn read_chunk(&self) -> usize {
        self.read_chunk
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rfid_port: "/dev/ttyS3".into(),
            rfid_baud_rate: 9600,
            power_rail_path: PathBuf::from("/proc/gpiocontrol/set_uhf"),
            poll_interval: Duration::from_millis(20),
            read_chunk: Self::MAX_READ_CHUNK,
            auto_restart: true,
        }
    }
}

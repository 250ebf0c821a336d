//! Types for scanner operations

use std::fmt;

use thiserror::Error;

/// Operating mode of the handheld. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Idle,
    Barcode,
    Rfid,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanMode::Idle => "none",
            ScanMode::Barcode => "barcode",
            ScanMode::Rfid => "rfid",
        })
    }
}

/// Physical subsystem of the handheld
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Rfid,
    Barcode,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subsystem::Rfid => "RFID module",
            Subsystem::Barcode => "barcode scanner",
        })
    }
}

/// Power and open flags of one subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    pub powered: bool,
    pub open: bool,
}

impl DeviceState {
    pub const OFF: DeviceState = DeviceState {
        powered: false,
        open: false,
    };

    pub fn is_active(&self) -> bool {
        self.powered || self.open
    }
}

/// A decoded identifier published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Rfid(String),
    Barcode(String),
}

impl ScanEvent {
    /// Raw text of the read, without any source prefix
    pub fn payload(&self) -> &str {
        match self {
            ScanEvent::Rfid(s) | ScanEvent::Barcode(s) => s,
        }
    }

    /// Prefixed form (`rfid:...` / `barcode:...`) used by legacy stream consumers
    pub fn tagged(&self) -> String {
        match self {
            ScanEvent::Rfid(s) => format!("rfid:{}", s),
            ScanEvent::Barcode(s) => format!("barcode:{}", s),
        }
    }
}

/// Success payload of an arbiter command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RfidOn,
    RfidAlreadyOn,
    RfidOff,
    ScannerStarted,
    ScannerAlreadyOn,
    ScannerStopped,
    ScannerAlreadyOff,
    AutoRestart(bool),
}

impl Outcome {
    /// True when the command found the device already in the requested state
    pub fn is_noop(&self) -> bool {
        matches!(self, Outcome::RfidAlreadyOn | Outcome::ScannerAlreadyOn | Outcome::ScannerAlreadyOff)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::RfidOn => f.write_str("RFID on"),
            Outcome::RfidAlreadyOn => f.write_str("RFID already on"),
            Outcome::RfidOff => f.write_str("RFID off"),
            Outcome::ScannerStarted => f.write_str("Scanner started"),
            Outcome::ScannerAlreadyOn => f.write_str("Scanner already on"),
            Outcome::ScannerStopped => f.write_str("Scanner stopped"),
            Outcome::ScannerAlreadyOff => f.write_str("Scanner already off"),
            Outcome::AutoRestart(true) => f.write_str("Auto restart enabled"),
            Outcome::AutoRestart(false) => f.write_str("Auto restart disabled"),
        }
    }
}

/// Errors that can occur during scanner operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScannerError {
    /// Power rail command failed
    #[error("failed to switch RFID power: {0}")]
    Power(String),
    /// Subsystem failed to open after power-on
    #[error("failed to open {subsystem}: {reason}")]
    Open { subsystem: Subsystem, reason: String },
    /// Subsystem failed to close; state was reset regardless
    #[error("failed to close {subsystem}: {reason}")]
    Close { subsystem: Subsystem, reason: String },
    /// Command issued before hardware was attached
    #[error("{0} is not initialized")]
    NotInitialized(Subsystem),
    /// Barcode scanner start/stop primitive failed
    #[error("barcode scanner error: {0}")]
    Scanner(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ScannerError {
    /// Stable error code for bridge layers
    pub fn code(&self) -> &'static str {
        match self {
            ScannerError::Power(_) => "RFID_POWER_ERROR",
            ScannerError::Open {
                subsystem: Subsystem::Rfid,
                ..
            } => "RFID_OPEN_ERROR",
            ScannerError::Close {
                subsystem: Subsystem::Rfid,
                ..
            } => "RFID_CLOSE_ERROR",
            ScannerError::NotInitialized(Subsystem::Rfid) => "RFID_INIT_ERROR",
            ScannerError::Open { .. }
            | ScannerError::Close { .. }
            | ScannerError::NotInitialized(_)
            | ScannerError::Scanner(_) => "SCANNER_ERROR",
            ScannerError::UnknownCommand(_) => "NOT_IMPLEMENTED",
            ScannerError::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }
}

/// Convert bytes to uppercase hex string
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

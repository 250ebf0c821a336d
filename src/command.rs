//! Method-name command surface for bridge layers

use std::fmt;

use crate::arbiter::ModeArbiter;
use crate::transport::{BarcodeScanner, RfidModule};
use crate::types::{Outcome, ScannerError};

/// A command accepted by [`ModeArbiter::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    EnableRfid,
    DisableRfid,
    StartBarcodeScan,
    StopBarcodeScan,
    SetAutoRestart(bool),
    IsScannerActive,
    IsRfidActive,
    CurrentMode,
}

impl Command {
    /// Resolve a bridge method name, including legacy aliases.
    ///
    /// `enable` is the argument of `setAutoRestartScan` and ignored otherwise.
    pub fn from_method(method: &str, enable: Option<bool>) -> Result<Self, ScannerError> {
        match method {
            "setRfidPowerOn" | "setPowerOn" => Ok(Command::EnableRfid),
            "setRfidPowerOff" | "setPowerOff" => Ok(Command::DisableRfid),
            "startBarcodeScan" | "startScan" => Ok(Command::StartBarcodeScan),
            "stopBarcodeScan" => Ok(Command::StopBarcodeScan),
            "setAutoRestartScan" => enable
                .map(Command::SetAutoRestart)
                .ok_or_else(|| ScannerError::InvalidArgument("setAutoRestartScan requires `enable`".into())),
            "isScannerActive" => Ok(Command::IsScannerActive),
            "isRfidActive" => Ok(Command::IsRfidActive),
            "getCurrentMode" => Ok(Command::CurrentMode),
            other => Err(ScannerError::UnknownCommand(other.into())),
        }
    }
}

/// Success payload of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Flag(bool),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(s) => f.write_str(s),
            Reply::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl<R: RfidModule, B: BarcodeScanner> ModeArbiter<R, B> {
    /// Run a command and render its result for the bridge
    pub fn dispatch(&self, command: Command) -> Result<Reply, ScannerError> {
        let text = |outcome: Outcome| Reply::Text(outcome.to_string());
        match command {
            Command::EnableRfid => self.enable_rfid().map(text),
            Command::DisableRfid => self.disable_rfid().map(text),
            Command::StartBarcodeScan => self.start_barcode_scan().map(text),
            Command::StopBarcodeScan => self.stop_barcode_scan().map(text),
            Command::SetAutoRestart(enabled) => Ok(text(self.set_auto_restart(enabled))),
            Command::IsScannerActive => Ok(Reply::Flag(self.is_scanner_active())),
            Command::IsRfidActive => Ok(Reply::Flag(self.is_rfid_active())),
            Command::CurrentMode => Ok(Reply::Text(self.current_mode().to_string())),
        }
    }
}

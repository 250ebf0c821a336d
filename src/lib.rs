//! Low-frequency RFID and barcode scanning for handheld terminals.
//!
//! Decodes the raw byte stream of an LF (125/134.2 kHz) tag module into tag
//! identifiers and arbitrates between the RFID module and the barcode
//! engine so that at most one of them is active at a time.
//!
//! # Features
//!
//! - `serial` - Serial port backend for the LF module using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lf_scanner::{EventBus, ModeArbiter, ScannerConfig, SerialRfidModule};
//!
//! let config = ScannerConfig::default();
//! let bus = Arc::new(EventBus::new());
//! let events = bus.subscribe();
//!
//! let arbiter = ModeArbiter::new(config.clone(), bus.clone());
//! arbiter.attach(SerialRfidModule::from_config(&config), my_barcode_engine);
//! arbiter.enable_rfid()?;
//!
//! while let Some(event) = events.recv() {
//!     println!("Read: {}", event.payload());
//! }
//! ```

mod arbiter;
mod cancel;
mod command;
mod config;
mod decoder;
mod power;
mod reader;
mod sink;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use arbiter::ModeArbiter;
pub use cancel::CancellationToken;
pub use command::{Command, Reply};
pub use config::ScannerConfig;
pub use decoder::{decode, DecodedTag, FrameDecoder};
pub use power::GpioPowerRail;
pub use reader::{ReaderStats, SerialReader};
pub use sink::{EventBus, EventSink, Subscription};
pub use transport::{BarcodeScanner, ByteSource, PowerRail, RfidModule};
pub use types::{DeviceState, Outcome, ScanEvent, ScanMode, ScannerError, Subsystem};

#[cfg(feature = "serial")]
pub use serial::{SerialByteSource, SerialModuleError, SerialRfidModule};

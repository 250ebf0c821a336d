//! Serial port backend for the LF module using serialport crate

use std::time::Duration;

use log::debug;

use crate::config::ScannerConfig;
use crate::power::GpioPowerRail;
use crate::transport::{ByteSource, PowerRail, RfidModule};

/// Non-blocking byte source over an open serial port
pub struct SerialByteSource {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialByteSource {
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;
        port.clear(serialport::ClearBuffer::Input)?;

        Ok(Self { port })
    }
}

impl ByteSource for SerialByteSource {
    type Error = std::io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let pending = self.port.bytes_to_read().map_err(std::io::Error::other)? as usize;
        if pending == 0 {
            return Ok(0);
        }
        let len = pending.min(buf.len());
        std::io::Read::read(&mut self.port, &mut buf[..len])
    }
}

/// Errors from the serial LF module
#[derive(Debug)]
pub enum SerialModuleError<E> {
    Power(E),
    Serial(serialport::Error),
}

/// LF module on a serial port with its own power rail
pub struct SerialRfidModule<P: PowerRail> {
    power: P,
    port_name: String,
    baud_rate: u32,
    opened: bool,
}

impl<P: PowerRail> SerialRfidModule<P> {
    pub fn new(power: P, port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            power,
            port_name: port_name.into(),
            baud_rate,
            opened: false,
        }
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }
}

impl SerialRfidModule<GpioPowerRail> {
    /// Module on the configured port, powered through the configured GPIO file
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            GpioPowerRail::new(&config.power_rail_path),
            config.rfid_port.clone(),
            config.rfid_baud_rate,
        )
    }
}

impl<P: PowerRail> RfidModule for SerialRfidModule<P> {
    type Source = SerialByteSource;
    type Error = SerialModuleError<P::Error>;

    fn power_on(&mut self) -> Result<(), Self::Error> {
        self.power.set_power(true).map_err(SerialModuleError::Power)
    }

    fn power_off(&mut self) -> Result<(), Self::Error> {
        self.power.set_power(false).map_err(SerialModuleError::Power)
    }

    fn open(&mut self) -> Result<Self::Source, Self::Error> {
        debug!("Opening {} at {} baud", self.port_name, self.baud_rate);
        let source =
            SerialByteSource::new(&self.port_name, self.baud_rate).map_err(SerialModuleError::Serial)?;
        self.opened = true;
        Ok(source)
    }

    // The port itself is released when the reader drops its source.
    fn close(&mut self) -> Result<(), Self::Error> {
        self.opened = false;
        Ok(())
    }
}

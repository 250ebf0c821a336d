/// Raw byte channel of the LF module (serial port, USB bridge, ...).
pub trait ByteSource {
    /// Error type for read operations
    type Error: std::fmt::Debug;

    /// Read whatever bytes are available without blocking.
    ///
    /// Returns `Ok(0)` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Power rail of a subsystem
pub trait PowerRail {
    /// Error type for power operations
    type Error: std::fmt::Debug;

    /// Switch the rail on or off
    fn set_power(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// LF RFID module: power control plus an openable byte channel.
pub trait RfidModule {
    /// Byte channel handed to the background reader once opened
    type Source: ByteSource + Send + 'static;
    /// Error type for module operations
    type Error: std::fmt::Debug;

    /// Power the module on
    fn power_on(&mut self) -> Result<(), Self::Error>;

    /// Power the module off
    fn power_off(&mut self) -> Result<(), Self::Error>;

    /// Open the module's byte channel
    fn open(&mut self) -> Result<Self::Source, Self::Error>;

    /// Release the module's byte channel
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Barcode engine driver. Decoded barcodes arrive out of band and are fed to
/// [`crate::ModeArbiter::on_barcode_notification`].
pub trait BarcodeScanner {
    /// Error type for scanner operations
    type Error: std::fmt::Debug;

    /// Subscribe to hardware scan notifications
    fn register_notifications(&mut self) -> Result<(), Self::Error>;

    /// Unsubscribe from hardware scan notifications
    fn unregister_notifications(&mut self) -> Result<(), Self::Error>;

    /// Open the scan engine
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Arm the engine for the next trigger pull
    fn start_scan(&mut self) -> Result<(), Self::Error>;

    /// Disarm the engine
    fn stop_scan(&mut self) -> Result<(), Self::Error>;

    /// Close the scan engine
    fn close(&mut self) -> Result<(), Self::Error>;
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};

use crate::config::ScannerConfig;
use crate::reader::SerialReader;
use crate::sink::EventSink;
use crate::transport::{BarcodeScanner, RfidModule};
use crate::types::{DeviceState, Outcome, ScanEvent, ScanMode, ScannerError, Subsystem};

struct Hardware<R, B> {
    rfid: R,
    barcode: B,
}

struct State<R, B> {
    mode: ScanMode,
    rfid: DeviceState,
    barcode: DeviceState,
    auto_restart: bool,
    hardware: Option<Hardware<R, B>>,
    reader: Option<SerialReader>,
}

/// Arbitrates between barcode and RFID scanning.
///
/// At most one of the two subsystems is powered and open at any time.
/// Commands are serialized by a transition lock, so they never interleave;
/// the arbiter can be shared behind an `Arc` and driven from any thread.
///
/// The state lock is never held while calling the [`EventSink`] or joining
/// the reader thread, so a sink may query the arbiter from `publish`.
pub struct ModeArbiter<R: RfidModule, B: BarcodeScanner> {
    config: ScannerConfig,
    sink: Arc<dyn EventSink>,
    transitions: Mutex<()>,
    state: Mutex<State<R, B>>,
}

impl<R: RfidModule, B: BarcodeScanner> ModeArbiter<R, B> {
    /// Create an arbiter with no hardware attached. Decoded reads go to `sink`.
    pub fn new(config: ScannerConfig, sink: Arc<dyn EventSink>) -> Self {
        let state = State {
            mode: ScanMode::Idle,
            rfid: DeviceState::OFF,
            barcode: DeviceState::OFF,
            auto_restart: config.auto_restart,
            hardware: None,
            reader: None,
        };
        Self {
            config,
            sink,
            transitions: Mutex::new(()),
            state: Mutex::new(state),
        }
    }

    /// Install the hardware helpers for a session.
    ///
    /// Any previously attached hardware is shut down first.
    pub fn attach(&self, rfid: R, barcode: B) {
        let _transition = self.begin_transition();
        self.stop_reader();
        let mut state = self.lock();
        if state.hardware.is_some() {
            debug!("Replacing attached hardware");
            if let Err(e) = self.teardown(&mut state) {
                warn!("Error releasing previous hardware: {}", e);
            }
        }
        state.hardware = Some(Hardware { rfid, barcode });
        info!("Hardware attached");
    }

    /// Shut down whatever is active and release the hardware helpers.
    ///
    /// State is reset even when a close fails; the first failure is returned.
    pub fn detach(&self) -> Result<(), ScannerError> {
        let _transition = self.begin_transition();
        self.stop_reader();
        let mut state = self.lock();
        let result = self.teardown(&mut state);
        if state.hardware.take().is_some() {
            info!("Hardware detached");
        }
        result
    }

    pub fn is_attached(&self) -> bool {
        self.lock().hardware.is_some()
    }

    /// Power on the RFID module and start reading tags.
    ///
    /// Barcode scanning is stopped first if active.
    pub fn enable_rfid(&self) -> Result<Outcome, ScannerError> {
        let _transition = self.begin_transition();
        self.enable_rfid_locked(&mut self.lock())
    }

    /// Stop reading tags and power off the RFID module.
    pub fn disable_rfid(&self) -> Result<Outcome, ScannerError> {
        let _transition = self.begin_transition();
        self.stop_reader();
        self.disable_rfid_locked(&mut self.lock())
    }

    /// Open the barcode engine and arm it. RFID is disabled first if active.
    pub fn start_barcode_scan(&self) -> Result<Outcome, ScannerError> {
        let _transition = self.begin_transition();
        self.stop_reader();
        self.start_barcode_locked(&mut self.lock())
    }

    /// Disarm and close the barcode engine
    pub fn stop_barcode_scan(&self) -> Result<Outcome, ScannerError> {
        let _transition = self.begin_transition();
        self.stop_barcode_locked(&mut self.lock())
    }

    /// Toggle re-arming of the barcode engine after each read
    pub fn set_auto_restart(&self, enabled: bool) -> Outcome {
        self.lock().auto_restart = enabled;
        debug!("Auto restart set to {}", enabled);
        Outcome::AutoRestart(enabled)
    }

    pub fn auto_restart(&self) -> bool {
        self.lock().auto_restart
    }

    pub fn is_scanner_active(&self) -> bool {
        self.lock().mode == ScanMode::Barcode
    }

    pub fn is_rfid_active(&self) -> bool {
        self.lock().mode == ScanMode::Rfid
    }

    pub fn current_mode(&self) -> ScanMode {
        self.lock().mode
    }

    pub fn device_state(&self, subsystem: Subsystem) -> DeviceState {
        let state = self.lock();
        match subsystem {
            Subsystem::Rfid => state.rfid,
            Subsystem::Barcode => state.barcode,
        }
    }

    /// Handle a decoded barcode pushed by the scan engine.
    ///
    /// Returns `true` if the barcode was published. Notifications outside
    /// barcode mode, and empty payloads, are dropped.
    pub fn on_barcode_notification(&self, data: &[u8]) -> bool {
        let text = {
            let state = self.lock();
            if state.mode != ScanMode::Barcode {
                debug!("Ignoring barcode notification in mode {}", state.mode);
                return false;
            }
            barcode_text(data)
        };

        if text.is_empty() {
            debug!("Ignoring empty barcode notification");
            return false;
        }

        info!("Barcode scanned: {}", text);
        self.sink.publish(ScanEvent::Barcode(text));

        // The sink may have changed the mode while no lock was held.
        let _transition = self.begin_transition();
        let mut state = self.lock();
        if state.mode == ScanMode::Barcode && state.auto_restart {
            if let Some(hw) = state.hardware.as_mut() {
                if let Err(e) = hw.barcode.stop_scan() {
                    warn!("Failed to stop scan before re-arm: {:?}", e);
                }
                if let Err(e) = hw.barcode.start_scan() {
                    warn!("Failed to re-arm scanner: {:?}", e);
                }
            }
        }

        true
    }

    fn lock(&self) -> MutexGuard<'_, State<R, B>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_transition(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop and join the reader with the state lock released.
    ///
    /// Must run under the transition lock, before a transition that turns RFID off.
    fn stop_reader(&self) {
        let reader = self.lock().reader.take();
        if let Some(mut reader) = reader {
            if let Some(stats) = reader.stop() {
                debug!("Reader stopped: {:?}", stats);
            }
        }
    }

    fn enable_rfid_locked(&self, state: &mut State<R, B>) -> Result<Outcome, ScannerError> {
        if state.mode == ScanMode::Rfid {
            return Ok(Outcome::RfidAlreadyOn);
        }

        if state.hardware.is_none() {
            error!("RFID module is not initialized");
            return Err(ScannerError::NotInitialized(Subsystem::Rfid));
        }

        if state.mode == ScanMode::Barcode || state.barcode.is_active() {
            if let Err(e) = self.stop_barcode_locked(state) {
                warn!("Barcode scanner did not stop cleanly: {}", e);
            }
        }

        let Some(hw) = state.hardware.as_mut() else {
            return Err(ScannerError::NotInitialized(Subsystem::Rfid));
        };

        if let Err(e) = hw.rfid.power_on() {
            error!("Failed to power on RFID module: {:?}", e);
            return Err(ScannerError::Power(format!("{:?}", e)));
        }
        state.rfid.powered = true;

        let source = match hw.rfid.open() {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to open RFID module: {:?}", e);
                // If this fails the rail stays marked powered, and the next
                // disable or barcode start retries the power-off.
                if let Err(e) = hw.rfid.power_off() {
                    warn!("Failed to power off RFID module after open failure: {:?}", e);
                } else {
                    state.rfid.powered = false;
                }
                return Err(ScannerError::Open {
                    subsystem: Subsystem::Rfid,
                    reason: format!("{:?}", e),
                });
            }
        };

        let reader = match SerialReader::spawn(source, Arc::clone(&self.sink), &self.config) {
            Ok(reader) => reader,
            Err(e) => {
                error!("Failed to start RFID reader: {}", e);
                if let Err(e) = hw.rfid.close() {
                    warn!("Failed to close RFID module after reader failure: {:?}", e);
                }
                if let Err(e) = hw.rfid.power_off() {
                    warn!("Failed to power off RFID module after reader failure: {:?}", e);
                } else {
                    state.rfid.powered = false;
                }
                return Err(ScannerError::Open {
                    subsystem: Subsystem::Rfid,
                    reason: e.to_string(),
                });
            }
        };

        state.rfid.open = true;
        state.reader = Some(reader);
        state.mode = ScanMode::Rfid;
        info!("RFID module powered on");
        Ok(Outcome::RfidOn)
    }

    /// Close and power off whatever part of the RFID module is still up.
    ///
    /// The reader must already be stopped (see [`Self::stop_reader`]).
    fn disable_rfid_locked(&self, state: &mut State<R, B>) -> Result<Outcome, ScannerError> {
        if state.mode != ScanMode::Rfid && !state.rfid.is_active() {
            return Ok(Outcome::RfidOff);
        }

        let mut failure = None;
        if let Some(hw) = state.hardware.as_mut() {
            if state.rfid.open {
                if let Err(e) = hw.rfid.close() {
                    warn!("Failed to close RFID module: {:?}", e);
                    failure = Some(ScannerError::Close {
                        subsystem: Subsystem::Rfid,
                        reason: format!("{:?}", e),
                    });
                }
            }
            if state.rfid.powered {
                if let Err(e) = hw.rfid.power_off() {
                    warn!("Failed to power off RFID module: {:?}", e);
                    failure.get_or_insert(ScannerError::Power(format!("{:?}", e)));
                }
            }
        }

        // Software state is reset even if the hardware did not confirm.
        state.rfid = DeviceState::OFF;
        if state.mode == ScanMode::Rfid {
            state.mode = ScanMode::Idle;
        }
        info!("RFID module powered off");

        match failure {
            Some(e) => Err(e),
            None => Ok(Outcome::RfidOff),
        }
    }

    fn start_barcode_locked(&self, state: &mut State<R, B>) -> Result<Outcome, ScannerError> {
        if state.mode == ScanMode::Barcode {
            return Ok(Outcome::ScannerAlreadyOn);
        }

        if state.hardware.is_none() {
            error!("Barcode scanner is not initialized");
            return Err(ScannerError::NotInitialized(Subsystem::Barcode));
        }

        if state.mode == ScanMode::Rfid || state.rfid.is_active() {
            if let Err(e) = self.disable_rfid_locked(state) {
                warn!("RFID module did not shut down cleanly: {}", e);
            }
        }

        let Some(hw) = state.hardware.as_mut() else {
            return Err(ScannerError::NotInitialized(Subsystem::Barcode));
        };

        debug!("Starting barcode scanner");
        hw.barcode.register_notifications().map_err(|e| {
            error!("Failed to register for scan notifications: {:?}", e);
            ScannerError::Scanner(format!("{:?}", e))
        })?;

        if let Err(e) = hw.barcode.open() {
            error!("Failed to open barcode scanner: {:?}", e);
            if let Err(e) = hw.barcode.unregister_notifications() {
                warn!("Error unregistering scan notifications: {:?}", e);
            }
            return Err(ScannerError::Open {
                subsystem: Subsystem::Barcode,
                reason: format!("{:?}", e),
            });
        }

        if let Err(e) = hw.barcode.start_scan() {
            error!("Failed to start barcode scanner: {:?}", e);
            if let Err(e) = hw.barcode.close() {
                warn!("Failed to close barcode scanner: {:?}", e);
            }
            if let Err(e) = hw.barcode.unregister_notifications() {
                warn!("Error unregistering scan notifications: {:?}", e);
            }
            return Err(ScannerError::Scanner(format!("{:?}", e)));
        }

        state.barcode = DeviceState {
            powered: true,
            open: true,
        };
        state.mode = ScanMode::Barcode;
        info!("Scanner started");
        Ok(Outcome::ScannerStarted)
    }

    fn stop_barcode_locked(&self, state: &mut State<R, B>) -> Result<Outcome, ScannerError> {
        if state.mode != ScanMode::Barcode && !state.barcode.is_active() {
            return Ok(Outcome::ScannerAlreadyOff);
        }

        debug!("Stopping barcode scanner");
        let mut failure = None;
        if let Some(hw) = state.hardware.as_mut() {
            // May fail legitimately if the engine already dropped the subscription.
            if let Err(e) = hw.barcode.unregister_notifications() {
                warn!("Error unregistering scan notifications: {:?}", e);
            }
            if let Err(e) = hw.barcode.stop_scan() {
                warn!("Failed to stop barcode scan: {:?}", e);
                failure = Some(ScannerError::Scanner(format!("{:?}", e)));
            }
            if let Err(e) = hw.barcode.close() {
                warn!("Failed to close barcode scanner: {:?}", e);
                failure.get_or_insert(ScannerError::Close {
                    subsystem: Subsystem::Barcode,
                    reason: format!("{:?}", e),
                });
            }
        }

        state.barcode = DeviceState::OFF;
        if state.mode == ScanMode::Barcode {
            state.mode = ScanMode::Idle;
        }
        info!("Scanner stopped");

        match failure {
            Some(e) => Err(e),
            None => Ok(Outcome::ScannerStopped),
        }
    }

    fn teardown(&self, state: &mut State<R, B>) -> Result<(), ScannerError> {
        let barcode = self.stop_barcode_locked(state);
        let rfid = self.disable_rfid_locked(state);
        barcode.and(rfid).map(|_| ())
    }
}

impl<R: RfidModule, B: BarcodeScanner> Drop for ModeArbiter<R, B> {
    fn drop(&mut self) {
        self.stop_reader();
        let mut state = self.lock();
        if let Err(e) = self.teardown(&mut state) {
            warn!("Error shutting down scanner: {}", e);
        }
    }
}

/// Barcode bytes as text, without the trailing line terminator
fn barcode_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

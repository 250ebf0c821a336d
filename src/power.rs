//! Power rail driven through a GPIO control file

use std::path::{Path, PathBuf};

use log::debug;

use crate::transport::PowerRail;

/// Writes `1` / `0` to a kernel GPIO control file (e.g. `/proc/gpiocontrol/set_uhf`).
pub struct GpioPowerRail {
    path: PathBuf,
}

impl GpioPowerRail {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PowerRail for GpioPowerRail {
    type Error = std::io::Error;

    fn set_power(&mut self, on: bool) -> Result<(), Self::Error> {
        let value = if on { "1" } else { "0" };
        debug!("Writing {} to {}", value, self.path.display());
        std::fs::write(&self.path, value)
    }
}

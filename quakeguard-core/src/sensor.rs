//! Accelerometer input
//!
//! Drivers report readings through a non-blocking pull interface. A driver
//! wired to the sensor's data-ready interrupt returns `WouldBlock` until the
//! interrupt fires; a polled driver simply always returns `Ok`.
//!
//! ```rust
//! use quakeguard_core::{AccelReading, AccelerometerSource};
//!
//! struct AtRest;
//!
//! impl AccelerometerSource for AtRest {
//!     type Error = core::convert::Infallible;
//!
//!     fn read(&mut self) -> nb::Result<AccelReading, Self::Error> {
//!         Ok(AccelReading::new(0.0, 0.0, 9.81))
//!     }
//! }
//! ```

use crate::event::AccelReading;

/// Three-axis accelerometer (m/s²)
pub trait AccelerometerSource {
    /// Driver error type
    type Error: core::fmt::Debug;

    /// Read one sample
    ///
    /// - `Ok(reading)`: a new sample
    /// - `Err(nb::Error::WouldBlock)`: no new data yet, try again next tick
    /// - `Err(nb::Error::Other(e))`: bus or device fault
    fn read(&mut self) -> nb::Result<AccelReading, Self::Error>;
}

/// Replays a fixed sequence of readings, then reports `WouldBlock`
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    readings: alloc::vec::Vec<AccelReading>,
    position: usize,
}

impl ReplaySource {
    /// Replay `readings` in order
    pub fn new(readings: alloc::vec::Vec<AccelReading>) -> Self {
        Self { readings, position: 0 }
    }

    /// Readings not yet consumed
    pub fn remaining(&self) -> usize {
        self.readings.len() - self.position
    }
}

impl AccelerometerSource for ReplaySource {
    type Error = core::convert::Infallible;

    fn read(&mut self) -> nb::Result<AccelReading, Self::Error> {
        match self.readings.get(self.position) {
            Some(reading) => {
                self.position += 1;
                Ok(*reading)
            }
            None => Err(nb::Error::WouldBlock),
        }
    }
}

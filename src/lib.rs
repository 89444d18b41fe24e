//! # TMD2771 Proximity and Ambient Light Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the TAOS/ams TMD2771 proximity and ambient
//! light sensor, built using the [`embedded-hal`] traits for I2C communication.
//!
//! The TMD2771 provides:
//! - A proximity channel driven by an integrated IR LED (raw 16-bit counts)
//! - Two ALS photodiode channels (visible+IR and IR only)
//! - Programmable ALS gain (1x, 8x, 16x, 120x)
//! - Programmable ALS integration time (2.72 ms to 696 ms)
//! - I2C interface (address 0x39)
//!
//! ## Features
//!
//! - **Fixed operating profile** from the vendor application note via [`Tmd2771::start`]
//! - **Lux calculation** that reads gain and integration time back from the device
//! - **Raw register access** for anything not covered by the high-level API
//! - **Structured diagnostics** through a caller-supplied [`DebugSink`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tmd2771::{Tmd2771, DEFAULT_I2C_ADDRESS};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut sensor = Tmd2771::new(i2c, DEFAULT_I2C_ADDRESS).unwrap();
//!
//! if !sensor.is_ready() {
//!     // Unknown id: opt in explicitly if this is a compatible variant
//!     sensor.assume_ready();
//! }
//!
//! sensor.start().unwrap();
//!
//! // Wait at least one integration cycle
//! // std::thread::sleep(std::time::Duration::from_millis(150));
//!
//! let distance = sensor.get_distance().unwrap();
//! let light = sensor.get_ambient_light().unwrap();
//! // println!("Proximity: {}, Light: {:.1} lux", distance.counts, light.lux);
//!
//! sensor.stop().unwrap();
//! # }
//! ```
//!
//! ## Diagnostics
//!
//! Construct with [`Tmd2771::new_with_sink`] to receive [`DebugEvent`]s: write
//! verification, the decoded start-up profile, power-off confirmation, and fallbacks
//! for unrecognized register values. With the `log` feature, [`LogSink`] forwards them
//! to the `log` facade.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

use embedded_hal::i2c::I2c;

mod debug;
mod settings;

#[cfg(feature = "log")]
pub use debug::LogSink;
pub use debug::{DebugEvent, DebugSink, SettingsSnapshot};
pub use settings::{
    AlsGain, EnableFlags, IntegrationTime, LedDrive, ProxDiode, Status, WaitTime,
    PROX_TIME_2_72MS,
};

/// Default I2C address of the TMD2771
pub const DEFAULT_I2C_ADDRESS: u8 = 0x39;

/// Device id codes of the supported models
pub const KNOWN_MODEL_IDS: [u8; 2] = [Model::Tmd27711 as u8, Model::Tmd27713 as u8];

/// Surface scaling factor for a sensor mounted in open air
pub const OPEN_AIR_SCALING: f32 = 1.0;

/// Proximity pulses per cycle in the start-up profile
pub const DEFAULT_PROX_PULSES: u8 = 4;

/// Register addresses
///
/// Addresses include the command bit and auto-increment protocol bits (0xA0), so the
/// two-byte data registers can be read in a single transaction from their low byte.
pub mod register {
    /// Enable states and interrupts
    pub const ENABLE: u8 = 0xA0;
    /// ALS integration time
    pub const ALS_TIME: u8 = 0xA1;
    /// Proximity integration time
    pub const PROX_TIME: u8 = 0xA2;
    /// Wait time
    pub const WAIT_TIME: u8 = 0xA3;
    /// ALS interrupt low threshold, low byte
    pub const ALS_INT_LOW_THRESH: u8 = 0xA4;
    /// ALS interrupt high threshold, low byte
    pub const ALS_INT_HIGH_THRESH: u8 = 0xA6;
    /// Proximity interrupt low threshold, low byte
    pub const PROX_INT_LOW_THRESH: u8 = 0xA8;
    /// Proximity interrupt high threshold, low byte
    pub const PROX_INT_HIGH_THRESH: u8 = 0xAA;
    /// Interrupt persistence filters
    pub const PERSISTENCE: u8 = 0xAC;
    /// Configuration (WLONG)
    pub const CONFIGURATION: u8 = 0xAD;
    /// Proximity pulse count
    pub const PROX_PULSE_COUNT: u8 = 0xAE;
    /// Gain and LED control
    pub const CONTROL: u8 = 0xAF;
    /// Device identification
    pub const DEVICE_ID: u8 = 0xB2;
    /// Device status
    pub const DEVICE_STATUS: u8 = 0xB3;
    /// ALS channel 0 data, low byte
    pub const ALS_CH0_DATA: u8 = 0xB4;
    /// ALS channel 1 data, low byte
    pub const ALS_CH1_DATA: u8 = 0xB6;
    /// Proximity data, low byte
    pub const PROX_DATA: u8 = 0xB8;
}

/// WLONG bit of CONFIGURATION
const CONFIGURATION_WLONG: u8 = 0x02;

/// Known device variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Model {
    /// TMD27711, I2C bus referenced to VDD
    Tmd27711 = 0x20,
    /// TMD27713, I2C bus at 1.8 V
    Tmd27713 = 0x29,
}

impl Model {
    /// Look up the model for a DEVICE_ID value
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x20 => Some(Self::Tmd27711),
            0x29 => Some(Self::Tmd27713),
            _ => None,
        }
    }
}

/// Proximity measurement
///
/// Raw count, higher for closer reflective objects. Not calibrated to a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ProximityReading {
    /// Raw proximity count
    pub counts: u16,
}

/// Ambient light measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct AmbientLightReading {
    /// Channel 0 (visible + IR) raw count
    pub ch0: u16,
    /// Channel 1 (IR) raw count
    pub ch1: u16,
    /// Gain used for the conversion
    pub gain: AlsGain,
    /// Integration time used for the conversion
    pub integration_time: IntegrationTime,
    /// Illuminance in lux, never negative
    pub lux: f32,
}

/// Result of a single read
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Measurement {
    /// Proximity reading
    Proximity(ProximityReading),
    /// Ambient light reading
    AmbientLight(AmbientLightReading),
}

impl From<ProximityReading> for Measurement {
    fn from(reading: ProximityReading) -> Self {
        Self::Proximity(reading)
    }
}

impl From<AmbientLightReading> for Measurement {
    fn from(reading: AmbientLightReading) -> Self {
        Self::AmbientLight(reading)
    }
}

/// All possible errors in this crate
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// DEVICE_ID did not match a known model
    IdentificationMismatch {
        /// Value found in DEVICE_ID
        found: u8,
    },
    /// Identification failed and the caller has not opted in with `assume_ready()`
    NotReady,
}

/// Convert raw ALS counts to lux
///
/// Uses the vendor's two-segment approximation and takes the larger result, clamped at
/// zero so noise at low light never yields a negative value.
pub fn lux_from_counts(ch0: u16, ch1: u16, gain: AlsGain, time: IntegrationTime) -> f32 {
    let counts_per_lux = time.millis() * gain.multiplier() as f32 / (OPEN_AIR_SCALING * 24.0);
    let ch0 = ch0 as f32;
    let ch1 = ch1 as f32;

    let lux1 = (ch0 - 2.0 * ch1) / counts_per_lux;
    let lux2 = (0.6 * ch0 - ch1) / counts_per_lux;

    lux1.max(lux2).max(0.0)
}

/// High-level TMD2771 driver
pub struct Tmd2771<I2C, Sink = ()> {
    i2c: I2C,
    address: u8,
    sink: Sink,
    debug: bool,
    ready: bool,
    model_id: u8,
}

impl<I2C, E> Tmd2771<I2C, ()>
where
    I2C: I2c<Error = E>,
{
    /// Create a driver and identify the device, with diagnostics disabled
    ///
    /// An unknown device id is not an error here; check [`is_ready`](Self::is_ready).
    pub fn new(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
        Self::connect(i2c, address, (), false)
    }
}

impl<I2C, E, Sink> Tmd2771<I2C, Sink>
where
    I2C: I2c<Error = E>,
    Sink: DebugSink,
{
    /// Create a driver and identify the device, reporting diagnostics to `sink`
    pub fn new_with_sink(i2c: I2C, address: u8, sink: Sink) -> Result<Self, Error<E>> {
        Self::connect(i2c, address, sink, true)
    }

    fn connect(i2c: I2C, address: u8, sink: Sink, debug: bool) -> Result<Self, Error<E>> {
        let mut sensor = Self {
            i2c,
            address,
            sink,
            debug,
            ready: false,
            model_id: 0,
        };

        sensor.model_id = sensor.read_register(register::DEVICE_ID)?;
        sensor.ready = Model::from_id(sensor.model_id).is_some();
        sensor.report(DebugEvent::Identified {
            model_id: sensor.model_id,
            known: sensor.ready,
        });

        Ok(sensor)
    }

    /// True if the device id matched a known model or [`assume_ready`](Self::assume_ready)
    /// was called
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// DEVICE_ID value read at construction
    pub fn model_id(&self) -> u8 {
        self.model_id
    }

    /// Model detected at construction
    pub fn model(&self) -> Result<Model, Error<E>> {
        Model::from_id(self.model_id).ok_or(Error::IdentificationMismatch {
            found: self.model_id,
        })
    }

    /// Re-read DEVICE_ID and update readiness
    pub fn identify(&mut self) -> Result<Model, Error<E>> {
        self.model_id = self.read_register(register::DEVICE_ID)?;
        self.ready = Model::from_id(self.model_id).is_some();
        self.report(DebugEvent::Identified {
            model_id: self.model_id,
            known: self.ready,
        });
        self.model()
    }

    /// Use the device even though its id is unknown
    pub fn assume_ready(&mut self) {
        self.ready = true;
    }

    /// Enable or disable diagnostics
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// I2C address of the device
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Program the default operating profile and power the device on
    ///
    /// ALS 101 ms, proximity 2.72 ms, 4 pulses, 100 % LED drive on diode CH1, gain 1x,
    /// then every enable bit.
    pub fn start(&mut self) -> Result<(), Error<E>> {
        self.ensure_ready()?;

        self.write_register(register::ALS_TIME, IntegrationTime::Ms101.raw())?;
        // Changing the proximity integration time is unsupported by the device
        self.write_register(register::PROX_TIME, PROX_TIME_2_72MS)?;
        self.write_register(register::PROX_PULSE_COUNT, DEFAULT_PROX_PULSES)?;
        self.write_register(
            register::CONTROL,
            LedDrive::Percent100.bits() | ProxDiode::Ch1.bits() | AlsGain::X1.bits(),
        )?;
        self.write_register(
            register::ENABLE,
            EnableFlags::PIEN
                | EnableFlags::AIEN
                | EnableFlags::WEN
                | EnableFlags::PEN
                | EnableFlags::AEN
                | EnableFlags::PON,
        )?;

        if self.debug {
            let snapshot = self.read_settings()?;
            self.report(DebugEvent::Settings(snapshot));
        }

        Ok(())
    }

    /// Power everything off
    pub fn stop(&mut self) -> Result<(), Error<E>> {
        self.write_register(register::ENABLE, 0x00)?;

        if self.debug {
            let enable = self.read_register(register::ENABLE)?;
            self.report(DebugEvent::PowerOff {
                powered_down: enable & EnableFlags::PON == 0,
            });
        }

        Ok(())
    }

    /// Read the raw proximity count
    pub fn get_distance(&mut self) -> Result<ProximityReading, Error<E>> {
        self.ensure_ready()?;
        let counts = self.read_register16(register::PROX_DATA)?;
        Ok(ProximityReading { counts })
    }

    /// Read both ALS channels and convert to lux
    ///
    /// Gain and integration time are read back from the device every time so that the
    /// conversion stays correct if they were changed elsewhere.
    pub fn get_ambient_light(&mut self) -> Result<AmbientLightReading, Error<E>> {
        self.ensure_ready()?;

        let ch0 = self.read_register16(register::ALS_CH0_DATA)?;
        let ch1 = self.read_register16(register::ALS_CH1_DATA)?;

        let control = self.read_register(register::CONTROL)?;
        let gain_bits = control & AlsGain::MASK;
        let gain = match AlsGain::from_bits(gain_bits) {
            Some(gain) => gain,
            None => {
                self.report(DebugEvent::UnrecognizedEncoding {
                    register: register::CONTROL,
                    raw: gain_bits,
                });
                AlsGain::default()
            }
        };

        let time_raw = self.read_register(register::ALS_TIME)?;
        let integration_time = match IntegrationTime::from_raw(time_raw) {
            Some(time) => time,
            None => {
                self.report(DebugEvent::UnrecognizedEncoding {
                    register: register::ALS_TIME,
                    raw: time_raw,
                });
                IntegrationTime::default()
            }
        };

        Ok(AmbientLightReading {
            ch0,
            ch1,
            gain,
            integration_time,
            lux: lux_from_counts(ch0, ch1, gain, integration_time),
        })
    }

    /// Set the ALS gain, keeping the other CONTROL fields
    pub fn set_als_gain(&mut self, gain: AlsGain) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        let control = self.read_register(register::CONTROL)?;
        self.write_register(register::CONTROL, (control & !AlsGain::MASK) | gain.bits())
    }

    /// Set the ALS integration time
    pub fn set_als_integration_time(&mut self, time: IntegrationTime) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.write_register(register::ALS_TIME, time.raw())
    }

    /// Set the wait time between cycles; `long` multiplies it by 12
    pub fn set_wait_time(&mut self, wait: WaitTime, long: bool) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.write_register(register::WAIT_TIME, wait.raw())?;

        let mut config = self.read_register(register::CONFIGURATION)?;
        if long {
            config |= CONFIGURATION_WLONG;
        } else {
            config &= !CONFIGURATION_WLONG;
        }
        self.write_register(register::CONFIGURATION, config)
    }

    /// Read and decode DEVICE_STATUS
    pub fn status(&mut self) -> Result<Status, Error<E>> {
        let status = self.read_register(register::DEVICE_STATUS)?;
        Ok(Status::from_raw(status))
    }

    /// Read back the operating registers programmed by [`start`](Self::start)
    ///
    /// Reads only; device state is not modified.
    pub fn read_settings(&mut self) -> Result<SettingsSnapshot, Error<E>> {
        let als_time_raw = self.read_register(register::ALS_TIME)?;
        let prox_time_raw = self.read_register(register::PROX_TIME)?;
        let prox_pulse_count = self.read_register(register::PROX_PULSE_COUNT)?;
        let control = self.read_register(register::CONTROL)?;
        let enable = self.read_register(register::ENABLE)?;

        Ok(SettingsSnapshot {
            als_time_raw,
            als_time: IntegrationTime::from_raw(als_time_raw),
            prox_time_raw,
            prox_pulse_count,
            led_drive: LedDrive::from_control(control),
            prox_diode: ProxDiode::from_control(control),
            gain: AlsGain::from_bits_or_default(control & AlsGain::MASK),
            enable: EnableFlags::from_raw(enable),
        })
    }

    /// Read a single register
    pub fn read_register(&mut self, address: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[address], &mut buffer)
            .map_err(Error::I2c)?;
        Ok(buffer[0])
    }

    /// Read a little-endian register pair starting at its low byte
    pub fn read_register16(&mut self, address: u8) -> Result<u16, Error<E>> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[address], &mut buffer)
            .map_err(Error::I2c)?;
        Ok(u16::from_le_bytes(buffer))
    }

    /// Write a single register
    ///
    /// With debug enabled the register is read back and compared. The comparison is
    /// advisory and never fails the write.
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &[address, value])
            .map_err(Error::I2c)?;

        if self.debug {
            let read_back = self.read_register(address)?;
            self.report(DebugEvent::WriteCheck {
                register: address,
                written: value as u16,
                read_back: read_back as u16,
            });
        }

        Ok(())
    }

    /// Write a register pair, low byte first
    pub fn write_register16(&mut self, address: u8, value: u16) -> Result<(), Error<E>> {
        let [low, high] = value.to_le_bytes();
        self.i2c
            .write(self.address, &[address, low, high])
            .map_err(Error::I2c)?;

        if self.debug {
            let read_back = self.read_register16(address)?;
            self.report(DebugEvent::WriteCheck {
                register: address,
                written: value,
                read_back,
            });
        }

        Ok(())
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    fn ensure_ready(&self) -> Result<(), Error<E>> {
        if self.ready {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    fn report(&mut self, event: DebugEvent) {
        if self.debug {
            self.sink.record(event);
        }
    }
}

//! Structured diagnostics
//!
//! The driver reports what it verified or inferred as [`DebugEvent`]s handed to a
//! caller-supplied [`DebugSink`]. Nothing is emitted unless debug is enabled on the driver.

use crate::settings::{AlsGain, EnableFlags, IntegrationTime, LedDrive, ProxDiode};

/// Device settings read back after `start()`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct SettingsSnapshot {
    /// Raw ALS_TIME value
    pub als_time_raw: u8,
    /// Decoded ALS integration time, `None` if not a tabulated value
    pub als_time: Option<IntegrationTime>,
    /// Raw PROX_TIME value
    pub prox_time_raw: u8,
    /// Proximity pulse count
    pub prox_pulse_count: u8,
    /// LED drive strength
    pub led_drive: LedDrive,
    /// Proximity diode selection
    pub prox_diode: ProxDiode,
    /// ALS gain
    pub gain: AlsGain,
    /// Enable bits
    pub enable: EnableFlags,
}

/// Diagnostic event produced by the driver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum DebugEvent {
    /// DEVICE_ID was read during construction
    Identified {
        /// Value of the identification register
        model_id: u8,
        /// True if the id is one of the known models
        known: bool,
    },
    /// A register was written and read back
    ///
    /// A mismatch is advisory only: status bits may change on their own.
    WriteCheck {
        /// Register address
        register: u8,
        /// Value written
        written: u16,
        /// Value read back
        read_back: u16,
    },
    /// Operating profile decoded from readback after `start()`
    Settings(SettingsSnapshot),
    /// ENABLE was read back after `stop()`
    PowerOff {
        /// True if the PON bit is clear
        powered_down: bool,
    },
    /// A register held a value outside the lookup table and a default was used
    UnrecognizedEncoding {
        /// Register address
        register: u8,
        /// Value found
        raw: u8,
    },
}

impl DebugEvent {
    /// True for events that indicate something unexpected
    pub fn is_warning(&self) -> bool {
        match self {
            Self::Identified { known, .. } => !known,
            Self::WriteCheck {
                written, read_back, ..
            } => written != read_back,
            Self::PowerOff { powered_down } => !powered_down,
            Self::UnrecognizedEncoding { .. } => true,
            Self::Settings(_) => false,
        }
    }
}

/// Receiver for [`DebugEvent`]s
pub trait DebugSink {
    /// Record a single event
    fn record(&mut self, event: DebugEvent);
}

/// Discards every event
impl DebugSink for () {
    fn record(&mut self, _event: DebugEvent) {}
}

impl<S: DebugSink + ?Sized> DebugSink for &mut S {
    fn record(&mut self, event: DebugEvent) {
        (**self).record(event)
    }
}

/// Forwards events to the [`log`] facade
///
/// Warnings go to `warn!`, everything else to `debug!`.
#[cfg(feature = "log")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[cfg(feature = "log")]
impl DebugSink for LogSink {
    fn record(&mut self, event: DebugEvent) {
        let level = if event.is_warning() {
            log::Level::Warn
        } else {
            log::Level::Debug
        };
        match event {
            DebugEvent::Identified { model_id, known } => {
                log::log!(level, "device id 0x{:02X} (known model: {})", model_id, known)
            }
            DebugEvent::WriteCheck {
                register,
                written,
                read_back,
            } => log::log!(
                level,
                "write 0x{:02X}: wrote 0x{:04X}, read back 0x{:04X}",
                register,
                written,
                read_back
            ),
            DebugEvent::Settings(s) => log::log!(
                level,
                "als time 0x{:02X} ({:?}), prox time 0x{:02X}, pulses {}, led {:?}, diode {:?}, gain {:?}, enable {:?}",
                s.als_time_raw,
                s.als_time,
                s.prox_time_raw,
                s.prox_pulse_count,
                s.led_drive,
                s.prox_diode,
                s.gain,
                s.enable
            ),
            DebugEvent::PowerOff { powered_down } => {
                log::log!(level, "power off confirmed: {}", powered_down)
            }
            DebugEvent::UnrecognizedEncoding { register, raw } => log::log!(
                level,
                "register 0x{:02X} holds unrecognized value 0x{:02X}, using default",
                register,
                raw
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_classification() {
        assert!(DebugEvent::Identified {
            model_id: 0x55,
            known: false
        }
        .is_warning());
        assert!(!DebugEvent::WriteCheck {
            register: 0xA0,
            written: 0x3F,
            read_back: 0x3F
        }
        .is_warning());
        assert!(DebugEvent::WriteCheck {
            register: 0xA0,
            written: 0x3F,
            read_back: 0x3E
        }
        .is_warning());
        assert!(DebugEvent::PowerOff {
            powered_down: false
        }
        .is_warning());
    }
}

//! Encoded register settings and their lookup tables
//!
//! Every setting maps to the byte (or bit field) the device stores and back. Decoding is
//! partial (`from_bits` / `from_raw` return `None` for unknown bytes); the `*_or_default`
//! variants are what the driver uses when interpreting readback.

/// ALS analog gain, stored in bits 1:0 of the CONTROL register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AlsGain {
    /// 1x gain
    #[default]
    X1 = 0b00,
    /// 8x gain
    X8 = 0b01,
    /// 16x gain
    X16 = 0b10,
    /// 120x gain
    X120 = 0b11,
}

impl AlsGain {
    /// Mask of the gain field within CONTROL
    pub const MASK: u8 = 0x03;

    /// Control register bit pattern for this gain
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode a gain field, `None` if `bits` has anything outside the field set
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Self::X1),
            0b01 => Some(Self::X8),
            0b10 => Some(Self::X16),
            0b11 => Some(Self::X120),
            _ => None,
        }
    }

    /// Decode a gain field, falling back to 1x
    pub fn from_bits_or_default(bits: u8) -> Self {
        Self::from_bits(bits).unwrap_or_default()
    }

    /// Amplification factor
    pub const fn multiplier(self) -> u8 {
        match self {
            Self::X1 => 1,
            Self::X8 => 8,
            Self::X16 => 16,
            Self::X120 => 120,
        }
    }

    /// Look up a gain by its amplification factor
    pub const fn from_multiplier(multiplier: u8) -> Option<Self> {
        match multiplier {
            1 => Some(Self::X1),
            8 => Some(Self::X8),
            16 => Some(Self::X16),
            120 => Some(Self::X120),
            _ => None,
        }
    }
}

/// ALS integration time, stored as the whole ALS_TIME register
///
/// The device counts `256 - ATIME` cycles of 2.72 ms, so longer times have smaller
/// register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 2.72 ms (1 cycle)
    #[default]
    Ms2_72 = 0xFF,
    /// 27.2 ms (10 cycles)
    Ms27_2 = 0xF6,
    /// 101 ms (37 cycles)
    Ms101 = 0xDB,
    /// 174 ms (64 cycles)
    Ms174 = 0xC0,
    /// 696 ms (256 cycles), power-on default of the device
    Ms696 = 0x00,
}

impl IntegrationTime {
    /// ALS_TIME register value
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Decode an ALS_TIME value, `None` unless it is one of the tabulated settings
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0xFF => Some(Self::Ms2_72),
            0xF6 => Some(Self::Ms27_2),
            0xDB => Some(Self::Ms101),
            0xC0 => Some(Self::Ms174),
            0x00 => Some(Self::Ms696),
            _ => None,
        }
    }

    /// Decode an ALS_TIME value, falling back to 2.72 ms
    pub fn from_raw_or_default(raw: u8) -> Self {
        Self::from_raw(raw).unwrap_or_default()
    }

    /// Integration time in milliseconds
    pub const fn millis(self) -> f32 {
        match self {
            Self::Ms2_72 => 2.72,
            Self::Ms27_2 => 27.2,
            Self::Ms101 => 101.0,
            Self::Ms174 => 174.0,
            Self::Ms696 => 696.0,
        }
    }

    /// Look up a tabulated integration time by its length in milliseconds
    pub fn from_millis(millis: f32) -> Option<Self> {
        [
            Self::Ms2_72,
            Self::Ms27_2,
            Self::Ms101,
            Self::Ms174,
            Self::Ms696,
        ]
        .into_iter()
        .find(|time| time.millis() == millis)
    }
}

/// Proximity integration time register value; the application note only supports 2.72 ms
pub const PROX_TIME_2_72MS: u8 = 0xFF;

/// Wait time between measurement cycles (WAIT_TIME register)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum WaitTime {
    /// 2.72 ms, 32 ms with WLONG
    Ms2_72 = 0xFF,
    /// 200 ms, 2.4 s with WLONG
    Ms200 = 0xB6,
    /// 700 ms, 8.3 s with WLONG
    Ms700 = 0x00,
}

impl WaitTime {
    /// WAIT_TIME register value
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// IR LED drive strength, bits 7:6 of CONTROL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum LedDrive {
    /// 100 mA
    Percent100 = 0b00,
    /// 50 mA
    Percent50 = 0b01,
    /// 25 mA
    Percent25 = 0b10,
    /// 12.5 mA
    Percent12_5 = 0b11,
}

impl LedDrive {
    const SHIFT: u8 = 6;

    /// Bits as positioned in CONTROL
    pub const fn bits(self) -> u8 {
        (self as u8) << Self::SHIFT
    }

    /// Extract the drive strength from a CONTROL value
    pub const fn from_control(control: u8) -> Self {
        match (control >> Self::SHIFT) & 0x03 {
            0b00 => Self::Percent100,
            0b01 => Self::Percent50,
            0b10 => Self::Percent25,
            _ => Self::Percent12_5,
        }
    }
}

/// Photodiode(s) used for proximity, bits 5:4 of CONTROL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ProxDiode {
    /// No diode selected
    None = 0b00,
    /// Channel 0 diode
    Ch0 = 0b01,
    /// Channel 1 diode
    Ch1 = 0b10,
    /// Both diodes
    Both = 0b11,
}

impl ProxDiode {
    const SHIFT: u8 = 4;

    /// Bits as positioned in CONTROL
    pub const fn bits(self) -> u8 {
        (self as u8) << Self::SHIFT
    }

    /// Extract the diode selection from a CONTROL value
    pub const fn from_control(control: u8) -> Self {
        match (control >> Self::SHIFT) & 0x03 {
            0b00 => Self::None,
            0b01 => Self::Ch0,
            0b10 => Self::Ch1,
            _ => Self::Both,
        }
    }
}

/// Decoded ENABLE register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct EnableFlags {
    /// Proximity interrupt enable (PIEN)
    pub prox_interrupt: bool,
    /// ALS interrupt enable (AIEN)
    pub als_interrupt: bool,
    /// Wait timer enable (WEN)
    pub wait: bool,
    /// Proximity enable (PEN)
    pub prox: bool,
    /// ALS enable (AEN)
    pub als: bool,
    /// Internal oscillator on (PON)
    pub power_on: bool,
}

impl EnableFlags {
    /// PIEN
    pub const PIEN: u8 = 0x20;
    /// AIEN
    pub const AIEN: u8 = 0x10;
    /// WEN
    pub const WEN: u8 = 0x08;
    /// PEN
    pub const PEN: u8 = 0x04;
    /// AEN
    pub const AEN: u8 = 0x02;
    /// PON
    pub const PON: u8 = 0x01;

    /// Decode an ENABLE value
    pub const fn from_raw(raw: u8) -> Self {
        Self {
            prox_interrupt: raw & Self::PIEN != 0,
            als_interrupt: raw & Self::AIEN != 0,
            wait: raw & Self::WEN != 0,
            prox: raw & Self::PEN != 0,
            als: raw & Self::AEN != 0,
            power_on: raw & Self::PON != 0,
        }
    }

    /// Encode to an ENABLE value
    pub const fn raw(&self) -> u8 {
        let mut raw = 0;
        if self.prox_interrupt {
            raw |= Self::PIEN;
        }
        if self.als_interrupt {
            raw |= Self::AIEN;
        }
        if self.wait {
            raw |= Self::WEN;
        }
        if self.prox {
            raw |= Self::PEN;
        }
        if self.als {
            raw |= Self::AEN;
        }
        if self.power_on {
            raw |= Self::PON;
        }
        raw
    }
}

/// Decoded DEVICE_STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Status {
    /// Proximity interrupt asserted
    pub prox_interrupt: bool,
    /// ALS interrupt asserted
    pub als_interrupt: bool,
    /// ALS channels completed an integration cycle
    pub als_valid: bool,
}

impl Status {
    /// Decode a DEVICE_STATUS value
    pub const fn from_raw(raw: u8) -> Self {
        Self {
            prox_interrupt: raw & 0x20 != 0,
            als_interrupt: raw & 0x10 != 0,
            als_valid: raw & 0x01 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_round_trip() {
        for multiplier in [1u8, 8, 16, 120] {
            let gain = AlsGain::from_multiplier(multiplier).unwrap();
            assert_eq!(AlsGain::from_bits(gain.bits()), Some(gain));
            assert_eq!(gain.multiplier(), multiplier);
        }
    }

    #[test]
    fn test_time_round_trip() {
        for millis in [2.72f32, 27.2, 101.0, 174.0, 696.0] {
            let time = IntegrationTime::from_millis(millis).unwrap();
            assert_eq!(IntegrationTime::from_raw(time.raw()), Some(time));
            assert_eq!(time.millis(), millis);
        }
    }

    #[test]
    fn test_unknown_encodings_fall_back() {
        assert_eq!(AlsGain::from_bits(0x07), None);
        assert_eq!(AlsGain::from_bits_or_default(0x07), AlsGain::X1);
        assert_eq!(IntegrationTime::from_raw(0x42), None);
        assert_eq!(
            IntegrationTime::from_raw_or_default(0x42),
            IntegrationTime::Ms2_72
        );
        assert_eq!(AlsGain::from_multiplier(20), None);
        assert_eq!(IntegrationTime::from_millis(100.0), None);
    }

    #[test]
    fn test_control_fields() {
        let control = LedDrive::Percent100.bits() | ProxDiode::Ch1.bits() | AlsGain::X1.bits();
        assert_eq!(control, 0x20);
        assert_eq!(LedDrive::from_control(0xC0), LedDrive::Percent12_5);
        assert_eq!(ProxDiode::from_control(control), ProxDiode::Ch1);
        assert_eq!(AlsGain::from_bits(0xE3 & AlsGain::MASK), Some(AlsGain::X120));
    }

    #[test]
    fn test_enable_flags() {
        let all = EnableFlags::from_raw(0x3F);
        assert!(all.prox_interrupt && all.als_interrupt && all.wait);
        assert!(all.prox && all.als && all.power_on);
        assert_eq!(all.raw(), 0x3F);
        assert_eq!(EnableFlags::from_raw(0x00), EnableFlags::default());
    }

    #[test]
    fn test_status() {
        let status = Status::from_raw(0x31);
        assert!(status.prox_interrupt);
        assert!(status.als_interrupt);
        assert!(status.als_valid);
        assert!(!Status::from_raw(0x00).als_valid);
    }
}

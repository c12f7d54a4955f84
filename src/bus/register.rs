/// Register address map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    DeviceId = 0x00,
    /// Major then minor
    FirmwareVersion = 0x01,
    Status = 0x02,
    ModMask = 0x03,
    FifoCount = 0x04,
    /// Type, code, modifier mask, timestamp low
    FifoPop = 0x05,
    CfgFlags = 0x06,
    Cursor = 0x07,
    LedState = 0x08,
    /// Low byte of the scan rate in Hz
    ScanRate = 0x09,
    /// Bits 16..31 of the microsecond clock, little-endian
    ClockHigh = 0x0A,
}

impl Register {
    pub fn from_address(address: u8) -> Option<Self> {
        match address {
            0x00 => Some(Register::DeviceId),
            0x01 => Some(Register::FirmwareVersion),
            0x02 => Some(Register::Status),
            0x03 => Some(Register::ModMask),
            0x04 => Some(Register::FifoCount),
            0x05 => Some(Register::FifoPop),
            0x06 => Some(Register::CfgFlags),
            0x07 => Some(Register::Cursor),
            0x08 => Some(Register::LedState),
            0x09 => Some(Register::ScanRate),
            0x0A => Some(Register::ClockHigh),
            _ => None,
        }
    }

    /// Bytes served before the pointer moves to the next address
    pub fn width(self) -> u8 {
        match self {
            Register::FirmwareVersion | Register::ClockHigh => 2,
            Register::LedState => 3,
            Register::FifoPop => 4,
            _ => 1,
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Register::ModMask | Register::CfgFlags | Register::LedState | Register::ScanRate
        )
    }
}

/// Width of any address, unknown addresses count as one byte
pub fn width_of(address: u8) -> u8 {
    Register::from_address(address).map_or(1, Register::width)
}

//! Event records served through the FIFO-pop register.
//!
//! Every record is four bytes on the wire: type, code, modifier mask and the
//! low byte of the millisecond clock.

use embassy_time::Instant;

/// Set in the code byte of a `Cursor` event when the direction is released
pub const CURSOR_RELEASE: u8 = 0x80;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
#[repr(u8)]
pub enum EventType {
    #[default]
    Nop = 0,
    KeyDown = 1,
    KeyUp = 2,
    ModChange = 3,
    Cursor = 4,
    Special = 5,
}

impl EventType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EventType::Nop),
            1 => Some(EventType::KeyDown),
            2 => Some(EventType::KeyUp),
            3 => Some(EventType::ModChange),
            4 => Some(EventType::Cursor),
            5 => Some(EventType::Special),
            _ => None,
        }
    }

    /// `KeyDown` for a press, `KeyUp` for a release
    pub fn for_key(pressed: bool) -> Self {
        if pressed {
            EventType::KeyDown
        } else {
            EventType::KeyUp
        }
    }
}

/// Cursor directions and their wire ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
#[repr(u8)]
pub enum CursorDirection {
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
    Center = 5,
}

impl CursorDirection {
    /// Bit of this direction inside the cursor bitmask
    pub fn mask(self) -> u8 {
        1 << (self as u8 - 1)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub struct KeyboardEvent {
    pub kind: EventType,
    pub code: u8,
    pub mod_mask: u8,
    pub timestamp_low: u8,
}

impl KeyboardEvent {
    pub const NOP: KeyboardEvent = KeyboardEvent {
        kind: EventType::Nop,
        code: 0,
        mod_mask: 0,
        timestamp_low: 0,
    };

    pub fn new(kind: EventType, code: u8, mod_mask: u8, now: Instant) -> Self {
        Self {
            kind,
            code,
            mod_mask,
            timestamp_low: timestamp_low(now),
        }
    }

    /// Placeholder served when the host pops an empty ring
    pub fn nop(mod_mask: u8) -> Self {
        Self {
            mod_mask,
            ..Self::NOP
        }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [self.kind as u8, self.code, self.mod_mask, self.timestamp_low]
    }

    /// Parse a wire record, `None` for an unknown event type
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        Some(Self {
            kind: EventType::from_u8(bytes[0])?,
            code: bytes[1],
            mod_mask: bytes[2],
            timestamp_low: bytes[3],
        })
    }
}

/// Low byte of the millisecond clock
pub fn timestamp_low(now: Instant) -> u8 {
    now.as_millis() as u8
}

/// Bits 16..31 of the microsecond clock
pub fn timestamp_high(now: Instant) -> u16 {
    (now.as_micros() >> 16) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout() {
        let event = KeyboardEvent {
            kind: EventType::ModChange,
            code: 0x02,
            mod_mask: 0x12,
            timestamp_low: 0x34,
        };
        assert_eq!(event.to_bytes(), [3, 0x02, 0x12, 0x34]);
        assert_eq!(KeyboardEvent::from_bytes(event.to_bytes()), Some(event));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert_eq!(KeyboardEvent::from_bytes([6, 0, 0, 0]), None);
    }

    #[test]
    fn nop_keeps_the_live_mask() {
        assert_eq!(KeyboardEvent::nop(0x05).to_bytes(), [0, 0, 0x05, 0]);
    }

    #[test]
    fn cursor_bits() {
        assert_eq!(CursorDirection::Up.mask(), 0x01);
        assert_eq!(CursorDirection::Down.mask(), 0x02);
        assert_eq!(CursorDirection::Left.mask(), 0x04);
        assert_eq!(CursorDirection::Right.mask(), 0x08);
        assert_eq!(CursorDirection::Center.mask(), 0x10);
    }

    #[test]
    fn clock_split() {
        let now = Instant::from_micros(0x0012_3456_7890);
        assert_eq!(timestamp_high(now), 0x3456);
        assert_eq!(timestamp_low(Instant::from_millis(0x1FF)), 0xFF);
    }
}

//! Shared snapshot of device state.
//!
//! Every field is an atomic cell so the poll loop and the bus interrupt can
//! share one [`RegisterBank`] without locks. Who may write what is fixed:
//! [`LoopRegisters`] for the fields the scanners produce, [`HostRegisters`]
//! for the fields the host writes over the bus. Both handles can read
//! everything through [`Deref`](core::ops::Deref) to the bank.

use core::ops::Deref;
use core::sync::atomic::{AtomicU8, AtomicU16, Ordering};

use crate::config::DEFAULT_SCAN_RATE_HZ;

pub const STATUS_FIFO_EMPTY: u8 = 1 << 0;
pub const STATUS_FIFO_FULL: u8 = 1 << 1;
pub const STATUS_MOD_VALID: u8 = 1 << 2;
pub const STATUS_ERROR: u8 = 1 << 7;

pub struct RegisterBank {
    status: AtomicU8,
    mod_mask: AtomicU8,
    cursor: AtomicU8,
    timestamp_high: AtomicU16,

    cfg_flags: AtomicU8,
    led: [AtomicU8; 3],
    scan_rate_hz: AtomicU16,
    mod_override: AtomicU8,
    override_seq: AtomicU8,
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank {
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(STATUS_FIFO_EMPTY),
            mod_mask: AtomicU8::new(0),
            cursor: AtomicU8::new(0),
            timestamp_high: AtomicU16::new(0),
            cfg_flags: AtomicU8::new(0),
            led: [AtomicU8::new(0), AtomicU8::new(0), AtomicU8::new(0)],
            scan_rate_hz: AtomicU16::new(DEFAULT_SCAN_RATE_HZ),
            mod_override: AtomicU8::new(0),
            override_seq: AtomicU8::new(0),
        }
    }

    /// Hand out the two writer handles
    pub fn split(&mut self) -> (LoopRegisters<'_>, HostRegisters<'_>) {
        let bank: &Self = self;
        (LoopRegisters { bank }, HostRegisters { bank })
    }

    /// Status as last published by the poll loop
    pub fn status(&self) -> u8 {
        self.status.load(Ordering::Relaxed)
    }

    pub fn error(&self) -> bool {
        self.status() & STATUS_ERROR != 0
    }

    pub fn mod_mask(&self) -> u8 {
        self.mod_mask.load(Ordering::Relaxed)
    }

    pub fn cursor(&self) -> u8 {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn timestamp_high(&self) -> u16 {
        self.timestamp_high.load(Ordering::Relaxed)
    }

    pub fn cfg_flags(&self) -> u8 {
        self.cfg_flags.load(Ordering::Relaxed)
    }

    pub fn led(&self) -> [u8; 3] {
        [
            self.led[0].load(Ordering::Relaxed),
            self.led[1].load(Ordering::Relaxed),
            self.led[2].load(Ordering::Relaxed),
        ]
    }

    pub fn scan_rate_hz(&self) -> u16 {
        self.scan_rate_hz.load(Ordering::Relaxed)
    }

    /// Pending host override of the modifier mask as `(sequence, mask)`
    pub fn mod_override(&self) -> (u8, u8) {
        let seq = self.override_seq.load(Ordering::Acquire);
        (seq, self.mod_override.load(Ordering::Relaxed))
    }
}

/// Writer for the fields owned by the poll loop
pub struct LoopRegisters<'a> {
    bank: &'a RegisterBank,
}

impl LoopRegisters<'_> {
    /// Recompute the FIFO bits, keep the sticky error bit
    pub fn set_fifo_state(&self, empty: bool, full: bool) {
        let mut status = self.bank.status() & STATUS_ERROR;
        if empty {
            status |= STATUS_FIFO_EMPTY;
        }
        if full {
            status |= STATUS_FIFO_FULL;
        }
        if self.bank.mod_mask() != 0 {
            status |= STATUS_MOD_VALID;
        }
        self.bank.status.store(status, Ordering::Relaxed);
    }

    /// Set the sticky error bit. Nothing ever clears it.
    pub fn raise_error(&self) {
        let status = self.bank.status() | STATUS_ERROR;
        self.bank.status.store(status, Ordering::Relaxed);
    }

    pub fn set_mod_mask(&self, mask: u8) {
        self.bank.mod_mask.store(mask, Ordering::Relaxed);
        let status = if mask != 0 {
            self.bank.status() | STATUS_MOD_VALID
        } else {
            self.bank.status() & !STATUS_MOD_VALID
        };
        self.bank.status.store(status, Ordering::Relaxed);
    }

    pub fn set_cursor(&self, cursor: u8) {
        self.bank.cursor.store(cursor, Ordering::Relaxed);
    }

    pub fn set_timestamp_high(&self, value: u16) {
        self.bank.timestamp_high.store(value, Ordering::Relaxed);
    }
}

impl Deref for LoopRegisters<'_> {
    type Target = RegisterBank;

    fn deref(&self) -> &RegisterBank {
        self.bank
    }
}

/// Writer for the fields the host sets over the bus
pub struct HostRegisters<'a> {
    bank: &'a RegisterBank,
}

impl HostRegisters<'_> {
    pub fn set_cfg_flags(&self, flags: u8) {
        self.bank.cfg_flags.store(flags, Ordering::Relaxed);
    }

    pub fn set_led(&self, index: usize, value: u8) {
        if let Some(cell) = self.bank.led.get(index) {
            cell.store(value, Ordering::Relaxed);
        }
    }

    pub fn set_scan_rate_hz(&self, rate: u16) {
        self.bank.scan_rate_hz.store(rate, Ordering::Relaxed);
    }

    /// Ask the poll loop to replace the live modifier mask
    pub fn request_mod_mask(&self, mask: u8) {
        self.bank.mod_override.store(mask, Ordering::Relaxed);
        let seq = self.bank.override_seq.load(Ordering::Relaxed);
        self.bank
            .override_seq
            .store(seq.wrapping_add(1), Ordering::Release);
    }
}

impl Deref for HostRegisters<'_> {
    type Target = RegisterBank;

    fn deref(&self) -> &RegisterBank {
        self.bank
    }
}

use embassy_time::Duration;

/// Matrix rows
pub const ROWS: usize = 6;
/// Matrix cols
pub const COLS: usize = 7;
/// Single-pin switches outside of the matrix
pub const DISCRETE_KEYS: usize = 11;

/// Events the ring can hold before dropping
pub const FIFO_CAPACITY: usize = 64;
/// Ring slots, one stays free to tell full from empty
pub const RING_SLOTS: usize = FIFO_CAPACITY + 1;

/// Debounce key in ms
pub const KEY_DEBOUNCE: Duration = Duration::from_millis(5);

/// Time given to a driven row before the columns are sampled, in us
pub const ROW_SETTLE_US: u32 = 5;

/// Scan rate reported at boot, in Hz
pub const DEFAULT_SCAN_RATE_HZ: u16 = 1000;

/// Constant served from register 0x00
pub const DEVICE_ID: u8 = 0xB0;
pub const FW_VERSION_MAJOR: u8 = 1;
pub const FW_VERSION_MINOR: u8 = 0;

/// 7-bit I2C target address
pub const I2C_ADDRESS: u8 = 0x32;

/// Runtime knobs for the scanners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Quiet period a raw signal must hold before it commits
    pub debounce: Duration,
    /// Row settle delay in us
    pub settle_us: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce: KEY_DEBOUNCE,
            settle_us: ROW_SETTLE_US,
        }
    }
}

/// Time between two scan passes for a given scan rate.
///
/// A rate of zero is treated as 1 Hz.
pub fn scan_interval(rate_hz: u16) -> Duration {
    let rate = rate_hz.max(1) as u64;
    Duration::from_micros(1_000_000 / rate)
}

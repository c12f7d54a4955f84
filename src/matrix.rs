use embassy_time::{Duration, Instant};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::config::ScanConfig;
use crate::error::Error;

#[cfg(feature = "debug")]
use defmt::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub enum KeyState {
    #[default]
    Released,
    Pressed,
}

impl KeyState {
    pub fn is_pressed(self) -> bool {
        self == KeyState::Pressed
    }
}

impl From<bool> for KeyState {
    fn from(pressed: bool) -> Self {
        if pressed {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }
}

/// Quiet-period debounce over one bitmask per row.
///
/// A raw change restarts the cell's timer. A cell whose raw value differs
/// from its committed value flips once the timer has run for the whole
/// debounce interval, so a bouncing contact only commits after it went
/// quiet.
pub struct MatrixDebouncer<const ROWS: usize, const COLS: usize> {
    raw: [u32; ROWS],
    stable: [u32; ROWS],
    last_change: [[Instant; COLS]; ROWS],
    debounce: Duration,
}

impl<const ROWS: usize, const COLS: usize> MatrixDebouncer<ROWS, COLS> {
    const COL_MASK: u32 = {
        assert!(COLS <= 32, "a row is sampled into a u32");
        if COLS == 32 { u32::MAX } else { (1 << COLS) - 1 }
    };

    pub fn new(debounce: Duration) -> Self {
        Self {
            raw: [0; ROWS],
            stable: [0; ROWS],
            last_change: [[Instant::from_ticks(0); COLS]; ROWS],
            debounce,
        }
    }

    /// Feed one sampled row, reporting every cell that commits
    pub fn update_row<F>(&mut self, row: usize, raw: u32, now: Instant, mut on_change: F)
    where
        F: FnMut(KeyPos, KeyState),
    {
        let raw = raw & Self::COL_MASK;

        // restart the quiet period of every cell that moved
        let mut moved = raw ^ self.raw[row];
        while moved != 0 {
            let col = moved.trailing_zeros() as usize;
            moved &= moved - 1;
            self.last_change[row][col] = now;
        }
        self.raw[row] = raw;

        let mut pending = raw ^ self.stable[row];
        while pending != 0 {
            let col = pending.trailing_zeros() as usize;
            pending &= pending - 1;

            let quiet = now.saturating_duration_since(self.last_change[row][col]);
            if quiet >= self.debounce {
                self.stable[row] ^= 1 << col;
                let state = KeyState::from(raw & (1 << col) != 0);

                #[cfg(feature = "debug")]
                info!("[debounce] r{} c{} {}", row, col, state);

                on_change(
                    KeyPos {
                        row: row as u8,
                        col: col as u8,
                    },
                    state,
                );
            }
        }
    }

    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        row < ROWS && col < COLS && self.stable[row] & (1 << col) != 0
    }

    /// Committed bitmask of a row
    pub fn stable_row(&self, row: usize) -> u32 {
        self.stable.get(row).copied().unwrap_or(0)
    }
}

pub struct Matrix<R, C, D, const ROWS: usize, const COLS: usize> {
    rows: [R; ROWS],
    cols: [C; COLS],
    delay: D,
    settle_us: u32,
    debouncer: MatrixDebouncer<ROWS, COLS>,
}

impl<R, C, D, const ROWS: usize, const COLS: usize> Matrix<R, C, D, ROWS, COLS>
where
    R: OutputPin,
    C: InputPin,
    D: DelayNs,
{
    pub fn init(rows: [R; ROWS], cols: [C; COLS], delay: D, config: ScanConfig) -> Self {
        Self {
            rows,
            cols,
            delay,
            settle_us: config.settle_us,
            debouncer: MatrixDebouncer::new(config.debounce),
        }
    }

    /// One pass over every row, reporting committed transitions
    pub async fn scan<F>(&mut self, now: Instant, mut on_change: F) -> Result<(), Error>
    where
        F: FnMut(KeyPos, KeyState),
    {
        for (row_count, row) in self.rows.iter_mut().enumerate() {
            row.set_high().map_err(|_| Error::Pin)?;
            // delay so port propagates
            self.delay.delay_us(self.settle_us).await;

            let sampled = Self::sample(&mut self.cols);

            // set row to low, even when sampling failed
            row.set_low().map_err(|_| Error::Pin)?;

            self.debouncer
                .update_row(row_count, sampled?, now, &mut on_change);
        }
        Ok(())
    }

    fn sample(cols: &mut [C; COLS]) -> Result<u32, Error> {
        let mut raw = 0u32;
        for (col_count, col) in cols.iter_mut().enumerate() {
            if col.is_high().map_err(|_| Error::Pin)? {
                raw |= 1 << col_count;
            }
        }
        Ok(raw)
    }

    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.debouncer.is_pressed(row, col)
    }
}

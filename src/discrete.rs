//! Bank of single-pin switches, debounced the same way as the matrix.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

use crate::error::Error;
use crate::matrix::KeyState;

#[cfg(feature = "debug")]
use defmt::info;

#[derive(Debug, Clone, Copy)]
struct SwitchState {
    raw: bool,
    stable: bool,
    last_transition: Instant,
}

impl Default for SwitchState {
    fn default() -> Self {
        Self {
            raw: false,
            stable: false,
            last_transition: Instant::from_ticks(0),
        }
    }
}

pub struct DiscreteKeys<P, const N: usize> {
    pins: [P; N],
    keys: [SwitchState; N],
    debounce: Duration,
}

impl<P: InputPin, const N: usize> DiscreteKeys<P, N> {
    pub fn init(pins: [P; N], debounce: Duration) -> Self {
        Self {
            pins,
            keys: [SwitchState::default(); N],
            debounce,
        }
    }

    /// Sample every switch, reporting `(index, state)` for each one that
    /// commits. A pin that fails to read is skipped for this pass.
    pub fn scan<F>(&mut self, now: Instant, mut on_change: F) -> Result<(), Error>
    where
        F: FnMut(usize, KeyState),
    {
        let mut result = Ok(());
        for index in 0..N {
            match self.pins[index].is_high() {
                Ok(level) => self.update(index, level, now, &mut on_change),
                Err(_) => result = Err(Error::Pin),
            }
        }
        result
    }

    /// Feed one raw sample for switch `index`
    pub fn update<F>(&mut self, index: usize, level: bool, now: Instant, mut on_change: F)
    where
        F: FnMut(usize, KeyState),
    {
        let Some(key) = self.keys.get_mut(index) else {
            return;
        };

        if level != key.raw {
            key.raw = level;
            key.last_transition = now;
        }

        if key.raw != key.stable
            && now.saturating_duration_since(key.last_transition) >= self.debounce
        {
            key.stable = key.raw;

            #[cfg(feature = "debug")]
            info!("[discrete] key {} {}", index, key.stable);

            on_change(index, KeyState::from(key.stable));
        }
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.keys.get(index).is_some_and(|key| key.stable)
    }
}

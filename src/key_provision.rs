use embassy_time::Instant;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::error::Error;
use crate::event::{CURSOR_RELEASE, EventType, KeyboardEvent, timestamp_high};
use crate::keycodes::{KC, KeyType};
use crate::keymap::{cursor_direction, discrete_keycode, matrix_keycode};
use crate::matrix::{KeyPos, KeyState};
use crate::registers::LoopRegisters;
use crate::ring::EventProducer;

#[cfg(feature = "debug")]
use defmt::{info, warn};

/// Stand-in for boards without an interrupt line wired to the host
pub struct NoInterruptLine;

impl ErrorType for NoInterruptLine {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoInterruptLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Active-low "events pending" line towards the host
struct InterruptLine<I> {
    pin: I,
    asserted: bool,
}

impl<I: OutputPin> InterruptLine<I> {
    fn new(mut pin: I) -> Self {
        pin.set_high().ok();
        Self {
            pin,
            asserted: false,
        }
    }

    fn assert(&mut self) {
        if !self.asserted {
            self.pin.set_low().ok();
            self.asserted = true;
        }
    }

    fn release(&mut self) {
        if self.asserted {
            self.pin.set_high().ok();
            self.asserted = false;
        }
    }
}

/// Turns debounced key transitions into protocol events.
///
/// Runs in the poll loop and is the only producer of the event ring and the
/// only writer of the modifier mask, cursor bitmask, clock-high and status
/// registers.
pub struct KeyProvision<'a, I, const N: usize> {
    producer: EventProducer<'a, N>,
    regs: LoopRegisters<'a>,
    irq: InterruptLine<I>,
    mod_mask: u8,
    /// How many held keys own each modifier bit
    mod_holders: [u8; 8],
    cursor: u8,
    override_seq: u8,
}

impl<'a, I: OutputPin, const N: usize> KeyProvision<'a, I, N> {
    pub fn init(producer: EventProducer<'a, N>, regs: LoopRegisters<'a>, irq: I) -> Self {
        let (override_seq, _) = regs.mod_override();
        regs.set_fifo_state(producer.is_empty(), producer.is_full());
        Self {
            producer,
            regs,
            irq: InterruptLine::new(irq),
            mod_mask: 0,
            mod_holders: [0; 8],
            cursor: 0,
            override_seq,
        }
    }

    pub fn mod_mask(&self) -> u8 {
        self.mod_mask
    }

    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    /// Scan rate the host asked for
    pub fn scan_rate_hz(&self) -> u16 {
        self.regs.scan_rate_hz()
    }

    /// Debounced transition from the matrix
    pub fn on_matrix_key(
        &mut self,
        position: KeyPos,
        state: KeyState,
        now: Instant,
    ) -> Result<(), Error> {
        let kc = matrix_keycode(position.row as usize, position.col as usize);

        #[cfg(feature = "debug")]
        info!(
            "[key_provision] matrix r{} c{} {}",
            position.row, position.col, state
        );

        self.provision_key(kc, state.is_pressed(), now)
    }

    /// Debounced transition from a discrete switch
    pub fn on_discrete_key(
        &mut self,
        index: usize,
        state: KeyState,
        now: Instant,
    ) -> Result<(), Error> {
        let pressed = state.is_pressed();

        #[cfg(feature = "debug")]
        info!("[key_provision] discrete {} {}", index, state);

        let key_result = self.provision_key(discrete_keycode(index), pressed, now);

        let Some(direction) = cursor_direction(index) else {
            return key_result;
        };

        let bit = direction.mask();
        if pressed {
            self.cursor |= bit;
        } else {
            self.cursor &= !bit;
        }
        self.regs.set_cursor(self.cursor);

        let code = if pressed {
            direction as u8
        } else {
            direction as u8 | CURSOR_RELEASE
        };
        let cursor_result = self.queue(KeyboardEvent::new(
            EventType::Cursor,
            code,
            self.mod_mask,
            now,
        ));

        key_result.and(cursor_result)
    }

    fn provision_key(&mut self, kc: KC, pressed: bool, now: Instant) -> Result<(), Error> {
        let kind = EventType::for_key(pressed);

        match KeyType::check_type(&kc) {
            KeyType::None => Ok(()),
            KeyType::Modifier => {
                let bit = kc.get_modifier();
                let new_mask = self.track_modifier(bit, pressed);
                if new_mask == self.mod_mask {
                    return self.queue(KeyboardEvent::new(kind, kc as u8, self.mod_mask, now));
                }

                self.mod_mask = new_mask;
                self.regs.set_mod_mask(new_mask);

                // the mask change goes out before the key itself
                let change = self.queue(KeyboardEvent::new(
                    EventType::ModChange,
                    bit,
                    new_mask,
                    now,
                ));
                let key = self.queue(KeyboardEvent::new(kind, kc as u8, new_mask, now));
                change.and(key)
            }
            KeyType::Key => self.queue(KeyboardEvent::new(kind, kc as u8, self.mod_mask, now)),
        }
    }

    /// Count holders per modifier bit so left and right variants of the same
    /// modifier keep the bit until both are up.
    fn track_modifier(&mut self, bit: u8, pressed: bool) -> u8 {
        let slot = bit.trailing_zeros() as usize;
        let holders = &mut self.mod_holders[slot];
        if pressed {
            *holders = holders.saturating_add(1);
        } else {
            *holders = holders.saturating_sub(1);
        }

        if *holders > 0 {
            self.mod_mask | bit
        } else {
            self.mod_mask & !bit
        }
    }

    fn queue(&mut self, event: KeyboardEvent) -> Result<(), Error> {
        match self.producer.push(event) {
            Ok(()) => {
                self.regs
                    .set_fifo_state(self.producer.is_empty(), self.producer.is_full());
                self.irq.assert();
                Ok(())
            }
            Err(_dropped) => {
                #[cfg(feature = "debug")]
                warn!("[key_provision] fifo full, dropped {}", _dropped);

                self.regs.raise_error();
                self.regs.set_fifo_state(false, true);
                Err(Error::QueueFull)
            }
        }
    }

    /// Bookkeeping once per poll pass
    pub fn tick(&mut self, now: Instant) {
        self.regs.set_timestamp_high(timestamp_high(now));

        let (seq, mask) = self.regs.mod_override();
        if seq != self.override_seq {
            self.override_seq = seq;

            #[cfg(feature = "debug")]
            info!("[key_provision] host override mod mask {=u8:#x}", mask);

            self.mod_mask = mask;
            self.regs.set_mod_mask(mask);
        }

        let empty = self.producer.is_empty();
        self.regs.set_fifo_state(empty, self.producer.is_full());
        if empty {
            self.irq.release();
        }
    }
}

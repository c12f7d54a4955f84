//! Register-pointer server behind the I2C target interrupt.
//!
//! The first byte the host writes in a transaction selects a register; every
//! further byte is written to it, every read clocks one byte out of it. The
//! pointer then moves on: through the bytes of a multi-byte register first,
//! then to the next address. A STOP forgets the pointer, so the next
//! transaction has to select a register again.

use heapless::Vec;

use crate::config::{DEVICE_ID, FW_VERSION_MAJOR, FW_VERSION_MINOR};
use crate::event::KeyboardEvent;
use crate::registers::{
    HostRegisters, STATUS_ERROR, STATUS_FIFO_EMPTY, STATUS_FIFO_FULL, STATUS_MOD_VALID,
};
use crate::ring::EventConsumer;

use super::controller::{BusController, BusEvents, BusSignal};
use super::register::{Register, width_of};

#[cfg(feature = "debug")]
use defmt::{debug, info};

/// Receives the colour once the host has written all three LED bytes
pub trait LedWriter {
    fn write_led(&mut self, r: u8, g: u8, b: u8);
}

impl<F: FnMut(u8, u8, u8)> LedWriter for F {
    fn write_led(&mut self, r: u8, g: u8, b: u8) {
        self(r, g, b)
    }
}

/// Register and byte within it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub struct Cursor {
    pub register: u8,
    pub offset: u8,
}

impl Cursor {
    pub fn at(register: u8) -> Self {
        Self {
            register,
            offset: 0,
        }
    }

    /// Next byte of this register, or the first byte of the next address
    pub fn advance(self) -> Self {
        if self.offset + 1 >= width_of(self.register) {
            Cursor::at(self.register.wrapping_add(1))
        } else {
            Cursor {
                offset: self.offset + 1,
                ..self
            }
        }
    }

    /// Bytes left in the current register, this one included
    pub fn remaining(self) -> u8 {
        width_of(self.register).saturating_sub(self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub enum PointerState {
    /// No pointer latched in this transaction. A received byte becomes the
    /// pointer; reads continue from `resume`.
    Idle { resume: Cursor },
    /// Pointer latched, received bytes are register writes
    Serving(Cursor),
}

impl PointerState {
    pub fn cursor(self) -> Cursor {
        match self {
            PointerState::Idle { resume } => resume,
            PointerState::Serving(cursor) => cursor,
        }
    }

    fn with_cursor(self, cursor: Cursor) -> Self {
        match self {
            PointerState::Idle { .. } => PointerState::Idle { resume: cursor },
            PointerState::Serving(_) => PointerState::Serving(cursor),
        }
    }
}

pub struct BusEngine<'a, L, const N: usize> {
    consumer: EventConsumer<'a, N>,
    regs: HostRegisters<'a>,
    led: L,
    state: PointerState,
    /// Event popped on the first FIFO-pop byte, served by sub-index
    popped: Option<[u8; 4]>,
    /// Clock-high value frozen on the first byte read so both bytes match
    clock_latch: Option<[u8; 2]>,
}

impl<'a, L: LedWriter, const N: usize> BusEngine<'a, L, N> {
    pub fn new(consumer: EventConsumer<'a, N>, regs: HostRegisters<'a>, led: L) -> Self {
        Self {
            consumer,
            regs,
            led,
            state: PointerState::Idle {
                resume: Cursor::default(),
            },
            popped: None,
            clock_latch: None,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// Interrupt handler body: service every pending reason in bus order
    pub fn service<B: BusController>(&mut self, bus: &mut B) {
        let pending = bus.pending();

        // a pointer byte received right before a repeated start has to be
        // latched before the read that follows it is answered
        if pending.contains(BusEvents::DATA_RECEIVED) {
            let value = bus.read_byte();
            self.on_receive(value);
        }
        if pending.contains(BusEvents::READ_REQUESTED) {
            let value = self.on_read_request();
            bus.write_byte(value);
        }
        if pending.contains(BusEvents::STOPPED) {
            self.on_stop();
        }
        if pending.contains(BusEvents::ABORTED) {
            self.on_abort();
        }

        bus.acknowledge(pending);
    }

    /// Apply one signal, returning the byte to transmit for a read
    pub fn handle(&mut self, signal: BusSignal) -> Option<u8> {
        match signal {
            BusSignal::DataReceived(value) => {
                self.on_receive(value);
                None
            }
            BusSignal::ReadRequested => Some(self.on_read_request()),
            BusSignal::Stop => {
                self.on_stop();
                None
            }
            BusSignal::Abort => {
                self.on_abort();
                None
            }
        }
    }

    pub fn on_receive(&mut self, value: u8) {
        match self.state {
            PointerState::Idle { .. } => {
                self.state = PointerState::Serving(Cursor::at(value));
                self.end_sequence();
            }
            PointerState::Serving(cursor) => {
                self.write_register(cursor, value);
                self.state = PointerState::Serving(cursor.advance());
            }
        }
    }

    pub fn on_read_request(&mut self) -> u8 {
        let cursor = self.state.cursor();
        let value = self.read_register(cursor);
        self.state = self.state.with_cursor(cursor.advance());
        value
    }

    pub fn on_stop(&mut self) {
        let cursor = self.state.cursor();
        self.state = PointerState::Idle {
            resume: Cursor::at(cursor.register),
        };
        self.end_sequence();
    }

    pub fn on_abort(&mut self) {
        #[cfg(feature = "debug")]
        info!("[bus] transfer aborted at {}", self.state);

        self.on_stop();
    }

    /// Serve the rest of the current register in one go, for peripherals
    /// that want the whole reply up front
    pub fn read_span(&mut self) -> Vec<u8, 4> {
        let mut span = Vec::new();
        for _ in 0..self.state.cursor().remaining() {
            // a span never exceeds the widest register
            span.push(self.on_read_request()).ok();
        }
        span
    }

    /// Forget the partly served event and the clock latch
    fn end_sequence(&mut self) {
        if let Some(_event) = self.popped.take() {
            #[cfg(feature = "debug")]
            debug!("[bus] dropped partly read event {}", _event);
        }
        self.clock_latch = None;
    }

    fn status(&self) -> u8 {
        let mut status = 0;
        if self.consumer.is_empty() {
            status |= STATUS_FIFO_EMPTY;
        }
        if self.consumer.is_full() {
            status |= STATUS_FIFO_FULL;
        }
        if self.regs.mod_mask() != 0 {
            status |= STATUS_MOD_VALID;
        }
        if self.regs.error() {
            status |= STATUS_ERROR;
        }
        status
    }

    /// The event is popped on sub-index 0 only. Reaching a later sub-index
    /// without it serves zeros and leaves the ring alone.
    fn fifo_pop(&mut self, offset: usize) -> u8 {
        if offset == 0 {
            let event = self
                .consumer
                .pop()
                .unwrap_or_else(|| KeyboardEvent::nop(self.regs.mod_mask()));
            self.popped = Some(event.to_bytes());
        }

        let value = self.popped.map_or(0, |bytes| bytes[offset]);
        if offset + 1 >= Register::FifoPop.width() as usize {
            self.popped = None;
        }
        value
    }

    fn clock_high(&mut self, offset: usize) -> u8 {
        if offset == 0 {
            self.clock_latch = None;
        }
        let bytes = *self
            .clock_latch
            .get_or_insert_with(|| self.regs.timestamp_high().to_le_bytes());
        if offset + 1 >= Register::ClockHigh.width() as usize {
            self.clock_latch = None;
        }
        bytes[offset]
    }

    fn read_register(&mut self, cursor: Cursor) -> u8 {
        let offset = cursor.offset as usize;
        match Register::from_address(cursor.register) {
            Some(Register::DeviceId) => DEVICE_ID,
            Some(Register::FirmwareVersion) => [FW_VERSION_MAJOR, FW_VERSION_MINOR][offset],
            Some(Register::Status) => self.status(),
            Some(Register::ModMask) => self.regs.mod_mask(),
            Some(Register::FifoCount) => self.consumer.len().min(u8::MAX as usize) as u8,
            Some(Register::FifoPop) => self.fifo_pop(offset),
            Some(Register::CfgFlags) => self.regs.cfg_flags(),
            Some(Register::Cursor) => self.regs.cursor(),
            Some(Register::LedState) => self.regs.led()[offset],
            Some(Register::ScanRate) => self.regs.scan_rate_hz() as u8,
            Some(Register::ClockHigh) => self.clock_high(offset),
            None => 0,
        }
    }

    fn write_register(&mut self, cursor: Cursor, value: u8) {
        let offset = cursor.offset as usize;
        let Some(register) = Register::from_address(cursor.register).filter(|r| r.is_writable())
        else {
            #[cfg(feature = "debug")]
            debug!("[bus] write to {=u8:#x} discarded", cursor.register);
            return;
        };

        match register {
            Register::CfgFlags => self.regs.set_cfg_flags(value),
            Register::ModMask => self.regs.request_mod_mask(value),
            Register::LedState => {
                self.regs.set_led(offset, value);
                if offset == 2 {
                    // host sends green, red, blue
                    let [g, r, b] = self.regs.led();
                    self.led.write_led(r, g, b);
                }
            }
            Register::ScanRate => self.regs.set_scan_rate_hz(value as u16),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use crate::registers::{LoopRegisters, RegisterBank};
    use crate::ring::{EventProducer, EventRing};
    use core::cell::RefCell;

    type NoLed = fn(u8, u8, u8);

    fn no_led(_: u8, _: u8, _: u8) {}

    /// Ring and bank the engine under test borrows from
    struct Fixture {
        ring: EventRing<8>,
        bank: RegisterBank,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                ring: EventRing::new(),
                bank: RegisterBank::new(),
            }
        }

        fn engine(
            &mut self,
        ) -> (
            EventProducer<'_, 8>,
            LoopRegisters<'_>,
            BusEngine<'_, NoLed, 8>,
        ) {
            self.engine_with_led(no_led as NoLed)
        }

        fn engine_with_led<L: LedWriter>(
            &mut self,
            led: L,
        ) -> (EventProducer<'_, 8>, LoopRegisters<'_>, BusEngine<'_, L, 8>) {
            let (producer, consumer) = self.ring.split();
            let (regs, host) = self.bank.split();
            (producer, regs, BusEngine::new(consumer, host, led))
        }
    }

    fn key_down(code: u8) -> KeyboardEvent {
        KeyboardEvent {
            kind: EventType::KeyDown,
            code,
            mod_mask: 0,
            timestamp_low: code,
        }
    }

    fn read<L: LedWriter, const N: usize>(
        engine: &mut BusEngine<'_, L, N>,
        register: u8,
        count: usize,
    ) -> std::vec::Vec<u8> {
        engine.on_receive(register);
        let bytes = (0..count).map(|_| engine.on_read_request()).collect();
        engine.on_stop();
        bytes
    }

    fn write<L: LedWriter, const N: usize>(engine: &mut BusEngine<'_, L, N>, bytes: &[u8]) {
        for byte in bytes {
            engine.on_receive(*byte);
        }
        engine.on_stop();
    }

    #[test]
    fn identity_registers() {
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine();

        assert_eq!(read(&mut engine, 0x00, 1), [DEVICE_ID]);
        assert_eq!(read(&mut engine, 0x01, 2), [FW_VERSION_MAJOR, FW_VERSION_MINOR]);
        // auto-increment walks across registers
        assert_eq!(
            read(&mut engine, 0x00, 4),
            [DEVICE_ID, FW_VERSION_MAJOR, FW_VERSION_MINOR, STATUS_FIFO_EMPTY]
        );
    }

    #[test]
    fn pointer_state_transitions() {
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine();

        engine.on_receive(0x08);
        assert_eq!(engine.state(), PointerState::Serving(Cursor::at(0x08)));
        engine.on_receive(1);
        assert_eq!(
            engine.state(),
            PointerState::Serving(Cursor {
                register: 0x08,
                offset: 1
            })
        );
        engine.on_stop();
        assert_eq!(
            engine.state(),
            PointerState::Idle {
                resume: Cursor::at(0x08)
            }
        );

        // next transaction starts with a fresh pointer byte
        engine.on_receive(0x06);
        assert_eq!(engine.state(), PointerState::Serving(Cursor::at(0x06)));
    }

    #[test]
    fn fifo_pop_serves_four_bytes_then_moves_on() {
        let mut fixture = Fixture::new();
        let (mut producer, _, mut engine) = fixture.engine();

        producer.push(key_down(4)).unwrap();
        assert_eq!(read(&mut engine, 0x05, 4), key_down(4).to_bytes());

        // fifth byte is the config register
        producer.push(key_down(5)).unwrap();
        assert_eq!(read(&mut engine, 0x05, 5)[4], 0);
        assert!(producer.is_empty());
    }

    #[test]
    fn stop_mid_event_drops_the_rest() {
        let mut fixture = Fixture::new();
        let (mut producer, _, mut engine) = fixture.engine();

        producer.push(key_down(4)).unwrap();
        producer.push(key_down(5)).unwrap();

        assert_eq!(read(&mut engine, 0x05, 2), key_down(4).to_bytes()[..2]);
        assert_eq!(read(&mut engine, 0x05, 4), key_down(5).to_bytes());
        assert_eq!(read(&mut engine, 0x05, 4), KeyboardEvent::nop(0).to_bytes());
    }

    #[test]
    fn fifo_pop_entered_mid_register_leaves_the_ring_alone() {
        let mut fixture = Fixture::new();
        let (mut producer, _, mut engine) = fixture.engine();
        producer.push(key_down(7)).unwrap();

        // a discarded write moves the pointer to sub-index 1
        engine.on_receive(0x05);
        engine.on_receive(0xFF);
        let bytes: std::vec::Vec<u8> = (0..3).map(|_| engine.on_read_request()).collect();
        assert_eq!(bytes, [0, 0, 0]);
        assert_eq!(engine.state(), PointerState::Serving(Cursor::at(0x06)));
        engine.on_stop();

        assert_eq!(producer.len(), 1);
        assert_eq!(read(&mut engine, 0x05, 4), key_down(7).to_bytes());
    }

    #[test]
    fn clock_high_latches_per_read_sequence() {
        let mut fixture = Fixture::new();
        let (_, regs, mut engine) = fixture.engine();

        regs.set_timestamp_high(0x1234);
        engine.on_receive(0x0A);
        assert_eq!(engine.on_read_request(), 0x34);
        // the second byte belongs to the first sample
        regs.set_timestamp_high(0xABCD);
        assert_eq!(engine.on_read_request(), 0x12);
        engine.on_stop();

        // entered at sub-index 1, no stale latch is served
        engine.on_receive(0x0A);
        engine.on_receive(0x00);
        assert_eq!(engine.on_read_request(), 0xAB);
        engine.on_stop();
    }

    #[test]
    fn led_updates_once_after_third_byte() {
        let writes = RefCell::new(std::vec::Vec::new());
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine_with_led(|r: u8, g: u8, b: u8| {
            writes.borrow_mut().push((r, g, b))
        });

        write(&mut engine, &[0x08, 0x10, 0x20]);
        assert!(writes.borrow().is_empty());
        assert_eq!(engine.regs.led(), [0x10, 0x20, 0]);

        write(&mut engine, &[0x08, 0x11, 0x22, 0x33]);
        // stored as sent, handed out as red, green, blue
        assert_eq!(*writes.borrow(), [(0x22, 0x11, 0x33)]);
        assert_eq!(read(&mut engine, 0x08, 3), [0x11, 0x22, 0x33]);
    }

    #[test]
    fn writable_registers() {
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine();

        write(&mut engine, &[0x06, 0xA5]);
        assert_eq!(read(&mut engine, 0x06, 1), [0xA5]);

        write(&mut engine, &[0x09, 0x2C]);
        assert_eq!(engine.regs.scan_rate_hz(), 0x2C);

        let (seq, _) = engine.regs.mod_override();
        write(&mut engine, &[0x03, 0x04]);
        assert_eq!(engine.regs.mod_override(), (seq.wrapping_add(1), 0x04));
    }

    #[test]
    fn read_only_registers_swallow_writes() {
        let mut fixture = Fixture::new();
        let (_, regs, mut engine) = fixture.engine();
        regs.set_cursor(0b0_0101);

        for address in 0x00..=0x0A {
            if Register::from_address(address).is_some_and(Register::is_writable) {
                continue;
            }
            write(&mut engine, &[address, 0x5A]);
        }
        write(&mut engine, &[0x40, 1, 2, 3]);

        assert_eq!(read(&mut engine, 0x00, 1), [DEVICE_ID]);
        assert_eq!(read(&mut engine, 0x01, 2), [FW_VERSION_MAJOR, FW_VERSION_MINOR]);
        assert_eq!(read(&mut engine, 0x02, 1), [STATUS_FIFO_EMPTY]);
        assert_eq!(read(&mut engine, 0x07, 1), [0b0_0101]);
        assert_eq!(read(&mut engine, 0x40, 3), [0, 0, 0]);
        // nothing leaked into the writable neighbours either
        assert_eq!(engine.regs.mod_override().0, 0);
        assert_eq!(engine.regs.cfg_flags(), 0);
        assert_eq!(engine.regs.led(), [0, 0, 0]);
    }

    #[test]
    fn scan_rate_serves_low_byte_only() {
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine();

        // 1000 Hz at boot
        assert_eq!(read(&mut engine, 0x09, 1), [0xE8]);
    }

    #[test]
    fn read_without_pointer_resumes_last_register() {
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine();

        assert_eq!(read(&mut engine, 0x01, 1), [FW_VERSION_MAJOR]);
        // current address read restarts the register
        assert_eq!(engine.on_read_request(), FW_VERSION_MAJOR);
        assert_eq!(engine.on_read_request(), FW_VERSION_MINOR);
        assert!(matches!(engine.state(), PointerState::Idle { .. }));
    }

    #[test]
    fn read_span_covers_the_register() {
        let mut fixture = Fixture::new();
        let (mut producer, _, mut engine) = fixture.engine();

        producer.push(key_down(9)).unwrap();
        engine.on_receive(0x05);
        assert_eq!(engine.read_span().as_slice(), key_down(9).to_bytes());
        engine.on_stop();

        engine.on_receive(0x01);
        engine.on_read_request();
        assert_eq!(engine.read_span().as_slice(), [FW_VERSION_MINOR]);
    }

    struct FakeBus {
        pending: BusEvents,
        rx: Option<u8>,
        tx: std::vec::Vec<u8>,
        acked: BusEvents,
    }

    impl BusController for FakeBus {
        fn pending(&mut self) -> BusEvents {
            self.pending
        }

        fn read_byte(&mut self) -> u8 {
            self.rx.take().unwrap()
        }

        fn write_byte(&mut self, value: u8) {
            self.tx.push(value);
        }

        fn acknowledge(&mut self, events: BusEvents) {
            self.acked |= events;
            self.pending.remove(events);
        }
    }

    #[test]
    fn service_latches_pointer_before_answering_read() {
        let mut fixture = Fixture::new();
        let (_, _, mut engine) = fixture.engine();
        let mut bus = FakeBus {
            pending: BusEvents::DATA_RECEIVED | BusEvents::READ_REQUESTED,
            rx: Some(0x00),
            tx: std::vec::Vec::new(),
            acked: BusEvents::empty(),
        };

        engine.service(&mut bus);
        assert_eq!(bus.tx, [DEVICE_ID]);
        assert_eq!(bus.acked, BusEvents::DATA_RECEIVED | BusEvents::READ_REQUESTED);

        bus.pending = BusEvents::READ_REQUESTED | BusEvents::STOPPED;
        engine.service(&mut bus);
        assert_eq!(bus.tx, [DEVICE_ID, FW_VERSION_MAJOR]);
        assert!(matches!(engine.state(), PointerState::Idle { .. }));
        assert!(bus.pending.is_empty());
    }

    #[test]
    fn abort_drops_cached_event() {
        let mut fixture = Fixture::new();
        let (mut producer, _, mut engine) = fixture.engine();

        producer.push(key_down(1)).unwrap();
        producer.push(key_down(2)).unwrap();
        assert_eq!(engine.handle(BusSignal::DataReceived(0x05)), None);
        assert_eq!(engine.handle(BusSignal::ReadRequested), Some(EventType::KeyDown as u8));
        assert_eq!(engine.handle(BusSignal::Abort), None);
        assert_eq!(read(&mut engine, 0x05, 4), key_down(2).to_bytes());
    }
}

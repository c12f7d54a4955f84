use bitflags::bitflags;

bitflags! {
    /// Interrupt reasons raised by a byte-oriented I2C target peripheral
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BusEvents: u8 {
        /// A byte from the host is waiting in the receive register
        const DATA_RECEIVED = 1 << 0;
        /// The host clocks a read and needs a byte
        const READ_REQUESTED = 1 << 1;
        /// STOP seen on the bus
        const STOPPED = 1 << 2;
        /// The transmit side gave up on the current transfer
        const ABORTED = 1 << 3;
    }
}

/// Byte level access to the I2C target peripheral, as seen from its
/// interrupt handler
pub trait BusController {
    /// Reasons the interrupt fired
    fn pending(&mut self) -> BusEvents;

    /// Take the received byte
    fn read_byte(&mut self) -> u8;

    /// Hand the byte for the pending read to the peripheral
    fn write_byte(&mut self, value: u8);

    /// Clear serviced reasons
    fn acknowledge(&mut self, events: BusEvents);
}

/// One interrupt reason with its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub enum BusSignal {
    DataReceived(u8),
    ReadRequested,
    Stop,
    Abort,
}

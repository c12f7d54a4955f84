//! I2C target side: the host reads events and state through a small
//! register file and writes a few configuration registers back.

pub mod controller;
pub mod engine;
pub mod register;

pub use controller::{BusController, BusEvents, BusSignal};
pub use engine::{BusEngine, Cursor, LedWriter, PointerState};
pub use register::Register;

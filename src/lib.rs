#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod discrete;
pub mod error;
pub mod event;
pub mod key_provision;
pub mod keycodes;
pub mod keymap;
pub mod matrix;
pub mod registers;
pub mod ring;

pub use bus::{BusController, BusEngine, BusEvents, BusSignal, LedWriter};
pub use error::Error;
pub use event::{EventType, KeyboardEvent};
pub use key_provision::{KeyProvision, NoInterruptLine};
pub use registers::RegisterBank;
pub use ring::EventRing;

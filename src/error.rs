/// Failures the core can report.
///
/// None of them are fatal; callers log and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "debug", derive(defmt::Format))]
pub enum Error {
    /// A row, column or discrete pin could not be driven or sampled
    Pin,
    /// The event ring was full and the event was dropped
    QueueFull,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Pin => f.write_str("pin access failed"),
            Error::QueueFull => f.write_str("event queue full"),
        }
    }
}

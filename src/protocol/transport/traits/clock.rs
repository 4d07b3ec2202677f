//! Monotonic microsecond clock abstraction driving every ISO-TP deadline.
use crate::core::Timestamp;

/// Source of monotonic microsecond timestamps. Wrapping at 32 bits is expected.
pub trait MonotonicClock {
    /// Current instant.
    fn now(&self) -> Timestamp;
}

impl<F: Fn() -> u32> MonotonicClock for F {
    fn now(&self) -> Timestamp {
        Timestamp(self())
    }
}

#[cfg(feature = "embassy-clock")]
/// Clock backed by the embassy time driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-clock")]
impl MonotonicClock for EmbassyClock {
    fn now(&self) -> Timestamp {
        // Truncation keeps the low 32 bits, matching the wrapping timestamp contract.
        Timestamp(embassy_time::Instant::now().as_micros() as u32)
    }
}

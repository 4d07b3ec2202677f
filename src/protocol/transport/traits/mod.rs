//! Capability traits supplied by the caller: frame transmission and the monotonic clock.
pub mod can_bus;
pub mod clock;

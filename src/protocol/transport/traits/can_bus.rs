//! Minimal abstraction for a non-blocking CAN transmitter. Allows the library to
//! plug into various implementations (embedded HAL, desktop driver, test double).
use crate::error::TransmitError;
use crate::protocol::transport::can_frame::CanFrame;

/// Contract to queue CAN frames for transmission without blocking.
pub trait CanTransmitter {
    type Error: core::fmt::Debug;
    /// Queue a frame on the bus.
    ///
    /// Return [`TransmitError::NoSpace`] when the hardware cannot take the frame
    /// right now; links retry consecutive frames on the next poll.
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>>;
}

impl<T: CanTransmitter + ?Sized> CanTransmitter for &mut T {
    type Error = T::Error;

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        (**self).transmit(frame)
    }
}

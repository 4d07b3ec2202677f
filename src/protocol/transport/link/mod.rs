//! A single bidirectional ISO-TP link between this node and one peer.
//!
//! The link owns a send buffer of `TX` bytes and a receive buffer of `RX`
//! bytes. It never touches the bus or the clock on its own: every operation
//! that may emit a frame or read the time borrows a [`CanTransmitter`] and a
//! [`MonotonicClock`] from the caller.
//!
//! ```text
//!  send()  ──► SF ─────────────────────────────► peer
//!          └─► FF ──► wait FC ──► CF ... CF ───► peer     (poll releases CFs)
//!
//!  on_frame(SF) ──────────────────────────────► Full     (receive() drains)
//!  on_frame(FF) ──► FC ──► on_frame(CF)... ───► Full
//! ```
pub mod config;
mod receiver;
mod sender;

pub use config::LinkConfig;

use crate::core::{PollStatus, ProtocolResult, ReceiveStatus, SendStatus};
use crate::error::{ConfigError, FrameError, PduError, SendError, TransmitError};
use crate::infra::codec::pci::{self, Pdu, PciKind};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::traits::can_bus::CanTransmitter;
use crate::protocol::transport::traits::clock::MonotonicClock;
use receiver::Receiver;
use sender::Sender;

//==================================================================================EMIT
/// Failure to put an engine-built PDU on the bus.
pub(crate) enum EmitError<E: core::fmt::Debug> {
    Encode(PduError),
    Transmit(TransmitError<E>),
}

impl<E: core::fmt::Debug> From<EmitError<E>> for SendError<E> {
    fn from(err: EmitError<E>) -> Self {
        match err {
            EmitError::Encode(err) => SendError::Encode(err),
            EmitError::Transmit(err) => SendError::Transmit(err),
        }
    }
}

impl<E: core::fmt::Debug> From<EmitError<E>> for FrameError<E> {
    fn from(err: EmitError<E>) -> Self {
        match err {
            EmitError::Encode(err) => FrameError::Pdu(err),
            EmitError::Transmit(err) => FrameError::Transmit(err),
        }
    }
}

/// Encode `pdu` on `id` and hand it to the transmitter.
pub(crate) fn emit<T: CanTransmitter>(
    tx: &mut T,
    id: CanId,
    pdu: &Pdu<'_>,
    padding: Option<u8>,
) -> Result<(), EmitError<T::Error>> {
    let frame = CanFrame::from_pdu(id, pdu, padding).map_err(EmitError::Encode)?;
    tx.transmit(&frame).map_err(EmitError::Transmit)
}

//==================================================================================LINK
/// Bidirectional ISO-TP link with `TX`/`RX`-byte buffers.
///
/// Messages are limited to `min(TX, 4095)` bytes on send and `RX` bytes on
/// receive.
pub struct Link<const TX: usize, const RX: usize> {
    send_id: CanId,
    receive_id: CanId,
    config: LinkConfig,
    sender: Sender<TX>,
    receiver: Receiver<RX>,
}

impl<const TX: usize, const RX: usize> Link<TX, RX> {
    /// Create an idle link transmitting on `send_id` and listening on `receive_id`.
    pub fn new(send_id: CanId, receive_id: CanId, config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(send_id, receive_id, config))
    }

    pub(crate) fn with_valid_config(send_id: CanId, receive_id: CanId, config: LinkConfig) -> Self {
        Self {
            send_id,
            receive_id,
            config,
            sender: Sender::new(),
            receiver: Receiver::new(),
        }
    }

    pub fn send_id(&self) -> CanId {
        self.send_id
    }

    pub fn receive_id(&self) -> CanId {
        self.receive_id
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn send_status(&self) -> SendStatus {
        self.sender.status()
    }

    pub fn receive_status(&self) -> ReceiveStatus {
        self.receiver.status()
    }

    /// Outcome of the last send attempt.
    pub fn send_result(&self) -> ProtocolResult {
        self.sender.result()
    }

    /// Outcome of the last receive attempt.
    pub fn receive_result(&self) -> ProtocolResult {
        self.receiver.result()
    }

    /// Largest payload accepted by [`Link::send`].
    pub const fn send_capacity(&self) -> usize {
        Sender::<TX>::CAPACITY
    }

    /// Largest message that can be reassembled.
    pub const fn receive_capacity(&self) -> usize {
        RX
    }

    /// Drop every transfer and return both directions to idle.
    pub fn reset(&mut self) {
        self.sender.reset();
        self.receiver.reset();
    }

    //==================================================================================SEND
    /// Start sending `payload` to the peer.
    ///
    /// Up to 7 bytes leave immediately as a Single Frame. Longer payloads send
    /// a First Frame here; the remaining Consecutive Frames are released by
    /// [`Link::poll`] as the peer's flow control allows.
    pub fn send<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        tx: &mut T,
        clock: &C,
        payload: &[u8],
    ) -> Result<(), SendError<T::Error>> {
        self.sender
            .send(self.send_id, &self.config, tx, clock, payload)
    }

    //==================================================================================ON_FRAME
    /// Feed the data bytes of a frame received on [`Link::receive_id`].
    ///
    /// Returns `Ok(true)` when a First Frame opened a new reassembly,
    /// `Ok(false)` for every other accepted frame.
    pub fn on_frame<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        tx: &mut T,
        clock: &C,
        data: &[u8],
    ) -> Result<bool, FrameError<T::Error>> {
        let len = data.len();
        if !(2..=crate::core::CAN_FRAME_LEN).contains(&len) {
            return Err(PduError::InvalidDlc { len }.into());
        }

        let kind = PciKind::from_byte(data[0])?;
        match kind {
            PciKind::Single | PciKind::First => {
                if self.receiver.status() != ReceiveStatus::Idle {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Unexpected {} while receiving", kind);
                    self.receiver.reject_unexpected();
                    return Err(FrameError::UnexpectedPdu);
                }
                self.receiver.accept_start();
            }
            PciKind::Consecutive => {
                if self.receiver.status() != ReceiveStatus::InProgress {
                    self.receiver.reject_unexpected();
                    return Err(FrameError::UnexpectedPdu);
                }
            }
            PciKind::FlowControl => {
                if self.sender.status() != SendStatus::InProgress {
                    return Ok(false);
                }
            }
        }

        let pdu = match pci::decode(data) {
            Ok(pdu) => pdu,
            Err(err @ PduError::InvalidFlowStatus { .. }) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Reserved flow status, aborting transfer");
                self.sender.on_invalid_flow_status();
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        match pdu {
            Pdu::Single { data } => self.receiver.on_single(data).map(|()| false),
            Pdu::First { total_len, data } => {
                self.receiver
                    .on_first(self.send_id, &self.config, tx, clock, total_len, data)
            }
            Pdu::Consecutive { sn, data } => self
                .receiver
                .on_consecutive(self.send_id, &self.config, tx, clock, sn, data)
                .map(|()| false),
            Pdu::FlowControl {
                status,
                block_size,
                st_min,
            } => {
                self.sender
                    .on_flow_control(&self.config, clock, status, block_size, st_min);
                Ok(false)
            }
        }
    }

    //==================================================================================RECEIVE
    /// Copy a completed message into `dest` and free the receive buffer.
    ///
    /// Returns the number of bytes copied (truncated to `dest.len()`), or
    /// `None` when no complete message is waiting.
    pub fn receive(&mut self, dest: &mut [u8]) -> Option<usize> {
        self.receiver.take(dest)
    }

    //==================================================================================POLL
    /// Advance both directions: release a pending Consecutive Frame, retry a
    /// deferred Flow-Control frame and enforce the N_Bs / N_Cr deadlines.
    ///
    /// Call periodically; [`PollStatus::may_stop`] tells when polling may pause.
    pub fn poll<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        tx: &mut T,
        clock: &C,
    ) -> PollStatus {
        let send_idle = self.sender.poll(self.send_id, &self.config, tx, clock);
        let receive_idle = self.receiver.poll(self.send_id, &self.config, tx, clock);
        PollStatus {
            send_idle,
            receive_idle,
        }
    }
}

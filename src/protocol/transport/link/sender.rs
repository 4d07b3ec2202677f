//! Transmit half of a link: segmentation, flow-control handling and pacing.
use super::config::LinkConfig;
use super::{emit, EmitError};
use crate::core::{
    ProtocolResult, SendStatus, SequenceNumber, Timestamp, FIRST_FRAME_PAYLOAD,
    MAX_CONSECUTIVE_FRAME_PAYLOAD, MAX_MESSAGE_LEN, MAX_SINGLE_FRAME_PAYLOAD,
};
use crate::error::{SendError, TransmitError};
use crate::infra::codec::pci::{FlowStatus, Pdu};
use crate::infra::codec::separation_time::st_min_to_us;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::traits::can_bus::CanTransmitter;
use crate::protocol::transport::traits::clock::MonotonicClock;

/// Consecutive Frames the peer still allows before its next Flow-Control frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockWindow {
    /// Peer advertised BS = 0.
    Unlimited,
    /// `Remaining(0)` means we are waiting for a Flow-Control frame.
    Remaining(u8),
}

impl BlockWindow {
    fn is_open(self) -> bool {
        !matches!(self, BlockWindow::Remaining(0))
    }

    fn consume(&mut self) {
        if let BlockWindow::Remaining(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}

/// Bookkeeping of a segmented transfer between the First Frame and the last CF.
#[derive(Clone, Copy, Debug)]
struct FlowSession {
    window: BlockWindow,
    /// Effective gap: the peer's STmin raised to our configured floor.
    st_min_us: u32,
    wait_count: u8,
    /// Earliest instant for the next Consecutive Frame.
    timer_st: Timestamp,
    /// Deadline for the next Flow-Control frame (N_Bs).
    timer_bs: Timestamp,
}

#[derive(Clone, Copy, Debug)]
enum SendState {
    Idle,
    InProgress(FlowSession),
    Error,
}

/// Send engine owning a `N`-byte message buffer.
pub(crate) struct Sender<const N: usize> {
    buffer: [u8; N],
    size: usize,
    offset: usize,
    sn: SequenceNumber,
    state: SendState,
    result: ProtocolResult,
}

impl<const N: usize> Sender<N> {
    /// Largest message this engine accepts.
    pub(crate) const CAPACITY: usize = if N < MAX_MESSAGE_LEN {
        N
    } else {
        MAX_MESSAGE_LEN
    };

    pub(crate) const fn new() -> Self {
        Self {
            buffer: [0; N],
            size: 0,
            offset: 0,
            sn: SequenceNumber::FIRST,
            state: SendState::Idle,
            result: ProtocolResult::Ok,
        }
    }

    pub(crate) fn status(&self) -> SendStatus {
        match self.state {
            SendState::Idle => SendStatus::Idle,
            SendState::InProgress(_) => SendStatus::InProgress,
            SendState::Error => SendStatus::Error,
        }
    }

    pub(crate) fn result(&self) -> ProtocolResult {
        self.result
    }

    pub(crate) fn reset(&mut self) {
        self.size = 0;
        self.offset = 0;
        self.sn = SequenceNumber::FIRST;
        self.state = SendState::Idle;
        self.result = ProtocolResult::Ok;
    }

    //==================================================================================SEND
    /// Start a transfer: a Single Frame for up to 7 bytes, otherwise a First
    /// Frame followed by Consecutive Frames released by `poll`.
    pub(crate) fn send<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
        clock: &C,
        payload: &[u8],
    ) -> Result<(), SendError<T::Error>> {
        let size = payload.len();
        if size > Self::CAPACITY {
            #[cfg(feature = "defmt")]
            defmt::warn!("Message size too big: {} > {}", size, Self::CAPACITY);
            return Err(SendError::TooLarge {
                size,
                capacity: Self::CAPACITY,
            });
        }
        if size == 0 {
            return Err(SendError::EmptyPayload);
        }
        if !matches!(self.state, SendState::Idle) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Abort previous message, transmission in progress");
            return Err(SendError::Busy);
        }

        self.buffer[..size].copy_from_slice(payload);

        if size <= MAX_SINGLE_FRAME_PAYLOAD {
            let pdu = Pdu::Single {
                data: &self.buffer[..size],
            };
            emit(tx, id, &pdu, config.padding)?;
            self.size = size;
            self.offset = size;
            self.result = ProtocolResult::Ok;
            return Ok(());
        }

        let pdu = Pdu::First {
            // CAPACITY never exceeds the 12-bit limit.
            total_len: size as u16,
            data: &self.buffer[..FIRST_FRAME_PAYLOAD],
        };
        emit(tx, id, &pdu, config.padding)?;

        let now = clock.now();
        self.size = size;
        self.offset = FIRST_FRAME_PAYLOAD;
        self.sn = SequenceNumber::FIRST;
        self.result = ProtocolResult::Ok;
        self.state = SendState::InProgress(FlowSession {
            // Nothing leaves before the receiver's first Flow-Control frame.
            window: BlockWindow::Remaining(0),
            st_min_us: 0,
            wait_count: 0,
            timer_st: now,
            timer_bs: now.offset(config.timeout_us()),
        });
        #[cfg(feature = "defmt")]
        defmt::debug!("First frame sent on {}, {} bytes", id, size);
        Ok(())
    }

    //==================================================================================FLOW_CONTROL
    /// Apply a Flow-Control frame received while a transfer is running.
    pub(crate) fn on_flow_control<C: MonotonicClock>(
        &mut self,
        config: &LinkConfig,
        clock: &C,
        status: FlowStatus,
        block_size: u8,
        st_min: u8,
    ) {
        let SendState::InProgress(mut session) = self.state else {
            return;
        };
        session.timer_bs = clock.now().offset(config.timeout_us());

        match status {
            FlowStatus::Overflow => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Peer reported buffer overflow");
                self.fail(ProtocolResult::BufferOverflow);
                return;
            }
            FlowStatus::Wait => {
                session.wait_count = session.wait_count.saturating_add(1);
                if session.wait_count > config.max_wait_frames {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Too many wait frames: {}", session.wait_count);
                    self.fail(ProtocolResult::WaitFrameOverrun);
                    return;
                }
            }
            FlowStatus::Continue => {
                session.window = match block_size {
                    0 => BlockWindow::Unlimited,
                    n => BlockWindow::Remaining(n),
                };
                session.st_min_us = st_min_to_us(st_min).max(config.st_min_us);
                session.wait_count = 0;
            }
        }
        self.state = SendState::InProgress(session);
    }

    /// A Flow-Control frame with a reserved status ends the running transfer.
    pub(crate) fn on_invalid_flow_status(&mut self) {
        if matches!(self.state, SendState::InProgress(_)) {
            self.fail(ProtocolResult::InvalidFlowStatus);
        }
    }

    fn fail(&mut self, result: ProtocolResult) {
        self.result = result;
        self.state = SendState::Error;
    }

    //==================================================================================POLL
    /// Release at most one Consecutive Frame and check the N_Bs deadline.
    ///
    /// Returns `true` when the engine is idle after the step. An `Error` state
    /// observed on entry is cleared back to idle.
    pub(crate) fn poll<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
        clock: &C,
    ) -> bool {
        let mut session = match self.state {
            SendState::Idle => return true,
            SendState::Error => {
                self.state = SendState::Idle;
                return true;
            }
            SendState::InProgress(session) => session,
        };

        if session.window.is_open()
            && (session.st_min_us == 0 || clock.now().is_after(session.timer_st))
        {
            match self.transmit_consecutive(id, config, tx) {
                Ok(()) => {
                    session.window.consume();
                    let now = clock.now();
                    session.timer_bs = now.offset(config.timeout_us());
                    session.timer_st = now.offset(session.st_min_us);
                    if self.offset >= self.size {
                        #[cfg(feature = "defmt")]
                        defmt::debug!("Transfer on {} complete", id);
                        self.state = SendState::Idle;
                        return true;
                    }
                }
                Err(EmitError::Transmit(TransmitError::NoSpace)) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("No space for consecutive frame, retrying");
                }
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Consecutive frame transmit failed");
                    self.state = SendState::Error;
                    return false;
                }
            }
        }

        if clock.now().is_after(session.timer_bs) {
            #[cfg(feature = "defmt")]
            defmt::warn!("N_Bs timeout on {}", id);
            self.fail(ProtocolResult::TimeoutBs);
            return false;
        }

        self.state = SendState::InProgress(session);
        false
    }

    fn transmit_consecutive<T: CanTransmitter>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
    ) -> Result<(), EmitError<T::Error>> {
        let len = (self.size - self.offset).min(MAX_CONSECUTIVE_FRAME_PAYLOAD);
        let pdu = Pdu::Consecutive {
            sn: self.sn.value(),
            data: &self.buffer[self.offset..self.offset + len],
        };
        emit(tx, id, &pdu, config.padding)?;
        self.offset += len;
        self.sn = self.sn.next();
        Ok(())
    }
}

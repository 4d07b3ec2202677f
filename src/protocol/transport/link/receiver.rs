//! Receive half of a link: reassembly, flow-control emission and the N_Cr deadline.
use super::config::LinkConfig;
use super::{emit, EmitError};
use crate::core::{
    ProtocolResult, ReceiveStatus, SequenceNumber, Timestamp, FIRST_FRAME_PAYLOAD,
    MAX_CONSECUTIVE_FRAME_PAYLOAD,
};
use crate::error::{FrameError, TransmitError};
use crate::infra::codec::pci::{FlowStatus, Pdu};
use crate::infra::codec::separation_time::us_to_st_min;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::traits::can_bus::CanTransmitter;
use crate::protocol::transport::traits::clock::MonotonicClock;

#[derive(Clone, Copy, Debug)]
enum ReceiveState {
    Idle,
    InProgress {
        /// Consecutive Frames left before we owe the peer a Flow-Control frame.
        bs_count: u8,
        /// Deadline for the next Consecutive Frame (N_Cr).
        timer_cr: Timestamp,
    },
    Full,
}

/// Flow-Control frame the bus refused; retried by `poll`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingFlowControl {
    status: FlowStatus,
    block_size: u8,
    st_min: u8,
}

/// Receive engine owning a `N`-byte reassembly buffer.
pub(crate) struct Receiver<const N: usize> {
    buffer: [u8; N],
    size: usize,
    offset: usize,
    sn: SequenceNumber,
    state: ReceiveState,
    result: ProtocolResult,
    pending_fc: Option<PendingFlowControl>,
}

impl<const N: usize> Receiver<N> {
    pub(crate) const fn new() -> Self {
        Self {
            buffer: [0; N],
            size: 0,
            offset: 0,
            sn: SequenceNumber::FIRST,
            state: ReceiveState::Idle,
            result: ProtocolResult::Ok,
            pending_fc: None,
        }
    }

    pub(crate) fn status(&self) -> ReceiveStatus {
        match self.state {
            ReceiveState::Idle => ReceiveStatus::Idle,
            ReceiveState::InProgress { .. } => ReceiveStatus::InProgress,
            ReceiveState::Full => ReceiveStatus::Full,
        }
    }

    pub(crate) fn result(&self) -> ProtocolResult {
        self.result
    }

    pub(crate) fn reset(&mut self) {
        self.size = 0;
        self.offset = 0;
        self.sn = SequenceNumber::FIRST;
        self.state = ReceiveState::Idle;
        self.result = ProtocolResult::Ok;
        self.pending_fc = None;
    }

    /// Record a frame rejected by the state gate.
    pub(crate) fn reject_unexpected(&mut self) {
        self.result = ProtocolResult::UnexpectedPdu;
    }

    /// A Single or First Frame passed the state gate.
    pub(crate) fn accept_start(&mut self) {
        self.result = ProtocolResult::Ok;
    }

    //==================================================================================SINGLE_FRAME
    pub(crate) fn on_single<E: core::fmt::Debug>(
        &mut self,
        data: &[u8],
    ) -> Result<(), FrameError<E>> {
        if data.len() > N {
            self.result = ProtocolResult::BufferOverflow;
            return Err(FrameError::Overflow {
                declared: data.len(),
                capacity: N,
            });
        }
        self.buffer[..data.len()].copy_from_slice(data);
        self.size = data.len();
        self.offset = data.len();
        self.state = ReceiveState::Full;
        Ok(())
    }

    //==================================================================================FIRST_FRAME
    /// Start a reassembly. Returns `Ok(true)` once the transfer is under way.
    pub(crate) fn on_first<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
        clock: &C,
        total_len: u16,
        data: &[u8],
    ) -> Result<bool, FrameError<T::Error>> {
        // A deferred Flow-Control frame belongs to the previous transfer.
        self.pending_fc = None;
        let declared = total_len as usize;
        if declared > N {
            #[cfg(feature = "defmt")]
            defmt::warn!("Multi-frame response too large for receiving buffer: {}", declared);
            self.result = ProtocolResult::BufferOverflow;
            // The transfer is refused regardless of whether the Overflow frame leaves.
            let _ = self.send_flow_control(id, config, tx, FlowStatus::Overflow, 0, 0);
            return Err(FrameError::Overflow {
                declared,
                capacity: N,
            });
        }

        self.buffer[..FIRST_FRAME_PAYLOAD].copy_from_slice(&data[..FIRST_FRAME_PAYLOAD]);
        self.size = declared;
        self.offset = FIRST_FRAME_PAYLOAD;
        self.sn = SequenceNumber::FIRST;
        self.state = ReceiveState::InProgress {
            bs_count: config.block_size,
            timer_cr: clock.now().offset(config.timeout_us()),
        };
        #[cfg(feature = "defmt")]
        defmt::debug!("First frame received, {} bytes announced", declared);

        self.send_flow_control(
            id,
            config,
            tx,
            FlowStatus::Continue,
            config.block_size,
            us_to_st_min(config.st_min_us),
        )?;
        Ok(true)
    }

    //==================================================================================CONSECUTIVE_FRAME
    pub(crate) fn on_consecutive<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
        clock: &C,
        sn: u8,
        data: &[u8],
    ) -> Result<(), FrameError<T::Error>> {
        let ReceiveState::InProgress { bs_count, .. } = self.state else {
            self.reject_unexpected();
            return Err(FrameError::UnexpectedPdu);
        };

        if sn != self.sn.value() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Wrong sequence number: expected {}, got {}", self.sn.value(), sn);
            self.result = ProtocolResult::WrongSequenceNumber;
            self.state = ReceiveState::Idle;
            self.pending_fc = None;
            return Err(FrameError::WrongSequenceNumber {
                expected: self.sn.value(),
                received: sn,
            });
        }

        let needed = (self.size - self.offset).min(MAX_CONSECUTIVE_FRAME_PAYLOAD);
        if data.len() < needed {
            return Err(FrameError::ConsecutiveFrameTooShort {
                needed,
                available: data.len(),
            });
        }

        self.buffer[self.offset..self.offset + needed].copy_from_slice(&data[..needed]);
        self.offset += needed;
        self.sn = self.sn.next();
        let timer_cr = clock.now().offset(config.timeout_us());

        if self.offset >= self.size {
            #[cfg(feature = "defmt")]
            defmt::debug!("Reassembly complete, {} bytes", self.size);
            self.state = ReceiveState::Full;
            return Ok(());
        }

        // Block size 0: the first Flow-Control frame was the only one.
        if config.block_size == 0 {
            self.state = ReceiveState::InProgress { bs_count, timer_cr };
            return Ok(());
        }

        let bs_count = bs_count.saturating_sub(1);
        if bs_count > 0 {
            self.state = ReceiveState::InProgress { bs_count, timer_cr };
            return Ok(());
        }

        self.state = ReceiveState::InProgress {
            bs_count: config.block_size,
            timer_cr,
        };
        self.send_flow_control(
            id,
            config,
            tx,
            FlowStatus::Continue,
            config.block_size,
            us_to_st_min(config.st_min_us),
        )
    }

    //==================================================================================RECEIVE
    /// Hand a completed message to the caller, truncated to `dest`.
    pub(crate) fn take(&mut self, dest: &mut [u8]) -> Option<usize> {
        if !matches!(self.state, ReceiveState::Full) {
            return None;
        }
        let len = self.size.min(dest.len());
        dest[..len].copy_from_slice(&self.buffer[..len]);
        self.state = ReceiveState::Idle;
        Some(len)
    }

    //==================================================================================POLL
    /// Flush a deferred Flow-Control frame and check the N_Cr deadline.
    ///
    /// Returns `true` when nothing is in progress and nothing is queued.
    pub(crate) fn poll<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
        clock: &C,
    ) -> bool {
        if let Some(fc) = self.pending_fc.take() {
            // A failure re-queues on NoSpace or aborts the reassembly.
            let _ = self.send_flow_control(id, config, tx, fc.status, fc.block_size, fc.st_min);
        }

        if let ReceiveState::InProgress { timer_cr, .. } = self.state {
            if clock.now().is_after(timer_cr) {
                #[cfg(feature = "defmt")]
                defmt::warn!("N_Cr timeout on {}", id);
                self.result = ProtocolResult::TimeoutCr;
                self.state = ReceiveState::Idle;
                self.pending_fc = None;
            }
        }

        !matches!(self.state, ReceiveState::InProgress { .. }) && self.pending_fc.is_none()
    }

    /// Transmit a Flow-Control frame. NoSpace defers it to the next poll; any
    /// other failure aborts a running reassembly.
    fn send_flow_control<T: CanTransmitter>(
        &mut self,
        id: CanId,
        config: &LinkConfig,
        tx: &mut T,
        status: FlowStatus,
        block_size: u8,
        st_min: u8,
    ) -> Result<(), FrameError<T::Error>> {
        let pdu = Pdu::FlowControl {
            status,
            block_size,
            st_min,
        };
        match emit(tx, id, &pdu, config.padding) {
            Ok(()) => Ok(()),
            Err(EmitError::Transmit(TransmitError::NoSpace)) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("No space for flow control, deferring");
                self.pending_fc = Some(PendingFlowControl {
                    status,
                    block_size,
                    st_min,
                });
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Flow control transmit failed on {}", id);
                if matches!(self.state, ReceiveState::InProgress { .. }) {
                    self.state = ReceiveState::Idle;
                }
                Err(err.into())
            }
        }
    }
}

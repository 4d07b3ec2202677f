//! Value types shared by the codec, the link state machines, and the addressing layer.
//!
//! Everything here is `Copy`, allocation-free and independent of the CAN driver.

//==================================================================================CONSTANTS
/// Largest payload a First Frame can announce (12-bit length field).
pub const MAX_MESSAGE_LEN: usize = 4095;
/// Largest payload carried by a Single Frame on classic CAN.
pub const MAX_SINGLE_FRAME_PAYLOAD: usize = 7;
/// Payload bytes carried by a First Frame.
pub const FIRST_FRAME_PAYLOAD: usize = 6;
/// Largest payload carried by a Consecutive Frame.
pub const MAX_CONSECUTIVE_FRAME_PAYLOAD: usize = 7;
/// Classic CAN data length.
pub const CAN_FRAME_LEN: usize = 8;

/// Block size advertised to senders when none is configured.
pub const DEFAULT_BLOCK_SIZE: u8 = 8;
/// Separation time advertised to senders, and floor applied when sending (µs).
pub const DEFAULT_ST_MIN_US: u32 = 0;
/// Consecutive FC WAIT frames tolerated before a send is aborted.
pub const DEFAULT_MAX_WAIT_FRAMES: u8 = 1;
/// N_Bs / N_Cr deadline (ms).
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 100;

//==================================================================================TIMESTAMP
/// Reading of the caller's monotonic microsecond clock.
///
/// The counter is 32 bits wide and wraps after ~71 minutes. Comparisons go
/// through [`Timestamp::is_after`], which stays correct across the wrap as long
/// as the two instants are less than 2^31 µs apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Wrap a raw microsecond count.
    pub const fn from_micros(us: u32) -> Self {
        Self(us)
    }

    /// Raw microsecond count.
    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Instant `us` microseconds later, wrapping with the counter.
    pub const fn offset(self, us: u32) -> Self {
        Self(self.0.wrapping_add(us))
    }

    /// `true` when `self` lies strictly after `other` on the wrapping timeline.
    pub const fn is_after(self, other: Timestamp) -> bool {
        (other.0.wrapping_sub(self.0) as i32) < 0
    }
}

//==================================================================================SEQUENCE_NUMBER
/// 4-bit Consecutive Frame sequence number, always in `0..=15`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceNumber(u8);

impl SequenceNumber {
    /// Sequence number of the first Consecutive Frame after a First Frame.
    pub const FIRST: Self = Self(1);

    /// Build from a raw nibble; upper bits are discarded.
    pub const fn new(raw: u8) -> Self {
        Self(raw & 0x0F)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Following sequence number (15 wraps to 0).
    pub const fn next(self) -> Self {
        Self((self.0 + 1) & 0x0F)
    }
}

//==================================================================================STATUSES
/// Externally visible state of a link's send engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendStatus {
    /// Ready to accept a new message.
    Idle,
    /// A segmented transfer is running; `poll` must keep being called.
    InProgress,
    /// The last transfer aborted; cleared to `Idle` by the next `poll`.
    Error,
}

/// Externally visible state of a link's receive engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveStatus {
    /// Waiting for a Single or First Frame.
    Idle,
    /// Reassembling a segmented message.
    InProgress,
    /// A complete message waits to be drained with `receive`.
    Full,
}

/// Last terminal or diagnostic outcome recorded by an engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolResult {
    #[default]
    Ok,
    /// Consecutive Frame arrived out of order.
    WrongSequenceNumber,
    /// Declared length exceeded the receive buffer (local or remote).
    BufferOverflow,
    /// No Flow-Control frame before the N_Bs deadline.
    TimeoutBs,
    /// No Consecutive Frame before the N_Cr deadline.
    TimeoutCr,
    /// More consecutive FC WAIT frames than allowed.
    WaitFrameOverrun,
    /// Flow-Control frame carried a reserved flow status.
    InvalidFlowStatus,
    /// Frame type not acceptable in the current state.
    UnexpectedPdu,
}

//==================================================================================POLL_STATUS
/// Hint returned by the poll driver.
///
/// Callers use it to stop scheduling periodic polls once no timer-driven work remains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollStatus {
    /// No send in progress or awaiting error clearance.
    pub send_idle: bool,
    /// No reassembly in progress and no pending Flow-Control frame.
    pub receive_idle: bool,
}

impl PollStatus {
    /// Both engines are quiescent; periodic polling may stop.
    pub const fn may_stop(self) -> bool {
        self.send_idle && self.receive_idle
    }

    /// Conjunction of two hints (used when polling several links).
    pub const fn and(self, other: PollStatus) -> PollStatus {
        PollStatus {
            send_idle: self.send_idle && other.send_idle,
            receive_idle: self.receive_idle && other.receive_idle,
        }
    }

    pub(crate) const IDLE: PollStatus = PollStatus {
        send_idle: true,
        receive_idle: true,
    };
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;

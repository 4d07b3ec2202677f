//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame decoding, transmission,
//! send/receive state machine rejections, address derivation, configuration).
use crate::protocol::transport::can_id::CanId;
use thiserror_no_std::Error;

//==================================================================================PDU_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Malformed ISO-TP frame content (the LengthError family).
pub enum PduError {
    /// Classic CAN frames carry 2 to 8 bytes of ISO-TP data.
    #[error("Invalid frame length: {len}")]
    InvalidDlc { len: usize },
    /// Single Frame declares 0 bytes or more than the frame carries.
    #[error("Single frame declares {declared} bytes, {available} available")]
    SingleFrameLength { declared: u8, available: usize },
    /// First Frame must occupy the whole 8-byte frame.
    #[error("First frame should be 8 bytes, got {len}")]
    FirstFrameDlc { len: usize },
    /// First Frame announces a payload that fits a Single Frame.
    #[error("First frame declares {declared} bytes: should not use multiple frame transmission")]
    FirstFrameLength { declared: u16 },
    /// Flow-Control frame shorter than PCI + BS + STmin.
    #[error("Flow control frame too short: {len}")]
    FlowControlTooShort { len: usize },
    /// Flow status nibble outside Continue/Wait/Overflow.
    #[error("Reserved flow status {status}")]
    InvalidFlowStatus { status: u8 },
    /// PCI type nibble outside 0..=3.
    #[error("Unknown PCI type {pci}")]
    UnknownPci { pci: u8 },
    /// Payload length cannot be represented by the requested frame kind.
    #[error("Payload length {len} does not fit the frame kind")]
    PayloadLength { len: usize },
}

//==================================================================================TRANSMIT_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failure reported by a [`CanTransmitter`](crate::protocol::transport::traits::can_bus::CanTransmitter).
pub enum TransmitError<E: core::fmt::Debug> {
    /// Transmit mailboxes are full right now; retry later.
    #[error("No space to transmit")]
    NoSpace,
    /// The driver rejected the frame.
    #[error("CAN bus error: {0:?}")]
    Bus(E),
}

//==================================================================================SEND_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Rejection of a `send` call. The link state is unchanged in every case.
pub enum SendError<E: core::fmt::Debug> {
    /// Nothing to send.
    #[error("Payload is empty")]
    EmptyPayload,
    /// Payload larger than the link's send capacity.
    #[error("Attempted to send {size} bytes; max size is {capacity}")]
    TooLarge { size: usize, capacity: usize },
    /// A segmented transfer is still running or awaiting error clearance.
    #[error("Can only send when send status is idle")]
    Busy,
    /// No link talks to the requested peer address.
    #[error("No link to peer {address}")]
    UnknownPeer { address: u8 },
    /// The Single or First Frame could not be encoded.
    #[error(transparent)]
    Encode(PduError),
    /// The Single or First Frame could not be transmitted.
    #[error("Transmit failed: {0}")]
    Transmit(TransmitError<E>),
}

impl<E: core::fmt::Debug> From<TransmitError<E>> for SendError<E> {
    fn from(err: TransmitError<E>) -> Self {
        SendError::Transmit(err)
    }
}

//==================================================================================FRAME_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Reason an incoming frame was dropped.
pub enum FrameError<E: core::fmt::Debug> {
    /// Frame content is malformed.
    #[error(transparent)]
    Pdu(PduError),
    /// Frame type cannot be accepted in the current receive state.
    #[error("Unexpected PDU")]
    UnexpectedPdu,
    /// Consecutive Frame out of order; the reassembly was aborted.
    #[error("Wrong sequence number: expected {expected}, received {received}")]
    WrongSequenceNumber { expected: u8, received: u8 },
    /// Consecutive Frame carries fewer bytes than the message still needs.
    #[error("Consecutive frame too short: needed {needed}, available {available}")]
    ConsecutiveFrameTooShort { needed: usize, available: usize },
    /// First Frame announces more than the receive buffer holds.
    #[error("Multi-frame message of {declared} bytes too large for {capacity} byte buffer")]
    Overflow { declared: usize, capacity: usize },
    /// A Flow-Control frame could not be transmitted.
    #[error("Flow control transmit failed: {0}")]
    Transmit(TransmitError<E>),
    /// No link listens on the frame's identifier.
    #[error("No link for receive id {id:?}")]
    NoMatchingLink { id: CanId },
}

impl<E: core::fmt::Debug> From<PduError> for FrameError<E> {
    fn from(err: PduError) -> Self {
        FrameError::Pdu(err)
    }
}

//==================================================================================ADDRESS_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while deriving arbitration identifiers from logical addresses.
pub enum AddressError {
    /// Logical addresses are 5 bits wide.
    #[error("Address {address} out of range (0-31)")]
    AddressOutOfRange { address: u8 },
    /// A node cannot open a link to itself.
    #[error("Peer address {address} equals the local address")]
    PeerIsSelf { address: u8 },
    /// Two links would share the same receive identifier.
    #[error("Peer address {address} listed twice")]
    DuplicatePeer { address: u8 },
    /// At most 32 distinct logical addresses exist.
    #[error("Too many peers: {count}")]
    TooManyPeers { count: usize },
}

//==================================================================================CONFIG_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Rejected [`LinkConfig`](crate::protocol::transport::link::config::LinkConfig).
pub enum ConfigError {
    /// Timeout is zero or exceeds the wraparound comparison window.
    #[error("Invalid response timeout: {micros} us")]
    InvalidResponseTimeout { micros: u64 },
    /// STmin above 127 ms cannot be advertised.
    #[error("Separation time {micros} us cannot be encoded")]
    InvalidSeparationTime { micros: u32 },
}

//==================================================================================LINK_MANAGER_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Rejected [`LinkManager`](crate::protocol::managment::link_manager::LinkManager) construction.
pub enum LinkManagerError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

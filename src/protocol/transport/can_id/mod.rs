//! Creation and extraction of the 11-bit arbitration identifiers used by
//! ISO-TP links.
//!
//! Layout of an ISO-TP identifier:
//!
//! | Bits  | Field                                   |
//! |-------|-----------------------------------------|
//! | 10    | `1` = ISO-TP frame, `0` = other traffic |
//! | 9..5  | sender logical address (5 bits)         |
//! | 4..0  | receiver logical address (5 bits)       |
use crate::error::AddressError;
use embedded_can::StandardId;

/// Width of a logical node address.
pub const ADDRESS_BITS: u8 = 5;
/// Mask of a logical node address (0x1F).
pub const ADDRESS_MASK: u8 = (1 << ADDRESS_BITS) - 1;
/// Number of distinct logical addresses.
pub const MAX_ADDRESSES: usize = 1 << ADDRESS_BITS;
/// Bit marking a frame as ISO-TP traffic.
pub const ISOTP_FLAG: u16 = 1 << (ADDRESS_BITS * 2);

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Standard CAN identifier stored in a `u16`. Bits above 10 are unused.
pub struct CanId(pub u16);

impl CanId {
    // Builder entry point
    /// Creates a `CanIdBuilder` for a frame sent by `sender` to `receiver`.
    pub fn builder(sender: u8, receiver: u8) -> CanIdBuilder {
        CanIdBuilder::new(sender, receiver)
    }

    /// Raw identifier value.
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// `true` when bit 10 marks the frame as ISO-TP traffic.
    pub fn is_isotp(&self) -> bool {
        self.0 & ISOTP_FLAG != 0
    }

    /// Logical address of the transmitting node (bits 9..5).
    pub fn sender(&self) -> u8 {
        ((self.0 >> ADDRESS_BITS) as u8) & ADDRESS_MASK
    }

    /// Logical address of the destination node (bits 4..0).
    pub fn receiver(&self) -> u8 {
        (self.0 as u8) & ADDRESS_MASK
    }

    /// Identifier as an `embedded-can` standard ID.
    pub fn standard_id(&self) -> StandardId {
        StandardId::new(self.0 & StandardId::MAX.as_raw()).unwrap_or(StandardId::ZERO)
    }
}

impl From<StandardId> for CanId {
    fn from(id: StandardId) -> Self {
        CanId(id.as_raw())
    }
}

impl From<CanId> for embedded_can::Id {
    fn from(id: CanId) -> Self {
        embedded_can::Id::Standard(id.standard_id())
    }
}

//==================================================================================CAN_ID_BUILDER
#[derive(Debug)]
/// Fluent builder that validates logical addresses before packing them.
pub struct CanIdBuilder {
    pub sender: u8,
    pub receiver: u8,
}

impl CanIdBuilder {
    /// Initializes the builder for a sender/receiver pair.
    pub fn new(sender: u8, receiver: u8) -> Self {
        Self { sender, receiver }
    }

    /// Overrides the sending node.
    pub fn from_sender(mut self, sender: u8) -> Self {
        self.sender = sender;
        self
    }

    /// Overrides the destination node.
    pub fn to_receiver(mut self, receiver: u8) -> Self {
        self.receiver = receiver;
        self
    }

    /// Packs the ISO-TP flag and both 5-bit addresses.
    ///
    /// Addresses above 31 are rejected rather than silently masked, so two peers
    /// can never collapse onto the same identifier.
    pub fn build(self) -> Result<CanId, AddressError> {
        for address in [self.sender, self.receiver] {
            if address > ADDRESS_MASK {
                return Err(AddressError::AddressOutOfRange { address });
            }
        }
        let id = ISOTP_FLAG | ((self.sender as u16) << ADDRESS_BITS) | self.receiver as u16;
        Ok(CanId(id))
    }
}

/// Identifier this node transmits on when talking to `peer`.
pub fn send_id(local: u8, peer: u8) -> Result<CanId, AddressError> {
    CanId::builder(local, peer).build()
}

/// Identifier this node listens on for traffic from `peer`.
pub fn receive_id(local: u8, peer: u8) -> Result<CanId, AddressError> {
    CanId::builder(peer, local).build()
}

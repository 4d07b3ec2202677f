//! In-memory representation of a classic CAN frame carrying ISO-TP data.
use crate::core::CAN_FRAME_LEN;
use crate::error::PduError;
use crate::infra::codec::pci::{self, Pdu};
use crate::protocol::transport::can_id::CanId;
use embedded_can::Id;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Raw ISO-TP frame as written to or read from the CAN bus.
pub struct CanFrame {
    /// 11-bit arbitration identifier.
    pub id: CanId,
    /// Payload buffer. Bytes past `len` are meaningless.
    pub data: [u8; CAN_FRAME_LEN],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Encode a PDU for transmission on `id`.
    pub fn from_pdu(id: CanId, pdu: &Pdu<'_>, padding: Option<u8>) -> Result<Self, PduError> {
        let mut data = [0u8; CAN_FRAME_LEN];
        let len = pci::encode(pdu, padding, &mut data)?;
        Ok(Self { id, data, len })
    }

    /// Copy a driver frame. Extended and remote frames are never ISO-TP traffic here.
    pub fn from_frame<F: embedded_can::Frame>(frame: &F) -> Option<Self> {
        if frame.is_remote_frame() {
            return None;
        }
        <Self as embedded_can::Frame>::new(frame.id(), frame.data())
    }

    /// Valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) if data.len() <= CAN_FRAME_LEN => {
                let mut buffer = [0u8; CAN_FRAME_LEN];
                buffer[..data.len()].copy_from_slice(data);
                Some(Self {
                    id: id.into(),
                    data: buffer,
                    len: data.len(),
                })
            }
            _ => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id.into()
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

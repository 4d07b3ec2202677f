//! Protocol Control Information (PCI) codec for the four ISO-TP frame kinds.
//!
//! | Frame       | Byte 0              | Byte 1     | Remaining           |
//! |-------------|---------------------|------------|---------------------|
//! | Single      | `0x0_` \| len (1-7) | payload[0] | payload[1..len]     |
//! | First       | `0x1_` \| len[11:8] | len[7:0]   | payload[0..6]       |
//! | Consecutive | `0x2_` \| SN        | payload[0] | payload[1..=6]      |
//! | FlowControl | `0x3_` \| FS        | BS         | STmin               |
//!
//! Decoding borrows the payload from the received bytes; encoding writes into a
//! fixed 8-byte buffer and reports the natural (or padded) length.
use crate::core::{
    CAN_FRAME_LEN, FIRST_FRAME_PAYLOAD, MAX_CONSECUTIVE_FRAME_PAYLOAD, MAX_MESSAGE_LEN,
    MAX_SINGLE_FRAME_PAYLOAD,
};
use crate::error::PduError;

const PCI_SINGLE: u8 = 0x0;
const PCI_FIRST: u8 = 0x1;
const PCI_CONSECUTIVE: u8 = 0x2;
const PCI_FLOW_CONTROL: u8 = 0x3;

/// Smallest frame the codec accepts: PCI byte plus at least one data byte.
const MIN_FRAME_LEN: usize = 2;
/// PCI + BS + STmin.
const FLOW_CONTROL_LEN: usize = 3;

//==================================================================================PCI_KIND
/// Frame kind carried in the PCI high nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PciKind {
    Single,
    First,
    Consecutive,
    FlowControl,
}

impl PciKind {
    /// Classify a frame from its first byte without validating the rest.
    pub fn from_byte(byte0: u8) -> Result<Self, PduError> {
        match byte0 >> 4 {
            PCI_SINGLE => Ok(PciKind::Single),
            PCI_FIRST => Ok(PciKind::First),
            PCI_CONSECUTIVE => Ok(PciKind::Consecutive),
            PCI_FLOW_CONTROL => Ok(PciKind::FlowControl),
            pci => Err(PduError::UnknownPci { pci }),
        }
    }
}

//==================================================================================FLOW_STATUS
/// Flow status sent by a receiver in a Flow-Control frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowStatus {
    /// Clear to send the next block.
    Continue,
    /// Hold on; another Flow-Control frame follows.
    Wait,
    /// Receiver cannot store the announced message.
    Overflow,
}

impl FlowStatus {
    fn nibble(self) -> u8 {
        match self {
            FlowStatus::Continue => 0x0,
            FlowStatus::Wait => 0x1,
            FlowStatus::Overflow => 0x2,
        }
    }

    fn from_nibble(status: u8) -> Result<Self, PduError> {
        match status {
            0x0 => Ok(FlowStatus::Continue),
            0x1 => Ok(FlowStatus::Wait),
            0x2 => Ok(FlowStatus::Overflow),
            status => Err(PduError::InvalidFlowStatus { status }),
        }
    }
}

//==================================================================================PDU
/// Decoded ISO-TP protocol data unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pdu<'a> {
    /// Whole message in one frame; `data.len()` is the SF_DL.
    Single { data: &'a [u8] },
    /// Start of a segmented message: announced total length and the first 6 bytes.
    First { total_len: u16, data: &'a [u8] },
    /// Continuation: sequence number nibble and every byte after the PCI
    /// (trailing padding included, the receiver trims to the remaining length).
    Consecutive { sn: u8, data: &'a [u8] },
    /// Receiver feedback. `st_min` stays in its raw byte form.
    FlowControl {
        status: FlowStatus,
        block_size: u8,
        st_min: u8,
    },
}

impl Pdu<'_> {
    pub fn kind(&self) -> PciKind {
        match self {
            Pdu::Single { .. } => PciKind::Single,
            Pdu::First { .. } => PciKind::First,
            Pdu::Consecutive { .. } => PciKind::Consecutive,
            Pdu::FlowControl { .. } => PciKind::FlowControl,
        }
    }
}

//==================================================================================DECODE
/// Decode the data bytes of a received CAN frame.
pub fn decode(frame: &[u8]) -> Result<Pdu<'_>, PduError> {
    let len = frame.len();
    if !(MIN_FRAME_LEN..=CAN_FRAME_LEN).contains(&len) {
        return Err(PduError::InvalidDlc { len });
    }

    let low_nibble = frame[0] & 0x0F;
    match PciKind::from_byte(frame[0])? {
        PciKind::Single => {
            let declared = low_nibble;
            let available = len - 1;
            if declared == 0 || declared as usize > available {
                return Err(PduError::SingleFrameLength {
                    declared,
                    available,
                });
            }
            Ok(Pdu::Single {
                data: &frame[1..1 + declared as usize],
            })
        }
        PciKind::First => {
            if len != CAN_FRAME_LEN {
                return Err(PduError::FirstFrameDlc { len });
            }
            // 12-bit length: high nibble in byte 0, low byte in byte 1.
            let total_len = ((low_nibble as u16) << 8) | frame[1] as u16;
            if total_len as usize <= MAX_SINGLE_FRAME_PAYLOAD {
                return Err(PduError::FirstFrameLength {
                    declared: total_len,
                });
            }
            Ok(Pdu::First {
                total_len,
                data: &frame[2..],
            })
        }
        PciKind::Consecutive => Ok(Pdu::Consecutive {
            sn: low_nibble,
            data: &frame[1..],
        }),
        PciKind::FlowControl => {
            if len < FLOW_CONTROL_LEN {
                return Err(PduError::FlowControlTooShort { len });
            }
            Ok(Pdu::FlowControl {
                status: FlowStatus::from_nibble(low_nibble)?,
                block_size: frame[1],
                st_min: frame[2],
            })
        }
    }
}

//==================================================================================ENCODE
/// Encode `pdu` into `out` and return the number of bytes to transmit.
///
/// With `padding = Some(fill)` the unused tail is filled and the full 8 bytes
/// are reported; otherwise the frame keeps its natural length. First Frames
/// always occupy 8 bytes.
pub fn encode(
    pdu: &Pdu<'_>,
    padding: Option<u8>,
    out: &mut [u8; CAN_FRAME_LEN],
) -> Result<usize, PduError> {
    let used = match *pdu {
        Pdu::Single { data } => {
            let len = data.len();
            if len == 0 || len > MAX_SINGLE_FRAME_PAYLOAD {
                return Err(PduError::PayloadLength { len });
            }
            out[0] = (PCI_SINGLE << 4) | len as u8;
            out[1..1 + len].copy_from_slice(data);
            1 + len
        }
        Pdu::First { total_len, data } => {
            let total = total_len as usize;
            if total <= MAX_SINGLE_FRAME_PAYLOAD || total > MAX_MESSAGE_LEN {
                return Err(PduError::FirstFrameLength {
                    declared: total_len,
                });
            }
            if data.len() != FIRST_FRAME_PAYLOAD {
                return Err(PduError::PayloadLength { len: data.len() });
            }
            out[0] = (PCI_FIRST << 4) | ((total_len >> 8) as u8 & 0x0F);
            out[1] = (total_len & 0xFF) as u8;
            out[2..].copy_from_slice(data);
            CAN_FRAME_LEN
        }
        Pdu::Consecutive { sn, data } => {
            let len = data.len();
            if len == 0 || len > MAX_CONSECUTIVE_FRAME_PAYLOAD {
                return Err(PduError::PayloadLength { len });
            }
            out[0] = (PCI_CONSECUTIVE << 4) | (sn & 0x0F);
            out[1..1 + len].copy_from_slice(data);
            1 + len
        }
        Pdu::FlowControl {
            status,
            block_size,
            st_min,
        } => {
            out[0] = (PCI_FLOW_CONTROL << 4) | status.nibble();
            out[1] = block_size;
            out[2] = st_min;
            FLOW_CONTROL_LEN
        }
    };

    match padding {
        Some(fill) => {
            out[used..].fill(fill);
            Ok(CAN_FRAME_LEN)
        }
        None => Ok(used),
    }
}

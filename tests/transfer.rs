//! End-to-end transfers between two links: single frames, segmented messages,
//! sequence number wrap and block-size driven flow control.
mod helpers;

use helpers::{pattern, pump, ManualClock, RecordingBus};
use isotp_link::core::{ProtocolResult, ReceiveStatus, SendStatus};
use isotp_link::protocol::transport::can_id::{receive_id, send_id};
use isotp_link::protocol::transport::link::{Link, LinkConfig};

const NODE_A: u8 = 0x01;
const NODE_B: u8 = 0x10;

/// Two links facing each other: A (0x01) and B (0x10).
fn pair<const TX: usize, const RX: usize>(
    config_a: LinkConfig,
    config_b: LinkConfig,
) -> (Link<TX, RX>, Link<TX, RX>) {
    let a = Link::new(
        send_id(NODE_A, NODE_B).unwrap(),
        receive_id(NODE_A, NODE_B).unwrap(),
        config_a,
    )
    .unwrap();
    let b = Link::new(
        send_id(NODE_B, NODE_A).unwrap(),
        receive_id(NODE_B, NODE_A).unwrap(),
        config_b,
    )
    .unwrap();
    (a, b)
}

//==================================================================================SINGLE_FRAME
#[test]
/// Every Single Frame size reaches the peer unchanged.
fn test_single_frame_every_size() {
    let (mut a, mut b) = pair::<64, 64>(LinkConfig::default(), LinkConfig::default());
    let mut bus_a = RecordingBus::new();
    let mut bus_b = RecordingBus::new();
    let clock = ManualClock::new(0);

    for len in 1..=7 {
        let payload = pattern(len);
        a.send(&mut bus_a, &clock, &payload).unwrap();

        let frames = bus_a.take_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, a.send_id());
        assert_eq!(frames[0].id, b.receive_id());
        assert_eq!(frames[0].data[0], len as u8);

        assert_eq!(b.on_frame(&mut bus_b, &clock, frames[0].payload()), Ok(false));
        assert_eq!(b.receive_status(), ReceiveStatus::Full);

        let mut out = [0u8; 64];
        assert_eq!(b.receive(&mut out), Some(len));
        assert_eq!(&out[..len], payload.as_slice());
        assert!(bus_b.is_empty());
    }
}

//==================================================================================MULTI_FRAME
#[test]
/// The canonical 12-byte exchange: First Frame, Flow Control, one Consecutive Frame.
fn test_twelve_byte_message_wire_format() {
    let (mut a, mut b) = pair::<64, 64>(LinkConfig::default(), LinkConfig::default());
    let mut bus_a = RecordingBus::new();
    let mut bus_b = RecordingBus::new();
    let clock = ManualClock::new(0);
    let payload: Vec<u8> = (0..12).collect();

    a.send(&mut bus_a, &clock, &payload).unwrap();
    let exchange = pump(&mut a, &mut bus_a, &mut b, &mut bus_b, &clock, 1_000, 100);

    let wire: Vec<Vec<u8>> = exchange.wire.iter().map(|f| f.payload().to_vec()).collect();
    assert_eq!(
        wire,
        vec![
            vec![0x10, 0x0C, 0, 1, 2, 3, 4, 5],
            vec![0x30, 0x08, 0x00],
            vec![0x21, 6, 7, 8, 9, 10, 11],
        ]
    );
    assert!(exchange.errors.is_empty());
    assert_eq!(exchange.wire[1].id, b.send_id());

    let mut out = [0u8; 64];
    assert_eq!(b.receive(&mut out), Some(12));
    assert_eq!(&out[..12], payload.as_slice());
    assert_eq!(a.send_status(), SendStatus::Idle);
    assert_eq!(a.send_result(), ProtocolResult::Ok);
}

#[test]
/// 200 bytes: 28 Consecutive Frames whose sequence numbers wrap 15 → 0, and a
/// Flow-Control frame after every block of 8.
fn test_sequence_numbers_wrap_and_blocks() {
    let (mut a, mut b) = pair::<256, 256>(LinkConfig::default(), LinkConfig::default());
    let mut bus_a = RecordingBus::new();
    let mut bus_b = RecordingBus::new();
    let clock = ManualClock::new(0);
    let payload = pattern(200);

    a.send(&mut bus_a, &clock, &payload).unwrap();
    let exchange = pump(&mut a, &mut bus_a, &mut b, &mut bus_b, &clock, 1_000, 1_000);
    assert!(exchange.errors.is_empty());

    let sequence: Vec<u8> = exchange
        .wire
        .iter()
        .filter(|f| f.data[0] >> 4 == 0x2)
        .map(|f| f.data[0] & 0x0F)
        .collect();
    let expected: Vec<u8> = (1..=28u8).map(|n| n % 16).collect();
    assert_eq!(sequence, expected);

    let flow_controls = exchange
        .wire
        .iter()
        .filter(|f| f.id == b.send_id())
        .count();
    // After the First Frame, then after CF 8, 16 and 24.
    assert_eq!(flow_controls, 4);

    let mut out = [0u8; 256];
    assert_eq!(b.receive(&mut out), Some(200));
    assert_eq!(&out[..200], payload.as_slice());
}

#[test]
/// A receiver advertising block size 0 sends a single Flow-Control frame for
/// the largest message.
fn test_max_length_with_unlimited_block() {
    let receiver = LinkConfig::default().with_block_size(0);
    let (mut a, mut b) = pair::<4095, 4095>(LinkConfig::default(), receiver);
    let mut bus_a = RecordingBus::new();
    let mut bus_b = RecordingBus::new();
    let clock = ManualClock::new(0);
    let payload = pattern(4095);

    a.send(&mut bus_a, &clock, &payload).unwrap();
    let exchange = pump(&mut a, &mut bus_a, &mut b, &mut bus_b, &clock, 100, 10_000);
    assert!(exchange.errors.is_empty());

    let flow_controls: Vec<_> = exchange
        .wire
        .iter()
        .filter(|f| f.id == b.send_id())
        .collect();
    assert_eq!(flow_controls.len(), 1);
    assert_eq!(flow_controls[0].payload(), &[0x30, 0x00, 0x00]);
    // 6 bytes in the First Frame, 4089 in ⌈4089 / 7⌉ Consecutive Frames.
    assert_eq!(exchange.wire.len(), 1 + 1 + 585);

    let mut out = vec![0u8; 4095];
    assert_eq!(b.receive(&mut out), Some(4095));
    assert_eq!(out, payload);
}

#[test]
/// Both directions of one link pair run at the same time.
fn test_full_duplex_transfers() {
    let (mut a, mut b) = pair::<128, 128>(LinkConfig::default(), LinkConfig::default());
    let mut bus_a = RecordingBus::new();
    let mut bus_b = RecordingBus::new();
    let clock = ManualClock::new(0);
    let to_b = pattern(100);
    let to_a: Vec<u8> = pattern(77).into_iter().rev().collect();

    a.send(&mut bus_a, &clock, &to_b).unwrap();
    b.send(&mut bus_b, &clock, &to_a).unwrap();
    let exchange = pump(&mut a, &mut bus_a, &mut b, &mut bus_b, &clock, 1_000, 1_000);
    assert!(exchange.errors.is_empty());

    let mut out = [0u8; 128];
    assert_eq!(b.receive(&mut out), Some(100));
    assert_eq!(&out[..100], to_b.as_slice());
    assert_eq!(a.receive(&mut out), Some(77));
    assert_eq!(&out[..77], to_a.as_slice());
}

#[test]
/// Deadlines keep working when the microsecond counter wraps mid-transfer.
fn test_transfer_across_clock_wrap() {
    let (mut a, mut b) = pair::<64, 64>(LinkConfig::default(), LinkConfig::default());
    let mut bus_a = RecordingBus::new();
    let mut bus_b = RecordingBus::new();
    let clock = ManualClock::new(u32::MAX - 2_500);
    let payload = pattern(60);

    a.send(&mut bus_a, &clock, &payload).unwrap();
    let exchange = pump(&mut a, &mut bus_a, &mut b, &mut bus_b, &clock, 1_000, 100);
    assert!(exchange.errors.is_empty());
    assert_eq!(a.send_result(), ProtocolResult::Ok);
    assert_eq!(b.receive_result(), ProtocolResult::Ok);

    let mut out = [0u8; 64];
    assert_eq!(b.receive(&mut out), Some(60));
    assert_eq!(&out[..60], payload.as_slice());
}

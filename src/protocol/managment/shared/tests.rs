//! Exclusive access and single-frame traffic through the shared wrapper.
use super::*;
use crate::core::{ReceiveStatus, SendStatus, Timestamp};
use crate::error::TransmitError;
use crate::protocol::transport::link::LinkConfig;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;

/// Transmitter keeping only the last frame.
#[derive(Default)]
struct LastFrame(Option<CanFrame>);

impl CanTransmitter for LastFrame {
    type Error = ();

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError<()>> {
        self.0 = Some(frame.clone());
        Ok(())
    }
}

fn clock() -> impl MonotonicClock {
    || 0u32
}

#[test]
/// A single frame sent through one handle lands in the peer's handle.
fn test_shared_single_frame_exchange() {
    let config = LinkConfig::default();
    let node_a: SharedLinks<NoopRawMutex, 1, 16, 16> =
        SharedLinks::new(LinkManager::new(0x01, [0x02], config).unwrap());
    let node_b: SharedLinks<NoopRawMutex, 1, 16, 16> =
        SharedLinks::new(LinkManager::new(0x02, [0x01], config).unwrap());
    let mut bus = LastFrame::default();
    let now = clock();

    node_a.send(&mut bus, &now, 0x02, &[1, 2, 3]).unwrap();
    let frame = bus.0.take().expect("single frame");
    assert_eq!(node_b.dispatch(&mut bus, &now, &frame), Ok(false));

    let mut out = [0u8; 8];
    assert_eq!(node_b.receive(0x01, &mut out), Some(3));
    assert_eq!(&out[..3], &[1, 2, 3]);
    assert!(node_a.poll_all(&mut bus, &now).may_stop());
}

#[test]
fn test_shared_unknown_peer() {
    let shared: SharedLinks<NoopRawMutex, 1, 16, 16> =
        SharedLinks::new(LinkManager::new(0x01, [0x02], LinkConfig::default()).unwrap());
    let mut bus = LastFrame::default();

    assert_eq!(
        shared.send(&mut bus, &clock(), 0x05, &[1]),
        Err(SendError::UnknownPeer { address: 0x05 })
    );
    assert_eq!(shared.receive(0x05, &mut [0u8; 4]), None);
}

#[test]
/// `lock` exposes the manager; `into_inner` gives it back.
fn test_shared_lock_and_into_inner() {
    let shared: SharedLinks<NoopRawMutex, 2, 16, 16> = SharedLinks::new(
        LinkManager::new(0x01, [0x02, 0x03], LinkConfig::default()).unwrap(),
    );
    let mut bus = LastFrame::default();
    let start = Timestamp::from_micros(0);

    shared.lock(|manager| {
        let link = manager.link_for_peer(0x03).unwrap();
        link.send(&mut bus, &|| start.as_micros(), &[0xAA; 10]).unwrap();
    });
    let manager = shared.into_inner();
    assert_eq!(manager.links()[1].send_status(), SendStatus::InProgress);
    assert_eq!(manager.links()[0].receive_status(), ReceiveStatus::Idle);
}

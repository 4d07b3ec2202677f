/// Test doubles to simulate the CAN bus and the microsecond clock during integration tests.
use isotp_link::core::Timestamp;
use isotp_link::error::{FrameError, TransmitError};
use isotp_link::protocol::transport::{
    can_frame::CanFrame,
    link::Link,
    traits::{can_bus::CanTransmitter, clock::MonotonicClock},
};
use std::cell::Cell;
use std::collections::VecDeque;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Driver error reported by the simulated controller.
pub struct BusFault;

#[derive(Default)]
#[allow(dead_code)]
/// Transmitter recording every accepted frame, with scriptable refusals.
pub struct RecordingBus {
    frames: Vec<CanFrame>,
    failures: VecDeque<TransmitError<BusFault>>,
}

#[allow(dead_code)]
impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next transmit attempt with `err`. Calls queue up.
    pub fn fail_next(&mut self, err: TransmitError<BusFault>) {
        self.failures.push_back(err);
    }

    /// Drain the frames transmitted so far.
    pub fn take_frames(&mut self) -> Vec<CanFrame> {
        std::mem::take(&mut self.frames)
    }

    /// Drain the frames and keep only their data bytes.
    pub fn take_payloads(&mut self) -> Vec<Vec<u8>> {
        self.take_frames()
            .iter()
            .map(|frame| frame.payload().to_vec())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl CanTransmitter for RecordingBus {
    type Error = BusFault;

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError<BusFault>> {
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[allow(dead_code)]
/// Clock only moving when told to.
pub struct ManualClock(Cell<u32>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_us: u32) -> Self {
        Self(Cell::new(start_us))
    }

    pub fn advance_us(&self, us: u32) {
        self.0.set(self.0.get().wrapping_add(us));
    }

    pub fn advance_ms(&self, ms: u32) {
        self.advance_us(ms * 1_000);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.get())
    }
}

#[allow(dead_code)]
/// Everything that crossed the wire while two links were pumped.
pub struct Exchange {
    /// Frames in transmission order, both directions.
    pub wire: Vec<CanFrame>,
    /// Rejections reported by `on_frame` on either side.
    pub errors: Vec<FrameError<BusFault>>,
}

#[allow(dead_code)]
/// Poll both links, cross-deliver their frames and advance the clock by
/// `step_us` until neither has work left or `max_steps` is reached.
pub fn pump<const TA: usize, const RA: usize, const TB: usize, const RB: usize>(
    a: &mut Link<TA, RA>,
    bus_a: &mut RecordingBus,
    b: &mut Link<TB, RB>,
    bus_b: &mut RecordingBus,
    clock: &ManualClock,
    step_us: u32,
    max_steps: usize,
) -> Exchange {
    let mut exchange = Exchange {
        wire: Vec::new(),
        errors: Vec::new(),
    };

    for _ in 0..max_steps {
        let mut moved = false;
        loop {
            let from_a = bus_a.take_frames();
            let from_b = bus_b.take_frames();
            if from_a.is_empty() && from_b.is_empty() {
                break;
            }
            moved = true;
            for frame in from_a {
                if let Err(err) = b.on_frame(bus_b, clock, frame.payload()) {
                    exchange.errors.push(err);
                }
                exchange.wire.push(frame);
            }
            for frame in from_b {
                if let Err(err) = a.on_frame(bus_a, clock, frame.payload()) {
                    exchange.errors.push(err);
                }
                exchange.wire.push(frame);
            }
        }

        let status_a = a.poll(bus_a, clock);
        let status_b = b.poll(bus_b, clock);
        if !moved && status_a.may_stop() && status_b.may_stop() && bus_a.is_empty() && bus_b.is_empty()
        {
            break;
        }
        clock.advance_us(step_us);
    }
    exchange
}

#[derive(Clone)]
#[allow(dead_code)]
/// Transmitter forwarding frames to an in-memory channel, never full.
pub struct ChannelBus {
    tx: mpsc::UnboundedSender<CanFrame>,
}

#[allow(dead_code)]
impl ChannelBus {
    /// Build two interconnected endpoints, each with the receiver of the frames the other sends.
    pub fn create_pair() -> (
        (Self, mpsc::UnboundedReceiver<CanFrame>),
        (Self, mpsc::UnboundedReceiver<CanFrame>),
    ) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        ((Self { tx: a_tx }, a_rx), (Self { tx: b_tx }, b_rx))
    }
}

impl CanTransmitter for ChannelBus {
    type Error = ();

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError<()>> {
        self.tx.send(frame.clone()).map_err(|_| TransmitError::Bus(()))
    }
}

#[allow(dead_code)]
/// Deterministic test payload of `len` bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

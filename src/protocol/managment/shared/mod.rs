//! [`LinkManager`] behind an `embassy-sync` blocking mutex.
//!
//! Frames usually arrive from a CAN interrupt or a receive task while the
//! application sends and polls from another context. Every operation takes the
//! lock for its whole duration, so `on_frame`, `poll` and `send` on a link never
//! interleave. Pick the raw mutex for the target:
//! `CriticalSectionRawMutex` when an interrupt handler dispatches frames,
//! `NoopRawMutex` when everything runs in one executor.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};

use crate::core::PollStatus;
use crate::error::{FrameError, SendError};
use crate::protocol::managment::link_manager::LinkManager;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::can_bus::CanTransmitter;
use crate::protocol::transport::traits::clock::MonotonicClock;

/// Shareable (`&self`) handle over a [`LinkManager`].
pub struct SharedLinks<M: RawMutex, const N: usize, const TX: usize, const RX: usize> {
    inner: Mutex<M, RefCell<LinkManager<N, TX, RX>>>,
}

impl<M: RawMutex, const N: usize, const TX: usize, const RX: usize> SharedLinks<M, N, TX, RX> {
    pub const fn new(manager: LinkManager<N, TX, RX>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(manager)),
        }
    }

    /// Run `f` with exclusive access to the manager.
    ///
    /// `f` must not call back into the same `SharedLinks`.
    pub fn lock<R>(&self, f: impl FnOnce(&mut LinkManager<N, TX, RX>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Start sending `payload` to `peer`.
    pub fn send<T: CanTransmitter, C: MonotonicClock>(
        &self,
        tx: &mut T,
        clock: &C,
        peer: u8,
        payload: &[u8],
    ) -> Result<(), SendError<T::Error>> {
        self.lock(|manager| match manager.link_for_peer(peer) {
            Some(link) => link.send(tx, clock, payload),
            None => Err(SendError::UnknownPeer { address: peer }),
        })
    }

    /// Take the completed message from `peer`, if any.
    pub fn receive(&self, peer: u8, dest: &mut [u8]) -> Option<usize> {
        self.lock(|manager| manager.link_for_peer(peer)?.receive(dest))
    }

    /// Route a received frame; see [`LinkManager::dispatch`].
    pub fn dispatch<T: CanTransmitter, C: MonotonicClock>(
        &self,
        tx: &mut T,
        clock: &C,
        frame: &CanFrame,
    ) -> Result<bool, FrameError<T::Error>> {
        self.lock(|manager| manager.dispatch(tx, clock, frame))
    }

    /// Poll every link; see [`LinkManager::poll_all`].
    pub fn poll_all<T: CanTransmitter, C: MonotonicClock>(&self, tx: &mut T, clock: &C) -> PollStatus {
        self.lock(|manager| manager.poll_all(tx, clock))
    }

    pub fn into_inner(self) -> LinkManager<N, TX, RX> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

//! Fixed set of ISO-TP links owned by one node, one per peer address.
//!
//! The manager derives each link's identifiers from the node's logical
//! address and the peer's, routes incoming frames by arbitration ID and polls
//! every link in one call.
use crate::core::PollStatus;
use crate::error::{AddressError, FrameError, LinkManagerError};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::{self, CanId, ADDRESS_MASK, MAX_ADDRESSES};
use crate::protocol::transport::link::{Link, LinkConfig};
use crate::protocol::transport::traits::can_bus::CanTransmitter;
use crate::protocol::transport::traits::clock::MonotonicClock;

/// `N` links with `TX`/`RX`-byte buffers each.
pub struct LinkManager<const N: usize, const TX: usize, const RX: usize> {
    my_address: u8,
    peers: [u8; N],
    links: [Link<TX, RX>; N],
}

impl<const N: usize, const TX: usize, const RX: usize> LinkManager<N, TX, RX> {
    /// Build one link per entry of `peers`, all sharing `config`.
    ///
    /// Fails when an address does not fit 5 bits, a peer equals `my_address`,
    /// a peer is listed twice, or more than 32 peers are given.
    pub fn new(my_address: u8, peers: [u8; N], config: LinkConfig) -> Result<Self, LinkManagerError> {
        if N > MAX_ADDRESSES {
            return Err(AddressError::TooManyPeers { count: N }.into());
        }
        if my_address > ADDRESS_MASK {
            return Err(AddressError::AddressOutOfRange {
                address: my_address,
            }
            .into());
        }
        config.validate()?;

        let mut ids = [(CanId(0), CanId(0)); N];
        for (index, &peer) in peers.iter().enumerate() {
            if peer == my_address {
                return Err(AddressError::PeerIsSelf { address: peer }.into());
            }
            if peers[..index].contains(&peer) {
                return Err(AddressError::DuplicatePeer { address: peer }.into());
            }
            ids[index] = (
                can_id::send_id(my_address, peer)?,
                can_id::receive_id(my_address, peer)?,
            );
        }
        let links = core::array::from_fn(|index| {
            let (send_id, receive_id) = ids[index];
            Link::with_valid_config(send_id, receive_id, config)
        });

        #[cfg(feature = "defmt")]
        defmt::info!("Link manager for address {} with {} peers", my_address, N);

        Ok(Self {
            my_address,
            peers,
            links,
        })
    }

    /// Logical address of this node.
    pub fn my_address(&self) -> u8 {
        self.my_address
    }

    /// Peer addresses, in link order.
    pub fn peers(&self) -> &[u8; N] {
        &self.peers
    }

    pub fn links(&self) -> &[Link<TX, RX>] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [Link<TX, RX>] {
        &mut self.links
    }

    /// Link whose receive identifier is `id`.
    pub fn link_for_receive_id(&mut self, id: CanId) -> Option<&mut Link<TX, RX>> {
        self.links.iter_mut().find(|link| link.receive_id() == id)
    }

    /// Link talking to `peer`.
    pub fn link_for_peer(&mut self, peer: u8) -> Option<&mut Link<TX, RX>> {
        let index = self.peers.iter().position(|&p| p == peer)?;
        self.links.get_mut(index)
    }

    //==================================================================================DISPATCH
    /// Route a received frame to the link listening on its identifier.
    ///
    /// Frames without the ISO-TP flag are ignored (`Ok(false)`). ISO-TP frames
    /// that no link listens for yield [`FrameError::NoMatchingLink`].
    pub fn dispatch<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        tx: &mut T,
        clock: &C,
        frame: &CanFrame,
    ) -> Result<bool, FrameError<T::Error>> {
        if !frame.id.is_isotp() {
            return Ok(false);
        }
        match self.link_for_receive_id(frame.id) {
            Some(link) => link.on_frame(tx, clock, frame.payload()),
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("No link for {}", frame.id);
                Err(FrameError::NoMatchingLink { id: frame.id })
            }
        }
    }

    /// Poll every link. Polling may stop only when every link may stop.
    pub fn poll_all<T: CanTransmitter, C: MonotonicClock>(
        &mut self,
        tx: &mut T,
        clock: &C,
    ) -> PollStatus {
        let mut status = PollStatus::IDLE;
        for link in self.links.iter_mut() {
            status = status.and(link.poll(tx, clock));
        }
        status
    }
}

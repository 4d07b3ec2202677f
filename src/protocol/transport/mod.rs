//! ISO-TP transport layer: CAN frame representation, 11-bit identifier
//! layout, the per-peer link state machine, and the capability traits it is
//! driven through.
//!
//! ## Timing
//!
//! All deadlines are expressed in microseconds on the caller's clock
//! ([`traits::clock::MonotonicClock`]). A link only advances when the caller
//! invokes [`link::Link::poll`]; the poll period bounds both the Consecutive
//! Frame rate and the precision of the N_Bs / N_Cr timeouts.
//!
//! # Example
//!
//! ```rust,ignore
//! use isotp_link::protocol::transport::can_id::{receive_id, send_id};
//! use isotp_link::protocol::transport::link::{Link, LinkConfig};
//!
//! let mut link: Link<64, 64> =
//!     Link::new(send_id(0x01, 0x10)?, receive_id(0x01, 0x10)?, LinkConfig::default())?;
//! link.send(&mut bus, &clock, b"hello, world")?;
//! while !link.poll(&mut bus, &clock).may_stop() {}
//! ```

pub mod can_frame;
pub mod can_id;
pub mod link;
pub mod traits;

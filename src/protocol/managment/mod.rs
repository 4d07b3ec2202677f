//! Link management: the per-node set of peer links and its interrupt-safe
//! shared wrapper.
pub mod link_manager;
pub mod shared;

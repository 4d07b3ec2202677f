//! `isotp-link` library: ISO-TP (ISO 15765-2) transport links for classic CAN
//! in a `no_std` environment. The crate exposes the frame codec, the per-peer
//! link state machines (send, receive, poll), and the addressing layer that
//! derives arbitration identifiers and multiplexes links by receive ID.
#![no_std]
//==================================================================================
/// Shared value types: timestamps, sequence numbers, statuses and protocol results.
pub mod core;
/// Codec, addressing, configuration and transport errors.
pub mod error;
/// Stateless frame encoding/decoding.
pub mod infra;
/// ISO-TP protocol implementation: CAN transport, links, and link management.
pub mod protocol;
//==================================================================================

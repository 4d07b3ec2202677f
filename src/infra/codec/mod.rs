//! ISO-TP frame codec: Protocol Control Information encoding/decoding and the
//! separation-time byte format. Pure functions over byte slices, no link state.
pub mod pci;
pub mod separation_time;

//! High-level components: the ISO-TP transport (frames, identifiers, links)
//! and the management of the links a node keeps with its peers.
pub mod managment;
pub mod transport;

// Adapters layer: concrete implementations of the domain ports.

pub mod memory_dom;

pub use memory_dom::{MemoryDom, MemoryEvent, NodeId};

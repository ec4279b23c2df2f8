//! Adapters - Implementations of the ports.
//!
//! Only in-memory adapters live here; the production store, cache, and
//! task-queue engines are external collaborators consumed through the port
//! contracts.

pub mod memory;

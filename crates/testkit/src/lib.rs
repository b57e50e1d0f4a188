#![warn(missing_docs)]
//! Shared test fixtures: in-memory assets, synthetic skins and golden snapshots.

mod fixtures;
mod memory;
mod snapshot;

pub use fixtures::*;
pub use memory::*;
pub use snapshot::*;

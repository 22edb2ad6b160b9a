//! Shared leaf types for the debug stick workspace.
#![allow(missing_docs)]

pub mod math;
pub mod types;

pub use types::{BlockPos, DimensionId, ResourceLocation};

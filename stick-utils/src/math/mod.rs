//! Math helpers shared between the crates.
pub mod vector3;

pub use vector3::Vector3;
